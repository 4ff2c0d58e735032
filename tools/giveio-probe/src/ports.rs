//! # User-mode I/O Port Access
//!
//! The same `in` instruction the kernel uses, executed from ring 3. Whether it
//! works depends on the calling thread's IOPL:
//!
//! ```text
//! CPL 3, IOPL 0   in al, dx  ──▶ #GP ──▶ STATUS_PRIVILEGED_INSTRUCTION
//! CPL 3, IOPL 3   in al, dx  ──▶ value of the port
//! ```
//!
//! Windows user threads have no I/O permission bitmap entries, so IOPL is the
//! only thing that decides.

use kernel_registers::LoadRegister;
use kernel_registers::eflags::Eflags;
use kernel_registers::privilege::Ring;

/// Whether the calling thread may execute `in`/`out` right now.
#[must_use]
pub fn port_io_permitted() -> bool {
    Eflags::load().permits_port_io(Ring::Ring3)
}

/// Read one byte from an I/O port.
///
/// # Safety
/// - **Privilege:** the calling thread's IOPL must be 3 (see
///   [`port_io_permitted`]); otherwise the CPU raises `#GP` and Windows
///   terminates the process.
/// - **Correct port:** `port` must be a readable register whose read has no
///   side effects the rest of the system relies on. Port `0x80` (POST
///   diagnostics) is the conventional harmless choice.
#[inline]
pub unsafe fn inb(port: u16) -> u8 {
    let mut v: u8;
    unsafe {
        core::arch::asm!("in al, dx", in("dx") port, out("al") v, options(nomem, nostack, preserves_flags));
    }
    v
}
