use crate::privilege::Ring;
use bitfield_struct::bitfield;

/// Mask of the two IOPL bits (12–13) in a raw `EFLAGS` image.
pub const EFLAGS_IOPL_MASK: u32 = 0x3000;

/// Raw `EFLAGS` value with IOPL set to ring 3 and every other bit clear.
pub const EFLAGS_IOPL3: u32 = EFLAGS_IOPL_MASK;

/// Architectural 32-bit `EFLAGS` model for x86 and the low half of `RFLAGS` on x86-64.
///
/// NT saves a 32-bit `EFlags` member in its trap frame on both architectures,
/// so this is the width the driver reads and writes. Reserved bits are
/// modeled as padding: converting a raw value in and out with
/// [`Eflags::from_bits`] / [`Eflags::into_bits`] preserves them exactly.
#[bitfield(u32, order = Lsb)]
#[derive(Eq, PartialEq, Hash)]
pub struct Eflags {
    /// Carry Flag
    pub cf_carry: bool, // 0

    /// Always 1.
    #[bits(default = true)]
    _always1: bool, // 1

    /// Parity Flag
    pub pf_parity: bool, // 2

    /// Reserved (always 0)
    #[bits(default = false)]
    _rsvd3: bool, // 3

    /// Adjust Flag
    pub af_adjust: bool, // 4

    /// Reserved (always 0)
    #[bits(default = false)]
    _rsvd5: bool, // 5

    /// Zero Flag
    pub zf_zero: bool, // 6

    /// Sign Flag
    pub sf_sign: bool, // 7

    /// Trap Flag
    pub tf_trap: bool, // 8

    /// Interrupt Enable Flag
    pub if_interrupt_enable: bool, // 9

    /// Direction Flag
    pub df_direction: bool, // 10

    /// Overflow Flag
    pub of_overflow: bool, // 11

    /// I/O Privilege Level (2 bits)
    ///
    /// Code running at `CPL` may use `in`/`out` iff `CPL <= IOPL`.
    #[bits(2)]
    pub iopl: Ring, // 12–13

    /// Nested Task
    pub nt_nested: bool, // 14

    /// Reserved (always 0)
    #[bits(default = false)]
    _rsvd15: bool, // 15

    /// Resume Flag
    pub rf_resume: bool, // 16

    /// Virtual 8086 mode (32-bit trap frames only; always 0 in long mode).
    pub vm_virtual_8086: bool, // 17

    /// Alignment Check
    pub ac_alignment_check: bool, // 18

    /// Virtual Interrupt Flag
    pub vif_virtual_interrupt: bool, // 19

    /// Virtual Interrupt Pending
    pub vip_virtual_interrupt_pending: bool, // 20

    /// ID Flag: allows toggling CPUID.
    pub id_cpuid: bool, // 21

    /// Reserved 22–31
    #[bits(10, default = 0)]
    _reserved_rest: u16,
}

impl Eflags {
    /// Whether code running at `cpl` may execute port I/O instructions
    /// under these flags.
    #[inline]
    #[must_use]
    pub const fn permits_port_io(self, cpl: Ring) -> bool {
        cpl.may_access_ports(self.iopl())
    }
}

/// Reads the flags of the current thread via `pushf`.
///
/// `pushf` is unprivileged; in user mode it reports the real IOPL, which makes
/// it the non-faulting way to check whether port I/O is currently allowed.
#[cfg(all(feature = "asm", target_arch = "x86_64"))]
impl crate::LoadRegister for Eflags {
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn load() -> Self {
        let rflags: u64;
        unsafe {
            core::arch::asm!("pushfq", "pop {}", out(reg) rflags, options(nomem, preserves_flags));
        }
        // RFLAGS bits 32–63 are reserved and read as zero.
        Self::from_bits(rflags as u32)
    }
}

#[cfg(all(feature = "asm", target_arch = "x86"))]
impl crate::LoadRegister for Eflags {
    #[inline]
    fn load() -> Self {
        let eflags: u32;
        unsafe {
            core::arch::asm!("pushfd", "pop {}", out(reg) eflags, options(nomem, preserves_flags));
        }
        Self::from_bits(eflags)
    }
}
