//! # Trap Frame Layout
//!
//! Every NT thread has a kernel stack whose top (`Thread->InitialStack`)
//! holds, growing downwards:
//!
//! ```text
//!   InitialStack ──▶ ┌──────────────────────────┐ high
//!                    │ FX_SAVE_AREA (x86 only)  │ fx_save_area_size
//!                    ├──────────────────────────┤
//!                    │ KTRAP_FRAME              │ trap_frame_size
//!                    │   ...                    │
//!                    │   EFlags  (u32)          │ ◀── + eflags_offset
//!                    │   ...                    │
//!   trap frame ────▶ └──────────────────────────┘ low
//! ```
//!
//! The sizes of `FX_SAVE_AREA` and `KTRAP_FRAME` and the offset of `EFlags`
//! have never changed between NT kernel versions, but they differ per
//! architecture. They are a hard ABI contract: a wrong value silently corrupts
//! some other word of the thread's saved state. All arithmetic on them lives
//! here.

use core::mem::size_of;

/// Per-architecture placement of the saved flags below the initial stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TrapFrameLayout {
    /// Short architecture name, for diagnostics.
    pub arch: &'static str,
    /// Size of the floating point save area between the initial stack and the trap frame.
    pub fx_save_area_size: usize,
    /// Size of `KTRAP_FRAME`.
    pub trap_frame_size: usize,
    /// Offset of the 32-bit `EFlags` member within `KTRAP_FRAME`.
    pub eflags_offset: usize,
}

impl TrapFrameLayout {
    /// 32-bit x86 NT kernels.
    pub const X86: Self = Self::new("x86", 0x210, 0x8C, 0x70);

    /// x64 NT kernels. The FPU state is not kept on the stack.
    pub const AMD64: Self = Self::new("x86_64", 0x0, 0x190, 0x178);

    /// The layout of the kernel this crate is compiled for.
    #[cfg(target_arch = "x86")]
    pub const NATIVE: Self = Self::X86;

    /// The layout of the kernel this crate is compiled for.
    #[cfg(target_arch = "x86_64")]
    pub const NATIVE: Self = Self::AMD64;

    const fn new(
        arch: &'static str,
        fx_save_area_size: usize,
        trap_frame_size: usize,
        eflags_offset: usize,
    ) -> Self {
        assert!(
            eflags_offset + size_of::<u32>() <= trap_frame_size,
            "EFlags must lie inside the trap frame"
        );
        assert!(
            eflags_offset % size_of::<u32>() == 0,
            "EFlags must be 4-byte aligned"
        );
        Self {
            arch,
            fx_save_area_size,
            trap_frame_size,
            eflags_offset,
        }
    }

    /// Distance in bytes from the initial stack down to the start of the trap frame.
    #[inline]
    #[must_use]
    pub const fn trap_frame_distance(&self) -> usize {
        self.trap_frame_size + self.fx_save_area_size
    }

    /// Distance in bytes from the initial stack down to the saved `EFlags`.
    #[inline]
    #[must_use]
    pub const fn eflags_distance(&self) -> usize {
        self.trap_frame_distance() - self.eflags_offset
    }

    /// Address of the trap frame for a given initial stack address.
    #[inline]
    #[must_use]
    pub const fn trap_frame_address(&self, initial_stack: usize) -> usize {
        initial_stack - self.trap_frame_distance()
    }

    /// Address of the saved `EFlags` for a given initial stack address.
    #[inline]
    #[must_use]
    pub const fn eflags_address(&self, initial_stack: usize) -> usize {
        self.trap_frame_address(initial_stack) + self.eflags_offset
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
compile_error!("giveio: no trap frame layout is known for this target architecture (only x86 and x86_64 are supported)");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x86_offsets() {
        let l = TrapFrameLayout::X86;
        assert_eq!(l.trap_frame_distance(), 0x29C);
        assert_eq!(l.eflags_distance(), 0x22C);
        assert_eq!(l.trap_frame_address(0x8000_3000), 0x8000_2D64);
        assert_eq!(l.eflags_address(0x8000_3000), 0x8000_2DD4);
    }

    #[test]
    fn amd64_offsets() {
        let l = TrapFrameLayout::AMD64;
        assert_eq!(l.trap_frame_distance(), 0x190);
        assert_eq!(l.eflags_distance(), 0x18);
        assert_eq!(
            l.eflags_address(0xFFFF_F800_1234_6000),
            0xFFFF_F800_1234_5FE8
        );
    }

    #[test]
    fn native_matches_target() {
        #[cfg(target_arch = "x86_64")]
        assert_eq!(TrapFrameLayout::NATIVE, TrapFrameLayout::AMD64);
        #[cfg(target_arch = "x86")]
        assert_eq!(TrapFrameLayout::NATIVE, TrapFrameLayout::X86);
    }
}
