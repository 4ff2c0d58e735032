//! # Privilege-Level Elevator
//!
//! Raises the IOPL of the calling thread to ring 3 by patching the `EFlags`
//! saved in its trap frame. The kernel restores that value on the way back to
//! user mode, after which `in`/`out` no longer fault for this thread. Other
//! threads of the process keep their own trap frames and are unaffected.
//!
//! Nothing lowers IOPL again; the grant ends when the thread exits.

use crate::frame::{FlagsUpdate, InitialStack, SavedEflags};
use crate::layout::TrapFrameLayout;
use kernel_registers::eflags::Eflags;
use kernel_registers::privilege::Ring;

/// Sets IOPL to 3 and leaves every other bit as it was.
///
/// Idempotent: applying it to an already elevated value returns it unchanged.
#[inline]
#[must_use]
pub const fn elevate_iopl(flags: Eflags) -> Eflags {
    flags.with_iopl(Ring::Ring3)
}

/// Access to the thread a request is executing on.
///
/// # Safety
/// Implementors must return the kernel initial stack of the thread that is
/// currently executing the request, matching the [`TrapFrameLayout`] the
/// [`Elevator`] was built with.
pub unsafe trait ThreadContext {
    fn initial_stack(&self) -> InitialStack;
}

unsafe impl<T: ThreadContext + ?Sized> ThreadContext for &T {
    #[inline]
    fn initial_stack(&self) -> InitialStack {
        (**self).initial_stack()
    }
}

/// Applies [`elevate_iopl`] to a thread's saved flags.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Elevator {
    layout: TrapFrameLayout,
}

impl Elevator {
    /// An elevator for the kernel this crate is built for.
    pub const NATIVE: Self = Self {
        layout: TrapFrameLayout::NATIVE,
    };

    /// An elevator for an explicit layout.
    ///
    /// # Safety
    /// Every [`ThreadContext`] this elevator is used with must hand out
    /// stacks laid out according to `layout`.
    #[inline]
    #[must_use]
    pub const unsafe fn with_layout(layout: TrapFrameLayout) -> Self {
        Self { layout }
    }

    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &TrapFrameLayout {
        &self.layout
    }

    /// Elevates the thread behind `thread`.
    pub fn elevate<T>(&self, thread: &T) -> FlagsUpdate
    where
        T: ThreadContext + ?Sized,
    {
        let stack = thread.initial_stack();
        let saved = unsafe { SavedEflags::locate(stack, &self.layout) };
        log::trace!(
            "giveio: saved EFlags of thread (initial stack {:#x}) at {:#x}",
            stack.addr(),
            saved.addr()
        );
        saved.update(elevate_iopl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_registers::eflags::{EFLAGS_IOPL_MASK, EFLAGS_IOPL3};

    const PATTERNS: [u32; 8] = [
        0x0000_0000,
        0x0000_0002,
        0x0000_0246,
        0x0000_1202,
        0x0002_0202,
        0xFFFF_CFFF,
        0xFFFF_FFFF,
        0x5555_5555,
    ];

    #[test]
    fn only_iopl_bits_change() {
        for raw in PATTERNS {
            let after = elevate_iopl(Eflags::from_bits(raw)).into_bits();
            assert_eq!(after & !EFLAGS_IOPL_MASK, raw & !EFLAGS_IOPL_MASK, "{raw:#010x}");
            assert_eq!(after & EFLAGS_IOPL_MASK, EFLAGS_IOPL3, "{raw:#010x}");
        }
    }

    #[test]
    fn matches_or_with_iopl3() {
        for raw in PATTERNS {
            assert_eq!(elevate_iopl(Eflags::from_bits(raw)).into_bits(), raw | EFLAGS_IOPL3);
        }
    }

    #[test]
    fn elevation_is_idempotent() {
        for raw in PATTERNS {
            let once = elevate_iopl(Eflags::from_bits(raw));
            let twice = elevate_iopl(once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn elevated_flags_permit_user_port_io() {
        let user = Eflags::from_bits(0x0000_0202);
        assert!(!user.permits_port_io(Ring::Ring3));
        assert!(elevate_iopl(user).permits_port_io(Ring::Ring3));
    }
}
