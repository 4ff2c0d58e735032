use crate::BUGCHECK_GIVEIO;
use crate::ntddk::{IoGetInitialStack, KeBugCheckEx, SeSinglePrivilegeCheck};
use giveio_core::{InitialStack, Privilege, PrivilegeCheck, ProcessorMode, ThreadContext};

/// The running NT kernel, seen from a dispatch routine.
///
/// `IRP_MJ_CREATE` is delivered synchronously on the thread that called
/// `NtCreateFile`, so "current thread" here is the thread to elevate.
pub struct NtHost;

impl PrivilegeCheck for NtHost {
    /// `mode` was decoded from `Irp->RequestorMode`; for the values the I/O
    /// manager produces (0 and 1) `into_raw` returns the original byte.
    fn single_privilege_check(&self, privilege: &Privilege, mode: ProcessorMode) -> bool {
        unsafe { SeSinglePrivilegeCheck(privilege.luid(), mode.into_raw()) != 0 }
    }
}

unsafe impl ThreadContext for NtHost {
    fn initial_stack(&self) -> InitialStack {
        let stack = unsafe { IoGetInitialStack() };
        InitialStack::from_ptr(stack)
            .unwrap_or_else(|| unsafe { KeBugCheckEx(BUGCHECK_GIVEIO, 1, 0, 0, 0) })
    }
}
