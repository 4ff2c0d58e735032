//! # Request Dispatch
//!
//! Every open of the device is one independent request:
//!
//! ```text
//!            ┌──────────┐  gate passes, flags patched  ┌──────────┐
//!            │ Pending  │ ───────────────────────────▶ │ Elevated │
//!            └──────────┘                              └──────────┘
//!                  │        gate denies                ┌──────────┐
//!                  └─────────────────────────────────▶ │  Denied  │
//!                                                      └──────────┘
//! ```
//!
//! Both outcomes are final. A denied caller has to issue a new request;
//! nothing is retried here, since a missing privilege does not go away on
//! its own.

use crate::elevator::{Elevator, ThreadContext};
use crate::error::GiveIoError;
use crate::frame::FlagsUpdate;
use crate::gate::{AuthorizationGate, PrivilegeCheck, ProcessorMode};
use crate::layout::TrapFrameLayout;
use crate::status::NtStatus;
use log::{debug, warn};

/// The caller-supplied part of an open request.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CreateRequest {
    /// `Irp->RequestorMode`.
    pub requestor_mode: ProcessorMode,
}

impl CreateRequest {
    #[inline]
    #[must_use]
    pub const fn new(requestor_mode: ProcessorMode) -> Self {
        Self { requestor_mode }
    }
}

/// Lifecycle of a single request.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RequestState {
    Pending,
    Elevated(FlagsUpdate),
    Denied(GiveIoError),
}

impl RequestState {
    #[inline]
    #[must_use]
    pub const fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Status reported to the I/O manager.
    #[inline]
    #[must_use]
    pub const fn status(&self) -> NtStatus {
        match self {
            Self::Pending => NtStatus::PENDING,
            Self::Elevated(_) => NtStatus::SUCCESS,
            Self::Denied(GiveIoError::PrivilegeNotHeld { .. }) => NtStatus::PRIVILEGE_NOT_HELD,
        }
    }

    /// Moves a pending request into its final state.
    ///
    /// Final states are returned unchanged.
    #[must_use]
    pub fn complete(self, outcome: Result<FlagsUpdate, GiveIoError>) -> Self {
        match self {
            Self::Pending => match outcome {
                Ok(update) => Self::Elevated(update),
                Err(e) => Self::Denied(e),
            },
            done => done,
        }
    }
}

/// The driver's request handler.
///
/// Holds no per-request state; the host and the layout are fixed at
/// construction and every call carries its own caller information.
pub struct GiveIo<H> {
    host: H,
    gate: AuthorizationGate,
    elevator: Elevator,
}

impl<H> GiveIo<H>
where
    H: PrivilegeCheck + ThreadContext,
{
    /// A handler for the kernel this crate is built for.
    #[inline]
    #[must_use]
    pub const fn new(host: H) -> Self {
        Self {
            host,
            gate: AuthorizationGate::TCB,
            elevator: Elevator::NATIVE,
        }
    }

    /// A handler for an explicit trap frame layout.
    ///
    /// # Safety
    /// `host` must hand out initial stacks laid out according to `layout`.
    #[inline]
    #[must_use]
    pub const unsafe fn with_layout(host: H, layout: TrapFrameLayout) -> Self {
        Self {
            host,
            gate: AuthorizationGate::TCB,
            elevator: unsafe { Elevator::with_layout(layout) },
        }
    }

    #[inline]
    pub const fn layout(&self) -> &TrapFrameLayout {
        self.elevator.layout()
    }

    /// Handles an open of the device: authorize, then elevate the calling thread.
    ///
    /// # Errors
    /// [`GiveIoError::PrivilegeNotHeld`] if the gate denies the caller. The
    /// thread's saved state is not touched in that case.
    pub fn dispatch_create(&self, request: &CreateRequest) -> Result<FlagsUpdate, GiveIoError> {
        if let Err(e) = self.gate.evaluate(&self.host, request.requestor_mode) {
            warn!("giveio: open denied ({:?} requestor): {e}", request.requestor_mode);
            return Err(e);
        }

        let update = self.elevator.elevate(&self.host);
        debug!(
            "giveio: IOPL raised for {:?} requestor, EFlags {:#010x} -> {:#010x}",
            request.requestor_mode,
            update.before.into_bits(),
            update.after.into_bits()
        );
        Ok(update)
    }

    /// Runs a request through the state machine.
    #[must_use]
    pub fn handle_create(&self, request: &CreateRequest) -> RequestState {
        RequestState::Pending.complete(self.dispatch_create(request))
    }

    /// Handles the close of a handle. IOPL stays as it is.
    #[inline]
    #[must_use]
    pub const fn dispatch_close(&self) -> NtStatus {
        NtStatus::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::InitialStack;
    use crate::gate::Privilege;
    use core::cell::UnsafeCell;
    use kernel_registers::eflags::Eflags;
    use kernel_registers::privilege::Ring;

    const WORDS: usize = 256;
    const FILL: u32 = 0xDEAD_BEEF;

    struct FakeThread {
        holds_tcb: bool,
        stack: Box<UnsafeCell<[u32; WORDS]>>,
    }

    impl FakeThread {
        fn new(holds_tcb: bool, layout: &TrapFrameLayout, eflags: u32) -> Self {
            let mut words = [FILL; WORDS];
            words[WORDS - layout.eflags_distance() / 4] = eflags;
            Self {
                holds_tcb,
                stack: Box::new(UnsafeCell::new(words)),
            }
        }

        fn words(&self) -> [u32; WORDS] {
            unsafe { *self.stack.get() }
        }

        fn saved(&self, layout: &TrapFrameLayout) -> Eflags {
            Eflags::from_bits(self.words()[WORDS - layout.eflags_distance() / 4])
        }
    }

    impl PrivilegeCheck for FakeThread {
        fn single_privilege_check(&self, privilege: &Privilege, mode: ProcessorMode) -> bool {
            mode == ProcessorMode::KernelMode || (self.holds_tcb && *privilege == Privilege::TCB)
        }
    }

    unsafe impl ThreadContext for FakeThread {
        fn initial_stack(&self) -> InitialStack {
            let top = self.stack.get().cast::<u8>().wrapping_add(WORDS * 4);
            InitialStack::from_ptr(top.cast()).unwrap()
        }
    }

    fn giveio(thread: &FakeThread, layout: TrapFrameLayout) -> GiveIo<&FakeThread> {
        unsafe { GiveIo::with_layout(thread, layout) }
    }

    const USER: CreateRequest = CreateRequest::new(ProcessorMode::UserMode);

    #[test]
    fn denied_request_leaves_frame_untouched() {
        for layout in [TrapFrameLayout::X86, TrapFrameLayout::AMD64] {
            let thread = FakeThread::new(false, &layout, 0x0000_0202);
            let before = thread.words();

            let state = giveio(&thread, layout).handle_create(&USER);
            assert_eq!(state.status(), NtStatus::PRIVILEGE_NOT_HELD);
            assert!(matches!(state, RequestState::Denied(_)));
            assert_eq!(thread.words(), before);
            assert!(!thread.saved(&layout).permits_port_io(Ring::Ring3));
        }
    }

    #[test]
    fn granted_request_raises_iopl_only() {
        for layout in [TrapFrameLayout::X86, TrapFrameLayout::AMD64] {
            let thread = FakeThread::new(true, &layout, 0x0000_0246);
            let before = thread.words();

            let state = giveio(&thread, layout).handle_create(&USER);
            assert_eq!(state.status(), NtStatus::SUCCESS);
            let RequestState::Elevated(update) = state else {
                panic!("expected elevation, got {state:?}");
            };
            assert_eq!(update.before.into_bits(), 0x0000_0246);
            assert_eq!(update.after.into_bits(), 0x0000_3246);

            let after = thread.words();
            let idx = WORDS - layout.eflags_distance() / 4;
            for i in 0..WORDS {
                if i == idx {
                    assert_eq!(after[i], before[i] | 0x3000);
                } else {
                    assert_eq!(after[i], before[i], "{} word {i}", layout.arch);
                }
            }
            assert!(thread.saved(&layout).permits_port_io(Ring::Ring3));
        }
    }

    #[test]
    fn second_grant_changes_nothing() {
        let layout = TrapFrameLayout::AMD64;
        let thread = FakeThread::new(true, &layout, 0x0000_0202);
        let io = giveio(&thread, layout);

        io.dispatch_create(&USER).unwrap();
        let once = thread.words();
        let update = io.dispatch_create(&USER).unwrap();
        assert_eq!(update.changed_bits(), 0);
        assert_eq!(thread.words(), once);
        assert_eq!(thread.saved(&layout).iopl(), Ring::Ring3);
    }

    #[test]
    fn grant_is_scoped_to_calling_thread() {
        let layout = TrapFrameLayout::AMD64;
        let a = FakeThread::new(true, &layout, 0x0000_0202);
        let b = FakeThread::new(true, &layout, 0x0000_0202);
        let b_before = b.words();

        giveio(&a, layout).dispatch_create(&USER).unwrap();
        assert_eq!(a.saved(&layout).iopl(), Ring::Ring3);
        assert_eq!(b.words(), b_before);
        assert_eq!(b.saved(&layout).iopl(), Ring::Ring0);
    }

    #[test]
    fn kernel_requestor_is_trusted_by_host() {
        let layout = TrapFrameLayout::AMD64;
        let thread = FakeThread::new(false, &layout, 0x0000_0202);
        let io = giveio(&thread, layout);
        let state = io.handle_create(&CreateRequest::new(ProcessorMode::KernelMode));
        assert_eq!(state.status(), NtStatus::SUCCESS);
    }

    #[test]
    fn final_states_do_not_move() {
        let denied = RequestState::Denied(GiveIoError::PrivilegeNotHeld {
            privilege: "SeTcbPrivilege",
        });
        let update = FlagsUpdate {
            before: Eflags::new(),
            after: Eflags::new().with_iopl(Ring::Ring3),
        };
        assert_eq!(denied.complete(Ok(update)), denied);
        assert!(denied.is_final());
        assert!(!RequestState::Pending.is_final());
        assert_eq!(RequestState::Pending.status(), NtStatus::PENDING);
    }

    #[test]
    fn close_never_fails() {
        let layout = TrapFrameLayout::AMD64;
        let thread = FakeThread::new(false, &layout, 0x0000_0202);
        let before = thread.words();
        assert_eq!(giveio(&thread, layout).dispatch_close(), NtStatus::SUCCESS);
        assert_eq!(thread.words(), before);
    }
}
