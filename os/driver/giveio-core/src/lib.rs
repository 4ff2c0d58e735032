//! # giveio Core
//!
//! The architecture-independent part of the `giveio` driver: everything that
//! happens between "a thread opened `\\.\giveio`" and "that thread may now
//! execute `in`/`out` in user mode".
//!
//! ## Overview
//!
//! On x86, user-mode port I/O is gated by the **I/O Privilege Level** (IOPL)
//! in `EFLAGS`: an `in`/`out` instruction at `CPL = 3` raises `#GP` unless
//! `IOPL = 3`. Windows keeps IOPL at 0 for every user thread and no longer
//! offers an API to change it, but it restores the user-mode flags from the
//! thread's trap frame on every return to user mode. Patching the saved
//! `EFlags` member of that trap frame is therefore enough to grant port
//! access to exactly one thread.
//!
//! ```text
//!   user thread                         kernel (this crate)
//!   ───────────                         ───────────────────
//!   CreateFile("\\.\giveio") ──IRP_MJ_CREATE──▶ AuthorizationGate
//!                                                 │ SeTcbPrivilege?
//!                                     ┌───────────┴───────────┐
//!                                   DENY                     PASS
//!                                     │                       │
//!                    STATUS_PRIVILEGE_NOT_HELD      Elevator: trap frame
//!                                     │              EFlags |= IOPL3
//!                                     │                       │
//!   ◀─────────────────────────────────┴───── STATUS_SUCCESS ──┘
//!   in al, dx   (faults / works)
//! ```
//!
//! ## Structure
//!
//! - [`layout`]: build-time selected trap-frame offsets per architecture.
//! - [`frame`]: locating the saved flags and the single read-modify-write.
//! - [`gate`]: the privilege check.
//! - [`elevator`]: the IOPL bit transformation.
//! - [`dispatch`]: the per-request state machine and the [`GiveIo`] service.
//! - [`names`]: the kernel object names the driver publishes.
//! - [`line`]: the allocation-free log line used by the driver's logger.
//!
//! The crate performs no FFI. The host kernel is reached through the
//! [`PrivilegeCheck`] and [`ThreadContext`] traits, which lets the whole
//! request path run on synthetic trap frames in tests.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod dispatch;
pub mod elevator;
mod error;
pub mod frame;
pub mod gate;
pub mod layout;
pub mod line;
pub mod names;
mod status;

pub use dispatch::{CreateRequest, GiveIo, RequestState};
pub use elevator::{Elevator, ThreadContext, elevate_iopl};
pub use error::GiveIoError;
pub use frame::{FlagsUpdate, InitialStack, SavedEflags};
pub use gate::{AuthorizationGate, Luid, Privilege, PrivilegeCheck, ProcessorMode};
pub use layout::TrapFrameLayout;
pub use line::LineBuffer;
pub use status::NtStatus;

pub use kernel_registers::eflags::Eflags;
pub use kernel_registers::privilege::Ring;
