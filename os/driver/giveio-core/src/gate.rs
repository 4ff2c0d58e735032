//! # Authorization Gate
//!
//! Port access is handed out only to callers whose token holds
//! `SeTcbPrivilege` ("act as part of the operating system"). This is the same
//! check NT used to perform for `NtSetInformationProcess(ProcessUserModeIOPL)`
//! before that information class was removed.
//!
//! The decision is made from scratch on every request. The requesting token
//! can change between calls (impersonation, `AdjustTokenPrivileges`), so
//! nothing is cached.

use crate::error::GiveIoError;
use core::fmt;

/// Locally unique identifier, the kernel's handle for a privilege.
#[repr(C)]
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Hash)]
pub struct Luid {
    pub low_part: u32,
    pub high_part: i32,
}

impl Luid {
    /// Equivalent of `RtlConvertLongToLuid`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn from_long(value: i32) -> Self {
        Self {
            low_part: value as u32,
            high_part: if value < 0 { -1 } else { 0 },
        }
    }
}

/// A named system privilege.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Privilege {
    name: &'static str,
    luid: Luid,
}

impl Privilege {
    /// `SE_TCB_PRIVILEGE`, well-known value 7.
    pub const TCB: Self = Self {
        name: "SeTcbPrivilege",
        luid: Luid::from_long(7),
    };

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    #[must_use]
    pub const fn luid(&self) -> Luid {
        self.luid
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// `KPROCESSOR_MODE` of the original requester of an I/O request.
///
/// The mode selects which token the privilege check looks at: a user-mode
/// request is checked against the caller's (possibly impersonated) token, a
/// kernel-mode request is trusted.
#[repr(i8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProcessorMode {
    KernelMode = 0,
    UserMode = 1,
}

impl ProcessorMode {
    /// Decodes a raw `KPROCESSOR_MODE`.
    ///
    /// The kernel only ever produces 0 and 1, which round-trip unchanged
    /// through [`ProcessorMode::into_raw`]. Any other value is treated as
    /// `UserMode`, the less trusted of the two.
    #[inline]
    #[must_use]
    pub const fn from_raw(mode: i8) -> Self {
        if mode == Self::KernelMode as i8 {
            Self::KernelMode
        } else {
            Self::UserMode
        }
    }

    #[inline]
    #[must_use]
    pub const fn into_raw(self) -> i8 {
        self as i8
    }
}

/// The host's access-control subsystem.
pub trait PrivilegeCheck {
    /// Whether the subject issuing the current request holds `privilege`,
    /// evaluated for the given requestor mode (`SeSinglePrivilegeCheck`).
    fn single_privilege_check(&self, privilege: &Privilege, mode: ProcessorMode) -> bool;
}

impl<P: PrivilegeCheck + ?Sized> PrivilegeCheck for &P {
    #[inline]
    fn single_privilege_check(&self, privilege: &Privilege, mode: ProcessorMode) -> bool {
        (**self).single_privilege_check(privilege, mode)
    }
}

/// Pass/deny decision for a single request.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AuthorizationGate {
    required: Privilege,
}

impl AuthorizationGate {
    /// The gate used by the driver.
    pub const TCB: Self = Self::new(Privilege::TCB);

    #[inline]
    #[must_use]
    pub const fn new(required: Privilege) -> Self {
        Self { required }
    }

    #[inline]
    #[must_use]
    pub const fn required(&self) -> &Privilege {
        &self.required
    }

    /// Evaluates the gate.
    ///
    /// The requestor mode is handed to the checker exactly as received.
    ///
    /// # Errors
    /// [`GiveIoError::PrivilegeNotHeld`] if the caller lacks the privilege.
    pub fn evaluate<P>(&self, checker: &P, mode: ProcessorMode) -> Result<(), GiveIoError>
    where
        P: PrivilegeCheck + ?Sized,
    {
        if checker.single_privilege_check(&self.required, mode) {
            Ok(())
        } else {
            Err(GiveIoError::PrivilegeNotHeld {
                privilege: self.required.name(),
            })
        }
    }
}
