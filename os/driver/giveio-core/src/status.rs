use crate::error::GiveIoError;
use core::fmt;

/// An `NTSTATUS` code.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct NtStatus(pub i32);

impl NtStatus {
    pub const SUCCESS: Self = Self(0);
    pub const PENDING: Self = Self(0x103);
    pub const PRIVILEGE_NOT_HELD: Self = Self::from_u32(0xC000_0061);

    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn from_u32(code: u32) -> Self {
        Self(code as i32)
    }

    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn as_u32(self) -> u32 {
        self.0 as u32
    }

    /// `NT_SUCCESS`: success and informational codes are non-negative.
    #[inline]
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 0
    }

    /// Converts into a `Result`, keeping failing codes as the error.
    ///
    /// # Errors
    /// `self` if it is not an `NT_SUCCESS` code.
    #[inline]
    pub const fn ok(self) -> Result<(), Self> {
        if self.is_success() { Ok(()) } else { Err(self) }
    }
}

impl From<GiveIoError> for NtStatus {
    fn from(e: GiveIoError) -> Self {
        match e {
            GiveIoError::PrivilegeNotHeld { .. } => Self::PRIVILEGE_NOT_HELD,
        }
    }
}

impl fmt::Debug for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NtStatus({:#010x})", self.as_u32())
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SUCCESS => f.write_str("STATUS_SUCCESS"),
            Self::PENDING => f.write_str("STATUS_PENDING"),
            Self::PRIVILEGE_NOT_HELD => f.write_str("STATUS_PRIVILEGE_NOT_HELD"),
            other => write!(f, "{:#010x}", other.as_u32()),
        }
    }
}
