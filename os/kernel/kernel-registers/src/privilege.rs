/// CPU privilege rings, represented as numerical privilege levels (0–3).
///
/// The same two-bit encoding is used for the **Current Privilege Level (CPL)**
/// of running code and for the **I/O Privilege Level (IOPL)** field in `EFLAGS`.
///
/// ## Overview
/// x86 defines four privilege rings (also called protection levels):
///
/// | Ring | Numeric Level | Typical Use | Privilege |
/// |------|----------------|--------------|------------|
/// | **Ring 0** | 0 | Kernel / supervisor mode | Highest privilege (can execute all instructions) |
/// | **Ring 1** | 1 | Drivers / OS subsystems (rarely used) | Intermediate privilege |
/// | **Ring 2** | 2 | Drivers / OS subsystems (rarely used) | Intermediate privilege |
/// | **Ring 3** | 3 | User-mode applications | Lowest privilege (restricted instructions) |
///
/// ## Relationship to IOPL
/// The `in`/`out` family of instructions (and `cli`/`sti`) is permitted iff
/// `CPL <= IOPL`. Windows runs user code at `CPL = 3` with `IOPL = 0`, so any
/// port access from user mode raises `#GP` unless the thread's IOPL is raised
/// to [`Ring::Ring3`].
///
/// See also: Intel SDM Vol. 1, §18.5.1 “I/O Privilege Level”.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(u8)]
pub enum Ring {
    /// **Ring 0** — Kernel or supervisor mode.
    Ring0 = 0,

    /// **Ring 1** — Historically for OS components or drivers.
    Ring1 = 1,

    /// **Ring 2** — Historically for OS subsystems or drivers.
    Ring2 = 2,

    /// **Ring 3** — User-mode applications.
    ///
    /// As an IOPL value this is the most permissive setting: code at every
    /// ring may access the I/O port space.
    Ring3 = 3,
}

impl Ring {
    #[inline]
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Encode as a two-bit field value.
    #[inline]
    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    /// Decode from the low two bits; higher bits are ignored.
    #[inline]
    #[must_use]
    pub const fn from_bits(v: u8) -> Self {
        match v & 0b11 {
            0 => Self::Ring0,
            1 => Self::Ring1,
            2 => Self::Ring2,
            _ => Self::Ring3,
        }
    }

    /// Whether code running at `self` (as CPL) passes the I/O privilege check
    /// against `iopl`, i.e. `CPL <= IOPL`.
    #[inline]
    #[must_use]
    pub const fn may_access_ports(self, iopl: Self) -> bool {
        (self as u8) <= (iopl as u8)
    }
}

impl From<Ring> for u8 {
    #[inline]
    fn from(r: Ring) -> Self {
        r.to_u8()
    }
}

impl TryFrom<u8> for Ring {
    type Error = u8;

    #[inline]
    fn try_from(r: u8) -> Result<Self, Self::Error> {
        if r <= 3 { Ok(Self::from_bits(r)) } else { Err(r) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_bits_roundtrip() {
        for b in 0u8..=3 {
            assert_eq!(Ring::from_bits(b).into_bits(), b);
        }
        assert_eq!(Ring::from_bits(0b111), Ring::Ring3);
    }

    #[test]
    fn try_from_rejects_out_of_range() {
        assert_eq!(Ring::try_from(2), Ok(Ring::Ring2));
        assert_eq!(Ring::try_from(4), Err(4));
    }

    #[test]
    fn port_access_check() {
        // User mode with the Windows default IOPL of 0 faults.
        assert!(!Ring::Ring3.may_access_ports(Ring::Ring0));
        assert!(Ring::Ring3.may_access_ports(Ring::Ring3));
        // The kernel always passes.
        assert!(Ring::Ring0.may_access_ports(Ring::Ring0));
        assert!(!Ring::Ring2.may_access_ports(Ring::Ring1));
    }
}
