//! # Typed `x86` Registers
//!
//! Register models shared between the `giveio` driver and its user-mode
//! tooling. The driver only manipulates *saved* register images (it never
//! touches the live flags), so the instruction-level accessors are gated
//! behind the `asm` feature and used from user mode.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(feature = "eflags")]
pub mod eflags;

pub mod privilege;

/// A register that can be read with an unprivileged instruction.
pub trait LoadRegister {
    /// Reads the current value.
    fn load() -> Self;
}

#[cfg(all(test, feature = "asm", feature = "eflags", any(target_arch = "x86", target_arch = "x86_64")))]
mod tests {
    use super::*;
    use crate::eflags::Eflags;
    use crate::privilege::Ring;

    fn read<R: LoadRegister>() -> R {
        R::load()
    }

    #[test]
    fn eflags_load_through_trait() {
        let flags: Eflags = read();
        // Bit 1 is hardwired to 1.
        assert_eq!(flags.into_bits() & 0b10, 0b10);
        assert_eq!(flags.iopl(), Ring::Ring0);
    }
}
