//! Kernel object names published by the driver.

/// Device object name in the object manager namespace.
pub const DEVICE_NAME: &str = r"\Device\giveio";

/// Symbolic link that makes the device reachable from Win32.
pub const DOS_DEVICE_NAME: &str = r"\DosDevices\giveio";

/// Path user-mode code passes to `CreateFile`.
pub const USER_DEVICE_PATH: &str = r"\\.\giveio";

/// Encodes an ASCII string as UTF-16 at compile time.
///
/// `N` must equal the byte length of `s`.
///
/// # Panics
/// If `s.len() != N` or `s` contains a non-ASCII byte. In a `const` or
/// `static` initializer this is a compile-time error.
#[must_use]
#[allow(clippy::cast_lossless)]
pub const fn utf16<const N: usize>(s: &str) -> [u16; N] {
    let bytes = s.as_bytes();
    assert!(bytes.len() == N, "length mismatch");
    let mut out = [0u16; N];
    let mut i = 0;
    while i < N {
        assert!(bytes[i].is_ascii(), "only ASCII names are supported");
        out[i] = bytes[i] as u16;
        i += 1;
    }
    out
}
