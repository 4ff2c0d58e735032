//! Fixed-size text line for C-string logging sinks such as `DbgPrintEx`.
//!
//! Formatting happens on the stack; nothing is allocated. Output that does not
//! fit is cut off, and the last byte is always kept for the terminator.

use core::ffi::CStr;
use core::fmt;

/// Capacity of a [`LineBuffer`] in bytes, terminator included.
pub const LINE_CAPACITY: usize = 256;

/// NUL-terminated line buffer implementing [`fmt::Write`].
pub struct LineBuffer {
    buf: [u8; LINE_CAPACITY],
    len: usize,
}

impl LineBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; LINE_CAPACITY],
            len: 0,
        }
    }

    /// The contents as a C string.
    pub fn as_c_str(&mut self) -> &CStr {
        self.buf[self.len] = 0;
        CStr::from_bytes_until_nul(&self.buf[..=self.len]).unwrap_or_default()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = LINE_CAPACITY - 1 - self.len;
        let take = s.len().min(room);
        for (dst, &b) in self.buf[self.len..self.len + take]
            .iter_mut()
            .zip(s.as_bytes())
        {
            // An embedded NUL would end the string early.
            *dst = if b == 0 { b' ' } else { b };
        }
        self.len += take;
        if take < s.len() { Err(fmt::Error) } else { Ok(()) }
    }
}
