//! Locating a thread's saved flags and patching them in place.

use crate::layout::TrapFrameLayout;
use core::ffi::c_void;
use core::ptr::NonNull;
use kernel_registers::eflags::Eflags;

/// Top of a thread's kernel stack, as reported by `IoGetInitialStack`.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct InitialStack(NonNull<u8>);

impl InitialStack {
    #[inline]
    #[must_use]
    pub const fn new(ptr: NonNull<u8>) -> Self {
        Self(ptr)
    }

    /// Wraps a raw pointer, rejecting null.
    #[inline]
    #[must_use]
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr.cast::<u8>()).map(Self)
    }

    #[inline]
    #[must_use]
    pub const fn as_ptr(self) -> *mut u8 {
        self.0.as_ptr()
    }

    #[inline]
    #[must_use]
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

/// Flags value observed before and after a saved-flags update.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FlagsUpdate {
    pub before: Eflags,
    pub after: Eflags,
}

impl FlagsUpdate {
    /// Raw bits that differ between `before` and `after`.
    #[inline]
    #[must_use]
    pub const fn changed_bits(&self) -> u32 {
        self.before.into_bits() ^ self.after.into_bits()
    }
}

/// The saved `EFlags` word of one thread's trap frame.
///
/// The handle is consumed by [`SavedEflags::update`], so no pointer into the
/// kernel-owned frame survives the request that created it.
pub struct SavedEflags {
    ptr: NonNull<u32>,
}

impl SavedEflags {
    /// Computes the location of the saved flags below `stack`.
    ///
    /// # Safety
    /// - `stack` must be the initial stack of the **calling** thread (or, in
    ///   tests, the end of a buffer at least `layout.trap_frame_distance()`
    ///   bytes long that nothing else accesses until the handle is dropped
    ///   or consumed).
    /// - `layout` must describe the running kernel. A wrong layout makes the
    ///   subsequent write hit an unrelated word of the thread's saved state.
    #[inline]
    #[must_use]
    pub unsafe fn locate(stack: InitialStack, layout: &TrapFrameLayout) -> Self {
        let ptr = unsafe { stack.0.byte_sub(layout.eflags_distance()) };
        Self {
            ptr: ptr.cast::<u32>(),
        }
    }

    /// Address of the saved flags.
    #[inline]
    #[must_use]
    pub fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Reads the saved flags without modifying them.
    #[inline]
    #[must_use]
    pub fn read(&self) -> Eflags {
        Eflags::from_bits(unsafe { self.ptr.as_ptr().read_volatile() })
    }

    /// Performs the single read-modify-write of the saved flags.
    #[inline]
    pub fn update(self, f: impl FnOnce(Eflags) -> Eflags) -> FlagsUpdate {
        let before = self.read();
        let after = f(before);
        unsafe { self.ptr.as_ptr().write_volatile(after.into_bits()) };
        FlagsUpdate { before, after }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::UnsafeCell;

    const WORDS: usize = 256;

    fn stack_of(buf: &UnsafeCell<[u32; WORDS]>) -> InitialStack {
        let top = buf.get().cast::<u8>().wrapping_add(WORDS * 4);
        InitialStack::from_ptr(top.cast()).unwrap()
    }

    #[test]
    fn from_ptr_rejects_null() {
        assert!(InitialStack::from_ptr(core::ptr::null_mut()).is_none());
    }

    #[test]
    fn locates_eflags_in_amd64_frame() {
        let buf = UnsafeCell::new([0u32; WORDS]);
        let stack = stack_of(&buf);
        let flags = unsafe { SavedEflags::locate(stack, &TrapFrameLayout::AMD64) };
        assert_eq!(stack.addr() - flags.addr(), 0x18);
        // 0x18 bytes below the end of the buffer is word 250.
        unsafe { (*buf.get())[WORDS - 6] = 0x0000_0246 };
        assert_eq!(flags.read().into_bits(), 0x0000_0246);
    }

    #[test]
    fn locates_eflags_in_x86_frame() {
        let buf = UnsafeCell::new([0u32; WORDS]);
        let stack = stack_of(&buf);
        let flags = unsafe { SavedEflags::locate(stack, &TrapFrameLayout::X86) };
        assert_eq!(stack.addr() - flags.addr(), 0x22C);
        unsafe { (*buf.get())[WORDS - 0x22C / 4] = 0x0002_0202 };
        assert!(flags.read().vm_virtual_8086());
    }

    #[test]
    fn each_request_locates_a_fresh_handle() {
        let buf = UnsafeCell::new([0u32; WORDS]);
        let stack = stack_of(&buf);
        let first = unsafe { SavedEflags::locate(stack, &TrapFrameLayout::AMD64) };
        let addr = first.addr();
        let _ = first.update(|f| f.with_iopl(kernel_registers::privilege::Ring::Ring3));

        let second = unsafe { SavedEflags::locate(stack, &TrapFrameLayout::AMD64) };
        assert_eq!(second.addr(), addr);
        assert_eq!(second.read().into_bits(), 0x3000);
    }

    #[test]
    fn update_writes_back_once() {
        let buf = UnsafeCell::new([0xAAAA_AAAAu32; WORDS]);
        let stack = stack_of(&buf);
        let flags = unsafe { SavedEflags::locate(stack, &TrapFrameLayout::AMD64) };
        let upd = flags.update(|f| Eflags::from_bits(f.into_bits() | 1));
        assert_eq!(upd.before.into_bits(), 0xAAAA_AAAA);
        assert_eq!(upd.after.into_bits(), 0xAAAA_AAAB);
        assert_eq!(upd.changed_bits(), 1);

        let words = unsafe { *buf.get() };
        for (i, w) in words.iter().enumerate() {
            let expected = if i == WORDS - 6 { 0xAAAA_AAAB } else { 0xAAAA_AAAA };
            assert_eq!(*w, expected, "word {i}");
        }
    }
}
