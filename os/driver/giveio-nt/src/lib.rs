//! # giveio NT Driver
//!
//! Kernel-mode glue that turns [`giveio_core`] into a loadable Windows driver.
//!
//! On load the driver creates `\Device\giveio` and the `\DosDevices\giveio`
//! link. Opening `\\.\giveio` from user mode runs the authorization gate and,
//! for callers holding `SeTcbPrivilege`, raises the opening thread's IOPL to 3.
//! Closing the handle does nothing; the grant stays with the thread.
//!
//! ```text
//!   sc create giveio type= kernel binPath= C:\path\to\giveio.sys
//!   sc start giveio
//! ```
//!
//! The crate is empty unless it is built for Windows on x86 or x86-64.

#![cfg(all(target_os = "windows", any(target_arch = "x86", target_arch = "x86_64")))]
#![no_std]
#![allow(unsafe_code)]

mod driver;
mod host;
mod logger;
mod ntddk;

pub use driver::{DriverEntry, DriverError};

/// Bug check code used when the driver cannot continue.
const BUGCHECK_GIVEIO: u32 = 0xE000_6010;

/// Required by the MSVC toolchain whenever floating point formatting code is linked in.
#[used]
#[allow(non_upper_case_globals)]
#[unsafe(no_mangle)]
pub static _fltused: i32 = 0;

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    unsafe { ntddk::KeBugCheckEx(BUGCHECK_GIVEIO, 0, 0, 0, 0) }
}
