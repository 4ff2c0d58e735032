//! The subset of `ntddk.h` the driver needs.
//!
//! Structures are declared only up to the last member the driver touches;
//! instances are always allocated by the I/O manager.

#![allow(non_snake_case, dead_code)]

use core::ffi::{c_char, c_void};
use giveio_core::{Luid, NtStatus};

pub type KprocessorMode = i8;
pub type Boolean = u8;

pub const FILE_DEVICE_UNKNOWN: u32 = 0x22;
pub const IO_NO_INCREMENT: i8 = 0;

pub const IRP_MJ_CREATE: usize = 0x00;
pub const IRP_MJ_CLOSE: usize = 0x02;
pub const IRP_MJ_MAXIMUM_FUNCTION: usize = 0x1b;

pub const DPFLTR_IHVDRIVER_ID: u32 = 77;
pub const DPFLTR_ERROR_LEVEL: u32 = 0;
pub const DPFLTR_WARNING_LEVEL: u32 = 1;
pub const DPFLTR_TRACE_LEVEL: u32 = 2;
pub const DPFLTR_INFO_LEVEL: u32 = 3;

/// `UNICODE_STRING`; lengths are in bytes.
#[repr(C)]
pub struct UnicodeString {
    pub length: u16,
    pub maximum_length: u16,
    pub buffer: *const u16,
}

impl UnicodeString {
    /// Borrows a static UTF-16 buffer (not NUL terminated).
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_static(s: &'static [u16]) -> Self {
        let bytes = s.len() * 2;
        assert!(bytes <= u16::MAX as usize, "name too long");
        Self {
            length: bytes as u16,
            maximum_length: bytes as u16,
            buffer: s.as_ptr(),
        }
    }
}

#[repr(C)]
pub struct DeviceObject {
    _opaque: [u8; 0],
}

#[repr(C)]
pub struct ListEntry {
    pub flink: *mut ListEntry,
    pub blink: *mut ListEntry,
}

/// `IO_STATUS_BLOCK`. The first member is a `NTSTATUS`/`PVOID` union; the
/// natural alignment of `information` reproduces its pointer size.
#[repr(C)]
pub struct IoStatusBlock {
    pub status: NtStatus,
    pub information: usize,
}

/// Leading members of `IRP`.
#[repr(C)]
pub struct Irp {
    pub type_: i16,
    pub size: u16,
    pub mdl_address: *mut c_void,
    pub flags: u32,
    pub associated_irp: *mut c_void,
    pub thread_list_entry: ListEntry,
    pub io_status: IoStatusBlock,
    pub requestor_mode: KprocessorMode,
    pub pending_returned: Boolean,
}

pub type DriverDispatch = unsafe extern "system" fn(*mut DeviceObject, *mut Irp) -> NtStatus;
pub type DriverUnload = unsafe extern "system" fn(*mut DriverObject);

#[repr(C)]
pub struct DriverObject {
    pub type_: i16,
    pub size: i16,
    pub device_object: *mut DeviceObject,
    pub flags: u32,
    pub driver_start: *mut c_void,
    pub driver_size: u32,
    pub driver_section: *mut c_void,
    pub driver_extension: *mut c_void,
    pub driver_name: UnicodeString,
    pub hardware_database: *mut UnicodeString,
    pub fast_io_dispatch: *mut c_void,
    pub driver_init: *mut c_void,
    pub driver_start_io: *mut c_void,
    pub driver_unload: Option<DriverUnload>,
    pub major_function: [Option<DriverDispatch>; IRP_MJ_MAXIMUM_FUNCTION + 1],
}

#[link(name = "ntoskrnl")]
unsafe extern "system" {
    pub fn IoGetInitialStack() -> *mut c_void;

    pub fn SeSinglePrivilegeCheck(PrivilegeValue: Luid, PreviousMode: KprocessorMode) -> Boolean;

    pub fn IoCreateDevice(
        DriverObject: *mut DriverObject,
        DeviceExtensionSize: u32,
        DeviceName: *const UnicodeString,
        DeviceType: u32,
        DeviceCharacteristics: u32,
        Exclusive: Boolean,
        DeviceObject: *mut *mut DeviceObject,
    ) -> NtStatus;

    pub fn IoDeleteDevice(DeviceObject: *mut DeviceObject);

    pub fn IoCreateSymbolicLink(
        SymbolicLinkName: *const UnicodeString,
        DeviceName: *const UnicodeString,
    ) -> NtStatus;

    pub fn IoDeleteSymbolicLink(SymbolicLinkName: *const UnicodeString) -> NtStatus;

    pub fn KeBugCheckEx(
        BugCheckCode: u32,
        BugCheckParameter1: usize,
        BugCheckParameter2: usize,
        BugCheckParameter3: usize,
        BugCheckParameter4: usize,
    ) -> !;
}

// `IoCompleteRequest` is a macro over `IofCompleteRequest`, which is fastcall on x86.
#[cfg(target_arch = "x86_64")]
#[link(name = "ntoskrnl")]
unsafe extern "system" {
    pub fn IofCompleteRequest(Irp: *mut Irp, PriorityBoost: i8);
}

#[cfg(target_arch = "x86")]
#[link(name = "ntoskrnl")]
unsafe extern "fastcall" {
    pub fn IofCompleteRequest(Irp: *mut Irp, PriorityBoost: i8);
}

#[link(name = "ntoskrnl")]
unsafe extern "C" {
    pub fn DbgPrintEx(ComponentId: u32, Level: u32, Format: *const c_char, ...) -> u32;
}

/// Completes `irp` with `status` and no information.
///
/// # Safety
/// `irp` must be an IRP owned by the caller that has not been completed yet.
pub unsafe fn complete_request(irp: *mut Irp, status: NtStatus) -> NtStatus {
    unsafe {
        (*irp).io_status.status = status;
        (*irp).io_status.information = 0;
        IofCompleteRequest(irp, IO_NO_INCREMENT);
    }
    status
}
