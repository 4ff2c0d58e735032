use crate::host::NtHost;
use crate::logger::DbgPrintLogger;
use crate::ntddk::{
    DeviceObject, DriverObject, FILE_DEVICE_UNKNOWN, IRP_MJ_CLOSE, IRP_MJ_CREATE, IoCreateDevice,
    IoCreateSymbolicLink, IoDeleteDevice, IoDeleteSymbolicLink, Irp, UnicodeString,
    complete_request,
};
use core::ptr;
use giveio_core::names::{DEVICE_NAME, DOS_DEVICE_NAME, utf16};
use giveio_core::{CreateRequest, GiveIo, NtStatus, ProcessorMode};
use log::{LevelFilter, error, info};

static DEVICE_NAME_W: [u16; DEVICE_NAME.len()] = utf16(DEVICE_NAME);
static DOS_DEVICE_NAME_W: [u16; DOS_DEVICE_NAME.len()] = utf16(DOS_DEVICE_NAME);

const LOG_LEVEL: LevelFilter = if cfg!(feature = "verbose") {
    LevelFilter::Trace
} else {
    LevelFilter::Info
};

static LOGGER: DbgPrintLogger = DbgPrintLogger::new(LOG_LEVEL);
static GIVEIO: GiveIo<NtHost> = GiveIo::new(NtHost);

/// Failure while publishing the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    #[error("IoCreateDevice failed: {0}")]
    CreateDevice(NtStatus),
    #[error("IoCreateSymbolicLink failed: {0}")]
    CreateSymbolicLink(NtStatus),
}

impl From<DriverError> for NtStatus {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::CreateDevice(status) | DriverError::CreateSymbolicLink(status) => status,
        }
    }
}

/// Driver entry point, called by the I/O manager at `PASSIVE_LEVEL`.
///
/// # Safety
/// Only the I/O manager may call this, with a valid driver object.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub unsafe extern "system" fn DriverEntry(
    driver: *mut DriverObject,
    _registry_path: *const UnicodeString,
) -> NtStatus {
    // Fails only if a logger is already installed.
    let _ = LOGGER.init();

    match unsafe { register(driver) } {
        Ok(()) => {
            info!(
                "giveio: {DEVICE_NAME} ready as {DOS_DEVICE_NAME} ({} trap frame layout)",
                GIVEIO.layout().arch
            );
            NtStatus::SUCCESS
        }
        Err(e) => {
            error!("giveio: {e}");
            e.into()
        }
    }
}

/// Installs the dispatch routines and publishes device and link.
///
/// If the link cannot be created the device is deleted again.
unsafe fn register(driver: *mut DriverObject) -> Result<(), DriverError> {
    unsafe {
        (*driver).driver_unload = Some(driver_unload);
        (*driver).major_function[IRP_MJ_CREATE] = Some(dispatch_create);
        (*driver).major_function[IRP_MJ_CLOSE] = Some(dispatch_close);
    }

    let device_name = UnicodeString::from_static(&DEVICE_NAME_W);
    let mut device: *mut DeviceObject = ptr::null_mut();
    unsafe {
        IoCreateDevice(
            driver,
            0,
            &raw const device_name,
            FILE_DEVICE_UNKNOWN,
            0,
            0,
            &raw mut device,
        )
    }
    .ok()
    .map_err(DriverError::CreateDevice)?;

    let link_name = UnicodeString::from_static(&DOS_DEVICE_NAME_W);
    if let Err(status) =
        unsafe { IoCreateSymbolicLink(&raw const link_name, &raw const device_name) }.ok()
    {
        unsafe { IoDeleteDevice(device) };
        return Err(DriverError::CreateSymbolicLink(status));
    }

    Ok(())
}

unsafe extern "system" fn driver_unload(driver: *mut DriverObject) {
    let link_name = UnicodeString::from_static(&DOS_DEVICE_NAME_W);
    unsafe {
        let _ = IoDeleteSymbolicLink(&raw const link_name);
        IoDeleteDevice((*driver).device_object);
    }
    info!("giveio: unloaded");
}

/// `IRP_MJ_CREATE`: runs in the context of the thread opening the device.
unsafe extern "system" fn dispatch_create(_device: *mut DeviceObject, irp: *mut Irp) -> NtStatus {
    let request = CreateRequest::new(ProcessorMode::from_raw(unsafe { (*irp).requestor_mode }));
    let state = GIVEIO.handle_create(&request);
    unsafe { complete_request(irp, state.status()) }
}

/// `IRP_MJ_CLOSE`: nothing to undo.
unsafe extern "system" fn dispatch_close(_device: *mut DeviceObject, irp: *mut Irp) -> NtStatus {
    unsafe { complete_request(irp, GIVEIO.dispatch_close()) }
}
