//! The probe sequence and its report.

use crate::cli::Args;
use crate::ports::{inb, port_io_permitted};
use giveio_core::Ring;
use kernel_registers::LoadRegister;
use kernel_registers::eflags::Eflags;
use log::{debug, info, warn};
use std::fmt;
use std::io;
use std::thread;

/// `ERROR_PRIVILEGE_NOT_HELD`, the Win32 form of `STATUS_PRIVILEGE_NOT_HELD`.
const ERROR_PRIVILEGE_NOT_HELD: i32 = 1314;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("opening {device} was refused: SeTcbPrivilege is not held")]
    PrivilegeNotHeld { device: String },
    #[error("failed to open {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: io::Error,
    },
    #[error("{device} was opened but this thread still runs with IOPL {iopl:?}")]
    NotElevated { device: String, iopl: Ring },
    #[error("a sibling thread runs with IOPL {0:?}, the grant leaked")]
    SiblingElevated(Ring),
    #[error("the sibling thread panicked")]
    SiblingPanicked,
    #[error("the giveio device only exists on Windows")]
    UnsupportedHost,
}

impl ProbeError {
    /// Process exit code for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::PrivilegeNotHeld { .. } => 2,
            Self::UnsupportedHost => 3,
            _ => 1,
        }
    }

    fn from_open(device: &str, source: io::Error) -> Self {
        if source.raw_os_error() == Some(ERROR_PRIVILEGE_NOT_HELD) {
            Self::PrivilegeNotHeld {
                device: device.to_owned(),
            }
        } else {
            Self::Open {
                device: device.to_owned(),
                source,
            }
        }
    }
}

/// What the probe observed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Report {
    pub device: String,
    pub iopl_before: Ring,
    pub iopl_after: Ring,
    pub sibling_iopl: Option<Ring>,
    pub port: u16,
    pub value: u8,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "device:       {}", self.device)?;
        writeln!(
            f,
            "IOPL:         {} -> {}",
            self.iopl_before.to_u8(),
            self.iopl_after.to_u8()
        )?;
        match self.sibling_iopl {
            Some(iopl) => writeln!(f, "sibling IOPL: {}", iopl.to_u8())?,
            None => writeln!(f, "sibling IOPL: not checked")?,
        }
        write!(f, "port {:#06x}:  {:#04x}", self.port, self.value)
    }
}

/// IOPL of the calling thread.
fn current_iopl() -> Ring {
    Eflags::load().iopl()
}

/// IOPL of a newly spawned thread of this process.
fn sibling_iopl() -> Result<Ring, ProbeError> {
    thread::spawn(current_iopl)
        .join()
        .map_err(|_| ProbeError::SiblingPanicked)
}

#[cfg(windows)]
fn open_device(device: &str) -> Result<(), ProbeError> {
    // The grant outlives the handle; it belongs to the thread, not the file.
    std::fs::File::open(device)
        .map(drop)
        .map_err(|e| ProbeError::from_open(device, e))
}

#[cfg(not(windows))]
fn open_device(_device: &str) -> Result<(), ProbeError> {
    Err(ProbeError::UnsupportedHost)
}

/// Opens the device, checks the grant and reads the port.
///
/// # Errors
/// Any [`ProbeError`]; with `--force`, open and elevation failures are only
/// logged and the port is read anyway.
pub fn run(args: &Args) -> Result<Report, ProbeError> {
    let iopl_before = current_iopl();
    debug!("IOPL before open: {iopl_before:?}");

    match open_device(&args.device) {
        Ok(()) => info!("opened {}", args.device),
        Err(e) if args.force && !matches!(e, ProbeError::UnsupportedHost) => warn!("{e}"),
        Err(e) => return Err(e),
    }

    let iopl_after = current_iopl();
    debug!("IOPL after open: {iopl_after:?}");

    let sibling_iopl = if args.no_sibling {
        None
    } else {
        let iopl = sibling_iopl()?;
        debug!("sibling IOPL: {iopl:?}");
        if iopl == Ring::Ring3 && iopl_before != Ring::Ring3 {
            return Err(ProbeError::SiblingElevated(iopl));
        }
        Some(iopl)
    };

    if !port_io_permitted() {
        let e = ProbeError::NotElevated {
            device: args.device.clone(),
            iopl: iopl_after,
        };
        if !args.force {
            return Err(e);
        }
        warn!("{e}; reading port {:#06x} anyway", args.port);
    }

    let value = unsafe { inb(args.port) };
    Ok(Report {
        device: args.device.clone(),
        iopl_before,
        iopl_after,
        sibling_iopl,
        port: args.port,
        value,
    })
}
