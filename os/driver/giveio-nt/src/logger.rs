use crate::ntddk::{
    DPFLTR_ERROR_LEVEL, DPFLTR_IHVDRIVER_ID, DPFLTR_INFO_LEVEL, DPFLTR_TRACE_LEVEL,
    DPFLTR_WARNING_LEVEL, DbgPrintEx,
};
use core::fmt::Write;
use giveio_core::LineBuffer;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Routes `log` records to the kernel debugger via `DbgPrintEx`.
///
/// Records are formatted into a stack buffer; nothing is allocated. Messages
/// longer than the buffer are cut off.
pub struct DbgPrintLogger {
    max_level: LevelFilter,
}

impl DbgPrintLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    /// Call this once from `DriverEntry`.
    pub fn init(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.max_level);
        Ok(())
    }
}

impl Log for DbgPrintLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut line = LineBuffer::new();
        // Truncation is reported as an error; print what fits.
        let _ = writeln!(line, "[{}] {}: {}", record.level(), record.target(), record.args());

        let level = match record.level() {
            Level::Error => DPFLTR_ERROR_LEVEL,
            Level::Warn => DPFLTR_WARNING_LEVEL,
            Level::Info => DPFLTR_INFO_LEVEL,
            Level::Debug | Level::Trace => DPFLTR_TRACE_LEVEL,
        };
        unsafe {
            DbgPrintEx(
                DPFLTR_IHVDRIVER_ID,
                level,
                c"%s".as_ptr(),
                line.as_c_str().as_ptr(),
            );
        }
    }

    fn flush(&self) {}
}
