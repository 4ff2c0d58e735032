//! # giveio probe
//!
//! End-to-end check of the `giveio` driver from user mode:
//!
//! 1. open `\\.\giveio` (the driver raises this thread's IOPL, or refuses),
//! 2. read this thread's IOPL back with `pushf`,
//! 3. check that a freshly spawned sibling thread still runs with IOPL 0,
//! 4. read one I/O port.
//!
//! Run it once from an ordinary account (expect `PrivilegeNotHeld`, exit
//! code 2) and once from an account holding `SeTcbPrivilege`, e.g. as
//! `LocalSystem` (expect the port value). With `--force` the port is read even
//! without the grant, which terminates the process with
//! `STATUS_PRIVILEGED_INSTRUCTION`.

mod cli;
mod logger;
mod ports;
mod probe;

use clap::Parser;
use cli::Args;
use log::{LevelFilter, error};
use logger::StderrLogger;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = StderrLogger::new(level).init() {
        eprintln!("logger initialization failed: {e}");
    }

    match probe::run(&args) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
