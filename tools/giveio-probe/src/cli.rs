use clap::Parser;
use giveio_core::names::USER_DEVICE_PATH;

/// Opens the giveio device and verifies the resulting port I/O grant.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path of the device to open
    #[arg(long, default_value = USER_DEVICE_PATH)]
    pub device: String,

    /// I/O port to read once access is granted (decimal or 0x-prefixed hex)
    #[arg(long, default_value = "0x80", value_parser = parse_port)]
    pub port: u16,

    /// Read the port even if IOPL does not allow it (the process will fault)
    #[arg(long, action)]
    pub force: bool,

    /// Skip the check that a sibling thread stays unprivileged
    #[arg(long, action)]
    pub no_sibling: bool,

    /// Enable debug output
    #[arg(long, short, action)]
    pub verbose: bool,
}

fn parse_port(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid port {s:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_accept_hex_and_decimal() {
        assert_eq!(parse_port("0x80"), Ok(0x80));
        assert_eq!(parse_port("0X3F8"), Ok(0x3F8));
        assert_eq!(parse_port("97"), Ok(97));
        assert_eq!(parse_port("0xFFFF"), Ok(u16::MAX));
        assert!(parse_port("0x10000").is_err());
        assert!(parse_port("port").is_err());
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["giveio-probe"]).unwrap();
        assert_eq!(args.device, r"\\.\giveio");
        assert_eq!(args.port, 0x80);
        assert!(!args.force);
        assert!(!args.no_sibling);
    }

    #[test]
    fn flags_parse() {
        let args =
            Args::try_parse_from(["giveio-probe", "--port", "0x61", "--force", "--no-sibling", "-v"])
                .unwrap();
        assert_eq!(args.port, 0x61);
        assert!(args.force && args.no_sibling && args.verbose);
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
