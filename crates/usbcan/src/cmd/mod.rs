use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use usbcan_codec::Layout;
use usbcan_frame::MAX_CAN_ID;
use usbcan_transport::{
    discover_serial, DeviceSelector, MatchBy, SerialChannel, SerialConfig, DEFAULT_DEVICE,
};

use crate::exit::{transport_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod codec;
pub mod listen;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports and mark the ones the device flags select.
    Ports(PortsArgs),
    /// Send a single frame.
    Send(SendArgs),
    /// Listen and print received frames.
    Listen(ListenArgs),
    /// Pack typed values into payload bytes (offline).
    Pack(PackArgs),
    /// Unpack payload bytes into typed values (offline).
    Unpack(UnpackArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Listen(args) => listen::run(args, format),
        Command::Pack(args) => codec::pack(args, format),
        Command::Unpack(args) => codec::unpack(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum MatchArg {
    /// Exact OS device name (e.g. /dev/ttyACM0, COM3).
    Name,
    /// Exact USB product description.
    Description,
    /// USB product description prefix.
    Prefix,
}

impl From<MatchArg> for MatchBy {
    fn from(arg: MatchArg) -> Self {
        match arg {
            MatchArg::Name => MatchBy::Name,
            MatchArg::Description => MatchBy::Description,
            MatchArg::Prefix => MatchBy::DescriptionPrefix,
        }
    }
}

/// Flags that pick and configure the adapter.
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Device name or description to look for.
    #[arg(long, env = "USBCAN_DEVICE", default_value = DEFAULT_DEVICE)]
    pub device: String,
    /// Port attribute `--device` is compared against.
    #[arg(long = "by", value_enum, default_value = "description")]
    pub match_by: MatchArg,
    /// Zero-based index among matching ports.
    #[arg(long, default_value_t = 0)]
    pub index: usize,
    /// Serial line rate.
    #[arg(long, default_value_t = 115_200)]
    pub baud: u32,
    /// Give up on a read after this long (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION")]
    pub read_timeout: Option<String>,
}

impl DeviceArgs {
    pub fn selector(&self) -> DeviceSelector {
        DeviceSelector {
            device: self.device.clone(),
            match_by: self.match_by.into(),
            index: self.index,
        }
    }

    pub fn serial_config(&self) -> CliResult<SerialConfig> {
        let read_timeout = self
            .read_timeout
            .as_deref()
            .map(parse_duration)
            .transpose()?;
        Ok(SerialConfig {
            baud_rate: self.baud,
            read_timeout,
            ..SerialConfig::default()
        })
    }

    pub fn open(&self) -> CliResult<SerialChannel> {
        let config = self.serial_config()?;
        discover_serial(&self.selector(), &config)
            .map_err(|err| transport_error("open failed", err))
    }
}

#[derive(Args, Debug)]
pub struct PortsArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// CAN ID, decimal or 0x-prefixed hex (0..=0x7FF).
    #[arg(value_parser = parse_can_id)]
    pub id: u16,
    /// Raw payload bytes as hex (e.g. "01 02 03" or "010203").
    #[arg(long, conflicts_with = "types", required_unless_present = "types")]
    pub data: Option<String>,
    /// DLC index for --data. Default: smallest that fits, zero-padded.
    #[arg(long, requires = "data", value_parser = clap::value_parser!(u8).range(0..=15))]
    pub dlc: Option<u8>,
    /// Comma-separated value types, e.g. "u16,u24,f32".
    #[arg(long, requires = "values")]
    pub types: Option<Layout>,
    /// Comma-separated values, one per type.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, requires = "types")]
    pub values: Vec<String>,
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Only print these CAN IDs (comma-separated).
    #[arg(long, value_delimiter = ',', value_parser = parse_can_id)]
    pub ids: Option<Vec<u16>>,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// JSON layout file used to decode payloads by CAN ID.
    #[arg(long, value_name = "FILE")]
    pub layouts: Option<PathBuf>,
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct PackArgs {
    /// Comma-separated value types.
    #[arg(long)]
    pub types: Layout,
    /// Comma-separated values, one per type.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub values: Vec<String>,
    /// Zero-pad to the smallest DLC size that fits.
    #[arg(long)]
    pub pad: bool,
}

#[derive(Args, Debug)]
pub struct UnpackArgs {
    /// Comma-separated value types.
    #[arg(long)]
    pub types: Layout,
    /// Payload bytes as hex.
    #[arg(long)]
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a CAN ID given as decimal or `0x` hex.
pub fn parse_can_id(input: &str) -> Result<u16, String> {
    let input = input.trim();
    let invalid = || format!("invalid CAN ID: {input}");
    let id = match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(hex) if hex.starts_with(|c: char| c.is_ascii_hexdigit()) => {
            u16::from_str_radix(hex, 16).map_err(|_| invalid())?
        }
        None if input.starts_with(|c: char| c.is_ascii_digit()) => {
            input.parse().map_err(|_| invalid())?
        }
        _ => return Err(invalid()),
    };

    if id > MAX_CAN_ID {
        return Err(format!("CAN ID {input} exceeds 0x7ff"));
    }
    Ok(id)
}

/// Parse hex bytes, ignoring whitespace, `:` and `-` separators.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':' && *b != b'-')
        .collect();
    let digits = digits.strip_prefix(b"0x").unwrap_or(&digits);

    if digits.len() % 2 != 0 {
        return Err(CliError::usage(format!(
            "hex payload has an odd number of digits: {input:?}"
        )));
    }

    digits
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| CliError::usage(format!("invalid hex payload: {input:?}")))
        })
        .collect()
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
