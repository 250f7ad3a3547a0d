use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgGroup, Args, Subcommand};
use upacket_frame::FrameError;
use upacket_link::LinkError;
use upacket_transport::TransportError;

use crate::exit::{link_error, CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod echo;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a frame for a payload and print it.
    Encode(EncodeArgs),
    /// Parse and verify a frame given in hex.
    Decode(DecodeArgs),
    /// Send a single frame to a TCP peer or serial device.
    Send(SendArgs),
    /// Listen and print received frames.
    Listen(ListenArgs),
    /// Start an echo peer.
    Echo(EchoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Echo(args) => echo::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("payload").required(true).args(["data", "hex"])))]
pub struct EncodeArgs {
    /// Raw string payload.
    #[arg(long)]
    pub data: Option<String>,
    /// Payload as hex bytes (e.g. 0102 or "7c 2b").
    #[arg(long)]
    pub hex: Option<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Complete frame in hex, delimiters included.
    pub frame: String,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["addr", "serial", "pid"])))]
pub struct SendArgs {
    /// Peer address (host:port).
    pub addr: Option<String>,
    /// Serial device path (e.g. /dev/ttyACM0, COM3).
    #[arg(long, value_name = "PATH")]
    pub serial: Option<String>,
    /// USB product id of the serial device, in hex (e.g. 0043).
    #[arg(long, value_parser = parse_usb_pid)]
    pub pid: Option<u16>,
    /// Serial baud rate.
    #[arg(long, default_value_t = 115_200)]
    pub baud: u32,
    /// Skip the wait for the board to reset after opening a serial device.
    #[arg(long)]
    pub no_reset_wait: bool,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Payload as hex bytes.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
    /// Wait for one response frame and print it.
    #[arg(long)]
    pub wait: bool,
    /// Read/write timeout (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind (host:port).
    pub addr: String,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Poll interval for each read (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Address to bind (host:port).
    pub addr: String,
    /// Poll interval for each read (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// What a serving loop does after a failed receive.
pub(crate) enum RecvErrorDisposition {
    /// Peer is gone; wait for the next connection.
    Break,
    /// Nothing arrived in time; check for shutdown and read again.
    Idle,
    /// A corrupted frame was dropped; keep reading.
    Skip,
    Fatal(CliError),
}

pub(crate) fn classify_recv_error(err: LinkError) -> RecvErrorDisposition {
    match err {
        LinkError::Transport(TransportError::Disconnected)
        | LinkError::Frame(FrameError::Transport(TransportError::Disconnected)) => {
            RecvErrorDisposition::Break
        }
        LinkError::Transport(TransportError::Timeout(_))
        | LinkError::Frame(FrameError::Transport(TransportError::Timeout(_))) => {
            RecvErrorDisposition::Idle
        }
        LinkError::Frame(FrameError::Transport(TransportError::FrameTooLong { max })) => {
            tracing::warn!(max, "dropped overlong frame");
            RecvErrorDisposition::Skip
        }
        LinkError::Frame(
            err @ (FrameError::ChecksumMismatch { .. }
            | FrameError::Malformed { .. }
            | FrameError::PayloadTooLarge { .. }),
        ) => {
            tracing::warn!(error = %err, status = %err.status(), "dropped invalid frame");
            RecvErrorDisposition::Skip
        }
        other => RecvErrorDisposition::Fatal(link_error("receive failed", other)),
    }
}

pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        // The loops notice the flag between reads; a second interrupt exits
        // even while blocked in accept.
        if !running.swap(false, Ordering::SeqCst) {
            std::process::exit(130);
        }
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Parse a USB product id given in hex, with or without `0x`.
pub(crate) fn parse_usb_pid(input: &str) -> Result<u16, String> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u16::from_str_radix(digits, 16)
        .map_err(|err| format!("invalid USB product id {input:?}: {err}"))
}

/// Parse hex bytes, ignoring whitespace, `:` separators and a `0x` prefix.
pub(crate) fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(&digits).map_err(|err| CliError::new(USAGE, format!("invalid hex input: {err}")))
}

/// Resolve `--data` / `--hex` / `--file` into payload bytes.
pub(crate) fn resolve_payload(
    data: Option<&str>,
    hex: Option<&str>,
    file: Option<&PathBuf>,
) -> CliResult<Vec<u8>> {
    if let Some(data) = data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(hex) = hex {
        return parse_hex(hex);
    }
    if let Some(path) = file {
        return std::fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }

    #[test]
    fn parse_hex_accepts_common_spellings() {
        assert_eq!(parse_hex("0102").unwrap(), vec![0x01, 0x02]);
        assert_eq!(parse_hex("0x7c2B").unwrap(), vec![0x7C, 0x2B]);
        assert_eq!(parse_hex("7C 13:73").unwrap(), vec![0x7C, 0x13, 0x73]);
        assert!(parse_hex("").unwrap().is_empty());
    }

    #[test]
    fn parse_hex_rejects_bad_digits() {
        assert_eq!(parse_hex("0g").unwrap_err().code, USAGE);
        assert_eq!(parse_hex("123").unwrap_err().code, USAGE);
    }

    #[test]
    fn parse_usb_pid_reads_hex() {
        assert_eq!(parse_usb_pid("0043"), Ok(0x0043));
        assert_eq!(parse_usb_pid("0x7523"), Ok(0x7523));
        assert_eq!(parse_usb_pid("EA60"), Ok(0xEA60));
        assert!(parse_usb_pid("10000").is_err());
        assert!(parse_usb_pid("zz").is_err());
    }

    #[test]
    fn resolve_payload_prefers_explicit_source() {
        assert_eq!(resolve_payload(Some("hi"), None, None).unwrap(), b"hi");
        assert_eq!(resolve_payload(None, Some("7c"), None).unwrap(), vec![0x7C]);
        assert!(resolve_payload(None, None, None).unwrap().is_empty());
    }

    #[test]
    fn resolve_payload_reports_missing_file() {
        let missing = PathBuf::from("/nonexistent/upacket-payload.bin");
        let err = resolve_payload(None, None, Some(&missing)).unwrap_err();
        assert_eq!(err.code, crate::exit::FAILURE);
    }

    #[test]
    fn disconnect_ends_session() {
        let disposition = classify_recv_error(LinkError::from(FrameError::from(
            TransportError::Disconnected,
        )));
        assert!(matches!(disposition, RecvErrorDisposition::Break));
    }

    #[test]
    fn timeout_is_idle() {
        let disposition = classify_recv_error(LinkError::from(FrameError::from(
            TransportError::Timeout(Duration::from_secs(1)),
        )));
        assert!(matches!(disposition, RecvErrorDisposition::Idle));
    }

    #[test]
    fn corrupted_frames_are_skipped() {
        let checksum = LinkError::from(FrameError::ChecksumMismatch {
            expected: 0x1373,
            actual: 0x0000,
        });
        assert!(matches!(
            classify_recv_error(checksum),
            RecvErrorDisposition::Skip
        ));

        let short = LinkError::from(FrameError::Malformed { len: 1, min: 6 });
        assert!(matches!(classify_recv_error(short), RecvErrorDisposition::Skip));
    }

    #[test]
    fn closed_link_is_fatal() {
        assert!(matches!(
            classify_recv_error(LinkError::NotInitialized),
            RecvErrorDisposition::Fatal(_)
        ));
    }
}
