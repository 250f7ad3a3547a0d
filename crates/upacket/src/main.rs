mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "upacket", version, about = "uPacket framing CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true, env = "UPACKET_FORMAT")]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        global = true,
        env = "UPACKET_LOG_FORMAT"
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        global = true,
        env = "UPACKET_LOG_LEVEL"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "upacket",
            "send",
            "127.0.0.1:1336",
            "--data",
            "hello",
            "--wait",
            "--timeout",
            "500ms",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert!(args.wait);
                assert_eq!(args.timeout, "500ms");
                assert_eq!(args.data.as_deref(), Some("hello"));
            }
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn parses_serial_send_target() {
        let cli = Cli::try_parse_from([
            "upacket",
            "send",
            "--pid",
            "0x0043",
            "--baud",
            "9600",
            "--no-reset-wait",
            "--data",
            "led_on",
        ])
        .expect("serial send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.addr, None);
                assert_eq!(args.pid, Some(0x0043));
                assert_eq!(args.baud, 9600);
                assert!(args.no_reset_wait);
            }
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn send_requires_exactly_one_target() {
        let err = Cli::try_parse_from(["upacket", "send", "--data", "hi"])
            .expect_err("send without a target should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from([
            "upacket",
            "send",
            "127.0.0.1:1336",
            "--serial",
            "/dev/ttyACM0",
        ])
        .expect_err("two targets should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "upacket",
            "send",
            "127.0.0.1:1336",
            "--hex",
            "0102",
            "--data",
            "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn encode_requires_a_payload() {
        let err = Cli::try_parse_from(["upacket", "encode"])
            .expect_err("encode without payload should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "upacket",
            "decode",
            "7C00000000000000 7C",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("decode args should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.log_level, LogLevel::Debug));
        assert!(matches!(cli.command, Command::Decode(_)));
    }

    #[test]
    fn parses_listen_count() {
        let cli = Cli::try_parse_from(["upacket", "listen", "0.0.0.0:1336", "--count", "3"])
            .expect("listen args should parse");
        match cli.command {
            Command::Listen(args) => assert_eq!(args.count, Some(3)),
            other => panic!("expected listen, got {other:?}"),
        }
    }
}
