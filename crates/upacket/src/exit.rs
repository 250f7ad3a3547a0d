use std::fmt;
use std::io;

use upacket_frame::FrameError;
use upacket_link::LinkError;
use upacket_transport::TransportError;

// Process exit codes.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Timeout(_) => TIMEOUT,
        TransportError::Connect { source, .. } | TransportError::Bind { source, .. }
            if source.kind() == io::ErrorKind::TimedOut =>
        {
            TIMEOUT
        }
        TransportError::FrameTooLong { .. } => DATA_INVALID,
        TransportError::Closed => INTERNAL,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Transport(err) => transport_error(context, err),
        LinkError::Frame(err) => frame_error(context, err),
        LinkError::NotInitialized => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn integrity_failures_are_data_invalid() {
        let checksum = FrameError::ChecksumMismatch {
            expected: 1,
            actual: 2,
        };
        assert_eq!(frame_error("decode", checksum).code, DATA_INVALID);

        let short = FrameError::Malformed { len: 2, min: 6 };
        assert_eq!(frame_error("decode", short).code, DATA_INVALID);

        let oversize = LinkError::from(FrameError::PayloadTooLarge { size: 40, max: 32 });
        assert_eq!(link_error("send", oversize).code, DATA_INVALID);
    }

    #[test]
    fn transport_failures_map_by_kind() {
        let timeout = LinkError::from(TransportError::Timeout(Duration::from_secs(1)));
        assert_eq!(link_error("recv", timeout).code, TIMEOUT);

        let refused = TransportError::Connect {
            addr: "127.0.0.1:1".to_string(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert_eq!(transport_error("connect", refused).code, TRANSPORT_ERROR);

        let gone = LinkError::from(FrameError::from(TransportError::Disconnected));
        let err = link_error("recv", gone);
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.starts_with("recv: "));
    }
}
