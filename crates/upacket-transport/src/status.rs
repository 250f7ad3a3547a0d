use std::fmt;

/// Outcome codes surfaced to applications.
///
/// The numeric values are part of the protocol's public contract: callers
/// written against the integer codes branch on exactly these numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    /// The connection could not be established.
    ConnectFailed = 0,
    /// No complete frame arrived (or could be written) before the timeout.
    Timeout = 1,
    /// The received checksum does not match the decoded payload.
    ChecksumMismatch = 2,
    /// The transport was disconnected.
    Disconnected = 3,
    /// The link has no open transport.
    NotInitialized = 4,
    /// The frame was sent or received successfully.
    Ok = 5,
    /// No input is waiting on the transport.
    NoDataAvailable = 6,
    /// Input is waiting on the transport.
    DataAvailable = 7,
    /// The payload exceeds the 32-byte limit.
    PayloadTooLarge = 8,
}

impl Status {
    /// The numeric status code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns true for [`Status::Ok`].
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// Stable upper-case name used in logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            Status::ConnectFailed => "CONNECT_FAILED",
            Status::Timeout => "TIMEOUT",
            Status::ChecksumMismatch => "CHECKSUM_MISMATCH",
            Status::Disconnected => "DISCONNECTED",
            Status::NotInitialized => "NOT_INITIALIZED",
            Status::Ok => "OK",
            Status::NoDataAvailable => "NO_DATA_AVAILABLE",
            Status::DataAvailable => "DATA_AVAILABLE",
            Status::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Status::ConnectFailed),
            1 => Ok(Status::Timeout),
            2 => Ok(Status::ChecksumMismatch),
            3 => Ok(Status::Disconnected),
            4 => Ok(Status::NotInitialized),
            5 => Ok(Status::Ok),
            6 => Ok(Status::NoDataAvailable),
            7 => Ok(Status::DataAvailable),
            8 => Ok(Status::PayloadTooLarge),
            other => Err(other),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_published_values() {
        assert_eq!(Status::ConnectFailed.code(), 0);
        assert_eq!(Status::Timeout.code(), 1);
        assert_eq!(Status::ChecksumMismatch.code(), 2);
        assert_eq!(Status::Disconnected.code(), 3);
        assert_eq!(Status::NotInitialized.code(), 4);
        assert_eq!(Status::Ok.code(), 5);
        assert_eq!(Status::NoDataAvailable.code(), 6);
        assert_eq!(Status::DataAvailable.code(), 7);
        assert_eq!(Status::PayloadTooLarge.code(), 8);
    }

    #[test]
    fn try_from_recovers_every_code() {
        for code in 0..=8u8 {
            let status = Status::try_from(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert_eq!(Status::try_from(9), Err(9));
    }

    #[test]
    fn display_includes_name_and_code() {
        assert_eq!(Status::ChecksumMismatch.to_string(), "CHECKSUM_MISMATCH (2)");
        assert!(Status::Ok.is_ok());
        assert!(!Status::Timeout.is_ok());
    }
}
