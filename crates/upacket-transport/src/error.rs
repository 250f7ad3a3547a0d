use std::io::ErrorKind;
use std::time::Duration;

use crate::status::Status;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// No serial port matched the requested USB product id.
    #[error("no serial port with USB product id 0x{pid:04X}")]
    PortNotFound { pid: u16 },

    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// No complete frame arrived before the deadline, or a write stalled.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The peer closed the connection or the line went away.
    #[error("transport disconnected")]
    Disconnected,

    /// Bytes between delimiters exceeded the maximum frame body.
    #[error("frame body too long (more than {max} bytes before delimiter)")]
    FrameTooLong { max: usize },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport has been closed.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Map this error onto the application status taxonomy.
    pub fn status(&self) -> Status {
        match self {
            TransportError::Connect { .. } | TransportError::Bind { .. } => Status::ConnectFailed,
            TransportError::Accept(_) | TransportError::PortNotFound { .. } => {
                Status::ConnectFailed
            }
            TransportError::Timeout(_) => Status::Timeout,
            TransportError::Disconnected | TransportError::Io(_) => Status::Disconnected,
            TransportError::FrameTooLong { .. } => Status::PayloadTooLarge,
            TransportError::Closed => Status::NotInitialized,
        }
    }

    /// Classify an I/O error raised by a read or write on an open transport.
    pub(crate) fn from_io(err: std::io::Error, timeout: Duration) -> Self {
        match err.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportError::Timeout(timeout),
            ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
            | ErrorKind::WriteZero => TransportError::Disconnected,
            _ => TransportError::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_kinds_are_classified() {
        let timeout = Duration::from_millis(5);
        let err = TransportError::from_io(std::io::Error::from(ErrorKind::WouldBlock), timeout);
        assert!(matches!(err, TransportError::Timeout(t) if t == timeout));

        let err = TransportError::from_io(std::io::Error::from(ErrorKind::BrokenPipe), timeout);
        assert!(matches!(err, TransportError::Disconnected));

        let err = TransportError::from_io(std::io::Error::from(ErrorKind::InvalidData), timeout);
        assert!(matches!(err, TransportError::Io(_)));
    }

    #[test]
    fn statuses() {
        assert_eq!(
            TransportError::Timeout(Duration::from_secs(1)).status(),
            Status::Timeout
        );
        assert_eq!(TransportError::Disconnected.status(), Status::Disconnected);
        assert_eq!(TransportError::Closed.status(), Status::NotInitialized);
        assert_eq!(
            TransportError::FrameTooLong { max: 38 }.status(),
            Status::PayloadTooLarge
        );
        let connect = TransportError::Connect {
            addr: "127.0.0.1:1".to_string(),
            source: std::io::Error::from(ErrorKind::ConnectionRefused),
        };
        assert_eq!(connect.status(), Status::ConnectFailed);
        assert_eq!(
            TransportError::PortNotFound { pid: 0x0043 }.status(),
            Status::ConnectFailed
        );
    }
}
