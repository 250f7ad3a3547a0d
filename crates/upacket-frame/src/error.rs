use upacket_transport::{Status, TransportError};

/// Errors that can occur during frame assembly and parsing.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the protocol maximum.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The received bytes are not a complete frame.
    #[error("malformed frame ({len} bytes, need at least {min})")]
    Malformed { len: usize, min: usize },

    /// The checksum carried by the frame does not match the decoded payload.
    #[error("checksum mismatch (frame 0x{expected:04X}, computed 0x{actual:04X})")]
    ChecksumMismatch { expected: u16, actual: u16 },

    /// The transport failed while reading or writing a frame.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl FrameError {
    /// Map this error onto the application status taxonomy.
    ///
    /// A short frame reports [`Status::Timeout`]: on a byte line it almost
    /// always means the read was cut off.
    pub fn status(&self) -> Status {
        match self {
            FrameError::PayloadTooLarge { .. } => Status::PayloadTooLarge,
            FrameError::Malformed { .. } => Status::Timeout,
            FrameError::ChecksumMismatch { .. } => Status::ChecksumMismatch,
            FrameError::Transport(err) => err.status(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
