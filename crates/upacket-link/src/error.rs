use upacket_transport::Status;

/// Errors that can occur in link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] upacket_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] upacket_frame::FrameError),

    /// The link was closed or never opened.
    #[error("link is not initialized")]
    NotInitialized,
}

impl LinkError {
    /// Map this error onto the application status taxonomy.
    pub fn status(&self) -> Status {
        match self {
            LinkError::Transport(err) => err.status(),
            LinkError::Frame(err) => err.status(),
            LinkError::NotInitialized => Status::NotInitialized,
        }
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use upacket_frame::FrameError;
    use upacket_transport::TransportError;

    use super::*;

    #[test]
    fn status_follows_inner_error() {
        let timeout = LinkError::from(TransportError::Timeout(Duration::from_secs(1)));
        assert_eq!(timeout.status(), Status::Timeout);

        let checksum = LinkError::from(FrameError::ChecksumMismatch {
            expected: 0x1373,
            actual: 0x0000,
        });
        assert_eq!(checksum.status(), Status::ChecksumMismatch);

        let nested = LinkError::from(FrameError::from(TransportError::Disconnected));
        assert_eq!(nested.status(), Status::Disconnected);

        assert_eq!(LinkError::NotInitialized.status(), Status::NotInitialized);
    }
}
