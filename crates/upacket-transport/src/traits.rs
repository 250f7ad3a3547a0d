use std::io::{Read, Write};
use std::time::Duration;

use bytes::BytesMut;

use crate::error::Result;

/// Frame delimiter on the wire (`|`).
pub const SENTINEL: u8 = 0x7C;

/// Longest frame body a transport will accumulate between delimiters:
/// checksum (2) + bitmap (4) + 32 payload bytes.
pub const DEFAULT_MAX_BODY: usize = 38;

/// Default time allowed for one complete frame read.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration shared by both transport shapes.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Deadline for reading one frame, and the write timeout on sockets.
    pub timeout: Duration,
    /// Maximum number of body bytes accepted between delimiters.
    pub max_body: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_body: DEFAULT_MAX_BODY,
        }
    }
}

/// A blocking transport that delivers sentinel-delimited frame bodies.
///
/// Both implementations hand back the bytes *between* two delimiters with the
/// delimiters stripped; interpretation of those bytes belongs to the frame
/// layer.
pub trait Transport: Send {
    /// Block until one delimited frame body has been read.
    fn read_frame(&mut self) -> Result<BytesMut>;

    /// Write a complete, already-delimited frame.
    fn write_frame(&mut self, bytes: &[u8]) -> Result<()>;

    /// Whether unread input is waiting, without blocking.
    fn data_available(&mut self) -> Result<bool>;

    /// Drop all input that is buffered or already pending, without blocking.
    ///
    /// Returns the number of bytes discarded.
    fn discard_input(&mut self) -> Result<usize>;

    /// Close the transport. Closing twice is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read_frame(&mut self) -> Result<BytesMut> {
        (**self).read_frame()
    }

    fn write_frame(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_frame(bytes)
    }

    fn data_available(&mut self) -> Result<bool> {
        (**self).data_available()
    }

    fn discard_input(&mut self) -> Result<usize> {
        (**self).discard_input()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}

/// A serial-like byte line: `Read + Write` plus a non-blocking count of the
/// bytes already waiting in its receive buffer.
///
/// The line is expected to be opened (baud rate, framing) by the caller.
/// Reads should time out with [`std::io::ErrorKind::TimedOut`] or
/// [`std::io::ErrorKind::WouldBlock`]; a read returning `0` is treated as the
/// line going away.
pub trait SerialLine: Read + Write + Send {
    /// Bytes waiting in the receive buffer.
    fn bytes_to_read(&mut self) -> std::io::Result<usize>;

    /// Bound how long the next read may block.
    ///
    /// Called before every read with the time left until the frame deadline.
    /// Lines whose reads never block can keep the default no-op.
    fn set_line_timeout(&mut self, timeout: Duration) -> std::io::Result<()> {
        let _ = timeout;
        Ok(())
    }
}

impl SerialLine for std::net::TcpStream {
    fn bytes_to_read(&mut self) -> std::io::Result<usize> {
        crate::socket::peek_pending(self)
    }

    fn set_line_timeout(&mut self, timeout: Duration) -> std::io::Result<()> {
        // A zero read timeout is rejected by the socket API.
        self.set_read_timeout(Some(timeout.max(MIN_LINE_TIMEOUT)))
    }
}

/// Shortest read timeout handed to a line.
pub(crate) const MIN_LINE_TIMEOUT: Duration = Duration::from_millis(1);
