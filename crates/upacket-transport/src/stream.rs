use std::io::ErrorKind;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::traits::{SerialLine, Transport, TransportConfig, MIN_LINE_TIMEOUT, SENTINEL};

const INITIAL_BUFFER_CAPACITY: usize = 128;
const READ_CHUNK_SIZE: usize = 64;
/// Pause after a read that returned nothing before asking the line again.
const IDLE_BACKOFF: Duration = Duration::from_millis(2);

/// Byte-stream transport over a serial-like line.
///
/// Frames are pulled off the line with "read until delimiter" requests: one
/// to synchronise on a delimiter, one for the body. An empty body (two
/// delimiters back to back, e.g. the closing delimiter of a frame that was
/// only partially seen followed by the opening delimiter of the next) costs
/// one extra request. Bytes read past the closing delimiter stay buffered
/// for the next frame.
pub struct StreamTransport<L> {
    line: L,
    buf: BytesMut,
    config: TransportConfig,
    closed: bool,
}

impl<L: SerialLine> StreamTransport<L> {
    /// Wrap an opened line with default configuration.
    pub fn new(line: L) -> Self {
        Self::with_config(line, TransportConfig::default())
    }

    /// Wrap an opened line with explicit configuration.
    pub fn with_config(line: L, config: TransportConfig) -> Self {
        Self {
            line,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            closed: false,
        }
    }

    /// Borrow the underlying line.
    pub fn get_ref(&self) -> &L {
        &self.line
    }

    /// Mutably borrow the underlying line.
    pub fn get_mut(&mut self) -> &mut L {
        &mut self.line
    }

    /// Consume the transport and return the line. Buffered input is lost.
    pub fn into_inner(self) -> L {
        self.line
    }

    /// Current transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    fn read_delimited(&mut self, deadline: Instant) -> Result<BytesMut> {
        let skipped = self.read_until_sentinel(deadline, None)?;
        if skipped.len() > 1 {
            debug!(skipped = skipped.len() - 1, "discarded bytes before delimiter");
        }

        let max = self.config.max_body;
        let mut body = self.read_until_sentinel(deadline, Some(max))?;
        if body.len() == 1 {
            trace!("empty body between delimiters, reading again");
            body = self.read_until_sentinel(deadline, Some(max))?;
        }

        body.truncate(body.len() - 1);
        Ok(body)
    }

    /// Returns everything up to and including the next delimiter.
    ///
    /// With `limit == None` bytes are discarded as they are scanned, so a
    /// synchronising read never grows the buffer.
    fn read_until_sentinel(&mut self, deadline: Instant, limit: Option<usize>) -> Result<BytesMut> {
        let mut scanned = 0usize;
        loop {
            if let Some(pos) = self.buf[scanned..].iter().position(|&b| b == SENTINEL) {
                let end = scanned + pos;
                if let Some(max) = limit {
                    if end > max {
                        return Err(TransportError::FrameTooLong { max });
                    }
                }
                return Ok(self.buf.split_to(end + 1));
            }

            match limit {
                Some(max) if self.buf.len() > max => {
                    return Err(TransportError::FrameTooLong { max });
                }
                Some(_) => scanned = self.buf.len(),
                None => {
                    trace!(bytes = self.buf.len(), "dropping bytes while synchronising");
                    self.buf.clear();
                    scanned = 0;
                }
            }

            self.fill(deadline)?;
        }
    }

    fn fill(&mut self, deadline: Instant) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::Timeout(self.config.timeout));
            }
            self.line
                .set_line_timeout(remaining.max(MIN_LINE_TIMEOUT))
                .map_err(|err| TransportError::from_io(err, self.config.timeout))?;
            match self.line.read(&mut chunk) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                // The line's own read timeout elapsed; the frame deadline decides.
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    std::thread::sleep(remaining.min(IDLE_BACKOFF));
                }
                Err(err) => return Err(TransportError::from_io(err, self.config.timeout)),
            }
        }
    }
}

impl<L: SerialLine> Transport for StreamTransport<L> {
    fn read_frame(&mut self) -> Result<BytesMut> {
        self.ensure_open()?;
        let deadline = Instant::now() + self.config.timeout;
        let result = self.read_delimited(deadline);
        if result.is_err() {
            self.buf.clear();
        }
        result
    }

    fn write_frame(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let timeout = self.config.timeout;

        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.line.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::from_io(err, timeout)),
            }
        }

        loop {
            match self.line.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::from_io(err, timeout)),
            }
        }
    }

    fn data_available(&mut self) -> Result<bool> {
        self.ensure_open()?;
        if !self.buf.is_empty() {
            return Ok(true);
        }
        self.line
            .bytes_to_read()
            .map(|pending| pending > 0)
            .map_err(|err| TransportError::from_io(err, self.config.timeout))
    }

    fn discard_input(&mut self) -> Result<usize> {
        self.ensure_open()?;
        let mut discarded = self.buf.len();
        self.buf.clear();

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            let pending = self
                .line
                .bytes_to_read()
                .map_err(|err| TransportError::from_io(err, self.config.timeout))?;
            if pending == 0 {
                break;
            }
            let want = pending.min(chunk.len());
            match self.line.read(&mut chunk[..want]) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => discarded += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::from_io(err, self.config.timeout)),
            }
        }

        if discarded > 0 {
            debug!(discarded, "discarded pending input");
        }
        Ok(discarded)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.buf.clear();
        self.line
            .flush()
            .map_err(|err| TransportError::from_io(err, self.config.timeout))
    }

    fn transport_name(&self) -> &'static str {
        "byte-stream"
    }
}

impl<L> std::fmt::Debug for StreamTransport<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("buffered", &self.buf.len())
            .field("config", &self.config)
            .field("closed", &self.closed)
            .finish()
    }
}
