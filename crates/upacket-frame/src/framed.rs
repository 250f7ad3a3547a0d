use bytes::BytesMut;
use tracing::debug;
use upacket_transport::Transport;

use crate::codec::{assemble_frame, parse_frame_body, Frame, MAX_FRAME_SIZE};
use crate::error::Result;

/// Sends and receives complete frames over any [`Transport`].
///
/// Callers only ever see whole, verified payloads; a failure at any stage
/// drops whatever was read for that frame.
pub struct Framed<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Transport> Framed<T> {
    /// Wrap a transport.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
        }
    }

    /// Assemble and write one frame (blocking).
    ///
    /// Oversized payloads are rejected before anything reaches the transport.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        assemble_frame(payload, &mut self.buf)?;
        self.inner.write_frame(&self.buf)?;
        debug!(
            size = payload.len(),
            transport = self.inner.transport_name(),
            "sent frame"
        );
        Ok(())
    }

    /// Write a previously built frame.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.payload.as_ref())
    }

    /// Read the next complete frame (blocking).
    pub fn read_frame(&mut self) -> Result<Frame> {
        let body = self.inner.read_frame()?;
        let frame = parse_frame_body(&body)?;
        debug!(
            size = frame.payload.len(),
            transport = self.inner.transport_name(),
            "received frame"
        );
        Ok(frame)
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the wrapper and return the transport.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
