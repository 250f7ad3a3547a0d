use std::net::SocketAddr;

use bytes::Bytes;
use tracing::{debug, warn};
use upacket_frame::Framed;
use upacket_transport::{Status, Transport};

use crate::config::LinkConfig;
use crate::error::{LinkError, Result};

/// A connection to one peer.
///
/// A link owns exactly one transport. Reads and writes block for at most
/// [`LinkConfig::timeout`]; callers serialise access. After [`Link::close`]
/// (or on a link that was never opened) every operation reports
/// [`LinkError::NotInitialized`].
pub struct Link {
    framed: Option<Framed<Box<dyn Transport>>>,
    config: LinkConfig,
    peer_addr: Option<SocketAddr>,
}

impl Link {
    /// Wrap an already established transport.
    pub fn from_transport<T: Transport + 'static>(transport: T, config: LinkConfig) -> Self {
        Self {
            framed: Some(Framed::new(Box::new(transport))),
            config,
            peer_addr: None,
        }
    }

    /// A link with no transport behind it.
    pub fn unopened(config: LinkConfig) -> Self {
        Self {
            framed: None,
            config,
            peer_addr: None,
        }
    }

    pub(crate) fn with_peer_addr(mut self, addr: Option<SocketAddr>) -> Self {
        self.peer_addr = addr;
        self
    }

    /// Address of the remote end, for socket links.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Whether a transport is attached.
    pub fn is_open(&self) -> bool {
        self.framed.is_some()
    }

    /// The configuration this link was opened with.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Name of the attached transport, if any.
    pub fn transport_name(&self) -> Option<&'static str> {
        self.framed
            .as_ref()
            .map(|framed| framed.get_ref().transport_name())
    }

    fn framed(&mut self) -> Result<&mut Framed<Box<dyn Transport>>> {
        self.framed.as_mut().ok_or(LinkError::NotInitialized)
    }

    /// Send one payload (at most 32 bytes).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.framed()?.send(payload)?;
        Ok(())
    }

    /// Send one payload and report the outcome as a status code.
    pub fn send_status(&mut self, payload: &[u8]) -> Status {
        match self.send(payload) {
            Ok(()) => Status::Ok,
            Err(err) => err.status(),
        }
    }

    /// Receive the next verified payload.
    pub fn recv(&mut self) -> Result<Bytes> {
        let drain = self.config.drain_after_recv;
        let framed = self.framed()?;
        let frame = framed.read_frame()?;

        if drain {
            match framed.get_mut().discard_input() {
                Ok(0) => {}
                Ok(dropped) => debug!(dropped, "drained pending input after frame"),
                Err(err) => warn!(error = %err, "failed to drain pending input"),
            }
        }

        Ok(frame.payload)
    }

    /// Receive the next payload, reporting failures as a status code with an
    /// empty payload.
    pub fn recv_status(&mut self) -> (Status, Bytes) {
        match self.recv() {
            Ok(payload) => (Status::Ok, payload),
            Err(err) => (err.status(), Bytes::new()),
        }
    }

    /// Whether unread input is waiting, without blocking.
    pub fn has_pending_input(&mut self) -> Result<bool> {
        Ok(self.framed()?.get_mut().data_available()?)
    }

    /// [`Status::DataAvailable`] or [`Status::NoDataAvailable`], or the
    /// status of whatever prevented the check.
    pub fn data_available(&mut self) -> Status {
        match self.has_pending_input() {
            Ok(true) => Status::DataAvailable,
            Ok(false) => Status::NoDataAvailable,
            Err(err) => err.status(),
        }
    }

    /// Drop all pending input. Returns the number of bytes dropped.
    pub fn discard_input(&mut self) -> Result<usize> {
        Ok(self.framed()?.get_mut().discard_input()?)
    }

    /// Close the link and release its transport.
    ///
    /// Closing an already closed link does nothing.
    pub fn close(&mut self) -> Result<()> {
        if let Some(framed) = self.framed.take() {
            let mut transport = framed.into_inner();
            debug!(transport = transport.transport_name(), "closing link");
            transport.close()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("transport", &self.transport_name())
            .field("peer_addr", &self.peer_addr)
            .field("config", &self.config)
            .finish()
    }
}
