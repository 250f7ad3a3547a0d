//! Blocking transports for uPacket frames.
//!
//! Two transport shapes deliver the same thing, the bytes between two
//! sentinel delimiters:
//! - [`StreamTransport`] for serial-like byte lines ("read until delimiter")
//! - [`SocketTransport`] for TCP sockets (byte-at-a-time reads)
//!
//! With the `serial` feature, native serial ports open through
//! [`serial::open_port`] and plug into [`StreamTransport`].
//!
//! This is the lowest layer of upacket. The frame codec builds on the
//! [`Transport`] trait and never branches on the transport kind.

pub mod error;
#[cfg(feature = "serial")]
pub mod serial;
pub mod socket;
pub mod status;
pub mod stream;
pub mod traits;

pub use error::{Result, TransportError};
#[cfg(feature = "serial")]
pub use serial::{find_port_by_pid, open_port, SerialPortLine};
pub use socket::{SocketListener, SocketTransport};
pub use status::Status;
pub use stream::StreamTransport;
pub use traits::{
    SerialLine, Transport, TransportConfig, DEFAULT_MAX_BODY, DEFAULT_TIMEOUT, SENTINEL,
};
