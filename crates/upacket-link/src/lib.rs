//! Connection handles for uPacket peers.
//!
//! This is the "just works" layer. Open a link over TCP, a serial device
//! (with the `serial` feature) or an already configured serial line, then
//! send and receive payloads; every outcome can also be read as a
//! [`Status`] code for callers that speak the numeric taxonomy shared with
//! microcontroller firmware.

pub mod config;
pub mod connector;
pub mod error;
pub mod link;
pub mod listener;

pub use config::LinkConfig;
#[cfg(feature = "serial")]
pub use connector::{open_port_with_config, open_usb_pid_with_config};
pub use connector::{connect, connect_with_config, open_serial, open_serial_with_config};
pub use error::{LinkError, Result};
pub use link::Link;
pub use listener::LinkListener;
pub use upacket_transport::Status;
