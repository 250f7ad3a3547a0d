//! Framed, CRC-checked messaging between a host and a constrained peer.
//!
//! upacket carries payloads of up to 32 bytes between a host and a
//! microcontroller over a serial line or a TCP socket. Payloads may contain
//! any byte value; corruption is detected with CRC-16/XMODEM.
//!
//! # Crate Structure
//!
//! - [`transport`]: Blocking byte-stream and TCP transports, status codes
//! - [`frame`]: Sentinel substitution, checksums and frame assembly
//! - [`link`]: Connection handles for peers (behind `link` feature)

/// Re-export transport types.
pub mod transport {
    pub use upacket_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use upacket_frame::*;
}

/// Re-export link types (requires `link` feature).
#[cfg(feature = "link")]
pub mod link {
    pub use upacket_link::*;
}
