//! Sentinel-delimited, CRC-checked framing for short binary messages.
//!
//! Every frame on the wire looks like:
//! - A `0x7C` opening delimiter
//! - A 2-byte big-endian CRC-16/XMODEM of the original payload
//! - A 4-byte big-endian bitmap of payload positions that held a sentinel
//! - Up to 32 payload bytes, with every sentinel replaced by `0x2B`
//! - A `0x7C` closing delimiter
//!
//! Callers hand over payloads and get verified payloads back; delimiting,
//! substitution and checksumming never leak into user code.

pub mod codec;
pub mod crc;
pub mod error;
pub mod framed;
pub mod stuffing;

pub use codec::{
    assemble_frame, parse_frame_body, parse_wire_frame, Frame, HEADER_SIZE, MAX_BODY_SIZE,
    MAX_FRAME_SIZE, MAX_PAYLOAD, MIN_FRAME_SIZE,
};
pub use crc::crc16_xmodem;
pub use error::{FrameError, Result};
pub use framed::Framed;
pub use stuffing::{decode, encode, REPLACEMENT};
pub use upacket_transport::{Status, SENTINEL};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_body_limit_matches_frame_layout() {
        assert_eq!(MAX_BODY_SIZE, upacket_transport::DEFAULT_MAX_BODY);
        assert_eq!(MAX_FRAME_SIZE, 40);
        assert_eq!(MIN_FRAME_SIZE, 8);
    }
}
