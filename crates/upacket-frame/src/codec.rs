use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::warn;

use crate::crc::crc16_xmodem;
use crate::error::{FrameError, Result};
use crate::stuffing::{decode_in_place, encode_into};
use upacket_transport::SENTINEL;

/// Maximum payload carried by one frame.
pub const MAX_PAYLOAD: usize = 32;

/// Frame header: checksum (2) + bitmap (4) = 6 bytes.
pub const HEADER_SIZE: usize = 6;

/// Largest frame body between the delimiters.
pub const MAX_BODY_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD;

/// Smallest wire frame: two delimiters around an empty-payload header.
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + 2;

/// Largest wire frame.
pub const MAX_FRAME_SIZE: usize = MIN_FRAME_SIZE + MAX_PAYLOAD;

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// CRC-16/XMODEM of the payload.
    pub checksum: u16,
    /// Positions of the payload that carried a sentinel.
    pub bitmap: u32,
    /// The original, unescaped payload.
    pub payload: Bytes,
}

impl Frame {
    /// Build a frame for `payload`, computing checksum and bitmap.
    pub fn new(payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        let mut scratch = BytesMut::with_capacity(payload.len());
        let bitmap = encode_into(&payload, &mut scratch)?;
        Ok(Self {
            checksum: crc16_xmodem(&payload),
            bitmap,
            payload,
        })
    }

    /// The total wire size of this frame (delimiters + header + payload).
    pub fn wire_size(&self) -> usize {
        MIN_FRAME_SIZE + self.payload.len()
    }
}

/// Assemble the wire frame for `payload` into `dst`.
///
/// Wire format (multi-byte fields big-endian):
/// ```text
/// ┌──────┬──────────┬──────────┬───────────────────┬──────┐
/// │ 0x7C │ CRC (2B) │ Bitmap   │ Encoded payload   │ 0x7C │
/// │ "|"  │ XMODEM   │ (4B)     │ (0..=32 bytes)    │ "|"  │
/// └──────┴──────────┴──────────┴───────────────────┴──────┘
/// ```
///
/// The checksum covers the payload *before* sentinel substitution.
pub fn assemble_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    dst.reserve(MIN_FRAME_SIZE + payload.len());
    dst.put_u8(SENTINEL);
    dst.put_u16(crc16_xmodem(payload));
    // Bitmap is patched in once the payload has been encoded.
    let bitmap_at = dst.len();
    dst.put_u32(0);
    let bitmap = encode_into(payload, dst)?;
    dst[bitmap_at..bitmap_at + 4].copy_from_slice(&bitmap.to_be_bytes());
    dst.put_u8(SENTINEL);
    Ok(())
}

/// Parse a frame body (the bytes between the delimiters).
///
/// The bitmap alone decides which positions are restored to the sentinel;
/// the checksum over the restored payload is the only integrity check.
pub fn parse_frame_body(body: &[u8]) -> Result<Frame> {
    if body.len() < HEADER_SIZE {
        return Err(FrameError::Malformed {
            len: body.len(),
            min: HEADER_SIZE,
        });
    }

    let (mut header, encoded) = body.split_at(HEADER_SIZE);
    if encoded.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: encoded.len(),
            max: MAX_PAYLOAD,
        });
    }

    let checksum = header.get_u16();
    let bitmap = header.get_u32();

    let mut payload = BytesMut::from(encoded);
    decode_in_place(bitmap, &mut payload)?;

    let actual = crc16_xmodem(&payload);
    if actual != checksum {
        warn!(
            expected = format_args!("0x{checksum:04X}"),
            actual = format_args!("0x{actual:04X}"),
            "checksum mismatch"
        );
        return Err(FrameError::ChecksumMismatch {
            expected: checksum,
            actual,
        });
    }

    Ok(Frame {
        checksum,
        bitmap,
        payload: payload.freeze(),
    })
}

/// Parse a complete wire frame, delimiters included.
pub fn parse_wire_frame(wire: &[u8]) -> Result<Frame> {
    match wire {
        [SENTINEL, body @ .., SENTINEL] => parse_frame_body(body),
        _ => Err(FrameError::Malformed {
            len: wire.len(),
            min: MIN_FRAME_SIZE,
        }),
    }
}
