//! Bitmap-driven sentinel substitution.
//!
//! Every sentinel byte inside a payload is overwritten with [`REPLACEMENT`]
//! and its position is recorded in a 32-bit bitmap that travels in the frame
//! header. Length never changes, and on decode only the bitmap is
//! authoritative: a replacement byte with a clear bit is ordinary data.

use bytes::{BufMut, BytesMut};

use crate::codec::MAX_PAYLOAD;
use crate::error::{FrameError, Result};
use upacket_transport::SENTINEL;

/// Byte written in place of a sentinel inside the payload (`+`).
pub const REPLACEMENT: u8 = 0x2B;

fn check_len(len: usize) -> Result<()> {
    if len > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: MAX_PAYLOAD,
        });
    }
    Ok(())
}

/// Append the encoded form of `payload` to `dst` and return its bitmap.
pub fn encode_into(payload: &[u8], dst: &mut BytesMut) -> Result<u32> {
    check_len(payload.len())?;
    dst.reserve(payload.len());

    let mut bitmap = 0u32;
    for (i, &byte) in payload.iter().enumerate() {
        if byte == SENTINEL {
            bitmap |= 1 << i;
            dst.put_u8(REPLACEMENT);
        } else {
            dst.put_u8(byte);
        }
    }
    Ok(bitmap)
}

/// Encode a payload, returning `(bitmap, encoded bytes)`.
pub fn encode(payload: &[u8]) -> Result<(u32, BytesMut)> {
    let mut encoded = BytesMut::with_capacity(payload.len());
    let bitmap = encode_into(payload, &mut encoded)?;
    Ok((bitmap, encoded))
}

/// Restore sentinels at every flagged position of `buf`.
pub fn decode_in_place(bitmap: u32, buf: &mut [u8]) -> Result<()> {
    check_len(buf.len())?;
    for (i, byte) in buf.iter_mut().enumerate() {
        if bitmap & (1 << i) != 0 {
            *byte = SENTINEL;
        }
    }
    Ok(())
}

/// Decode an encoded payload using its bitmap.
pub fn decode(bitmap: u32, encoded: &[u8]) -> Result<BytesMut> {
    let mut payload = BytesMut::from(encoded);
    decode_in_place(bitmap, &mut payload)?;
    Ok(payload)
}
