use bytes::BytesMut;
use upacket_frame::{assemble_frame, Frame, MAX_FRAME_SIZE};

use crate::cmd::{resolve_payload, EncodeArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(args.data.as_deref(), args.hex.as_deref(), None)?;
    let (frame, wire) = encode(payload).map_err(|err| frame_error("encode failed", err))?;
    print_frame(&frame, &wire, &wire, format);
    Ok(SUCCESS)
}

fn encode(payload: Vec<u8>) -> upacket_frame::Result<(Frame, BytesMut)> {
    let mut wire = BytesMut::with_capacity(MAX_FRAME_SIZE);
    assemble_frame(&payload, &mut wire)?;
    let frame = Frame::new(payload)?;
    Ok((frame, wire))
}

#[cfg(test)]
mod tests {
    use super::*;
    use upacket_frame::FrameError;

    #[test]
    fn encodes_concrete_vector() {
        let (frame, wire) = encode(vec![0x01, 0x02]).expect("payload should encode");
        assert_eq!(frame.checksum, 0x1373);
        assert_eq!(frame.bitmap, 0);
        assert_eq!(wire.as_ref(), &[0x7C, 0x13, 0x73, 0, 0, 0, 0, 0x01, 0x02, 0x7C]);
    }

    #[test]
    fn rejects_oversized_payload() {
        let err = encode(vec![0u8; 33]).expect_err("33 bytes should not fit");
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 33, max: 32 }));
        assert_eq!(frame_error("encode failed", err).code, crate::exit::DATA_INVALID);
    }
}
