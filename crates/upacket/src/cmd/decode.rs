use upacket_frame::parse_wire_frame;

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = parse_hex(&args.frame)?;
    let frame = parse_wire_frame(&wire).map_err(|err| frame_error("decode failed", err))?;
    print_frame(&frame, &wire, frame.payload.as_ref(), format);
    Ok(SUCCESS)
}
