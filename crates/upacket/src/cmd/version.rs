use upacket_frame::{MAX_FRAME_SIZE, MAX_PAYLOAD, REPLACEMENT, SENTINEL};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("upacket {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: upacket");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("UPACKET_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("UPACKET_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "features: link={}, serial={}, cli=true",
        cfg!(feature = "link"),
        cfg!(feature = "serial")
    );
    println!(
        "protocol: sentinel=0x{SENTINEL:02X}, replacement=0x{REPLACEMENT:02X}, \
         max_payload={MAX_PAYLOAD}, max_frame={MAX_FRAME_SIZE}, checksum=crc16-xmodem"
    );

    Ok(SUCCESS)
}
