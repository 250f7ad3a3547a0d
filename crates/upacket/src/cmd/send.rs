use std::time::Duration;

use upacket_frame::{FrameError, MAX_PAYLOAD};
use upacket_link::{
    connect_with_config, open_port_with_config, open_usb_pid_with_config, Link, LinkConfig,
};

use crate::cmd::{parse_duration, resolve_payload, SendArgs};
use crate::exit::{frame_error, link_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_received, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let connect_timeout = parse_duration(&args.connect_timeout)?;

    let payload = resolve_payload(args.data.as_deref(), args.hex.as_deref(), args.file.as_ref())?;
    check_payload_size(&payload).map_err(|err| frame_error("send failed", err))?;

    let mut config = LinkConfig::default()
        .with_timeout(timeout)
        .with_connect_timeout(connect_timeout);
    if args.no_reset_wait {
        config = config.with_reset_wait(Duration::ZERO);
    }
    let (mut link, peer) = open_link(&args, config)?;

    link.send(&payload)
        .map_err(|err| link_error("send failed", err))?;

    if args.wait {
        let reply = link
            .recv()
            .map_err(|err| link_error("receive failed", err))?;
        print_received(&reply, &peer, format);
    }

    if let Err(err) = link.close() {
        tracing::debug!(error = %err, "close failed");
    }
    Ok(SUCCESS)
}

/// Open whichever target was named, returning the link and a label for it.
fn open_link(args: &SendArgs, config: LinkConfig) -> CliResult<(Link, String)> {
    if let Some(path) = &args.serial {
        let link = open_port_with_config(path, args.baud, config)
            .map_err(|err| link_error("open failed", err))?;
        return Ok((link, path.clone()));
    }
    if let Some(pid) = args.pid {
        let link = open_usb_pid_with_config(pid, args.baud, config)
            .map_err(|err| link_error("open failed", err))?;
        return Ok((link, format!("usb:{pid:04x}")));
    }

    let addr = args
        .addr
        .as_deref()
        .ok_or_else(|| CliError::new(USAGE, "no peer address or serial device given"))?;
    let link =
        connect_with_config(addr, config).map_err(|err| link_error("connect failed", err))?;
    Ok((link, addr.to_string()))
}

/// Reject payloads that cannot be framed before a connection is opened.
fn check_payload_size(payload: &[u8]) -> upacket_frame::Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_size_limit() {
        assert!(check_payload_size(&[0u8; 32]).is_ok());
        assert!(check_payload_size(&[]).is_ok());
        assert!(matches!(
            check_payload_size(&[0u8; 33]),
            Err(FrameError::PayloadTooLarge { size: 33, max: 32 })
        ));
    }
}
