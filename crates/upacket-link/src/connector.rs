use std::thread;

use tracing::{debug, info};
use upacket_transport::{SerialLine, SocketTransport, StreamTransport, Transport};

use crate::config::LinkConfig;
use crate::error::Result;
use crate::link::Link;

/// Connect to a peer listening on `addr` (`host:port`).
pub fn connect(addr: &str) -> Result<Link> {
    connect_with_config(addr, LinkConfig::default())
}

/// Connect with explicit configuration.
///
/// The attempt is bounded by [`LinkConfig::connect_timeout`]; every later
/// read and write by [`LinkConfig::timeout`].
pub fn connect_with_config(addr: &str, config: LinkConfig) -> Result<Link> {
    let transport =
        SocketTransport::connect(addr, config.connect_timeout, config.transport_config())?;
    let peer_addr = transport.peer_addr();
    Ok(Link::from_transport(transport, config).with_peer_addr(peer_addr))
}

/// Open a link over an already configured serial line.
pub fn open_serial<L: SerialLine + 'static>(line: L) -> Result<Link> {
    open_serial_with_config(line, LinkConfig::default())
}

/// Open a serial link with explicit configuration.
///
/// Waits [`LinkConfig::reset_wait`] for the peer to come out of reset, then
/// drops any boot output when [`LinkConfig::flush_on_connect`] is set.
pub fn open_serial_with_config<L: SerialLine + 'static>(
    line: L,
    config: LinkConfig,
) -> Result<Link> {
    let mut transport = StreamTransport::with_config(line, config.transport_config());

    if !config.reset_wait.is_zero() {
        debug!(wait = ?config.reset_wait, "waiting for peer reset");
        thread::sleep(config.reset_wait);
    }
    if config.flush_on_connect {
        let dropped = transport.discard_input()?;
        debug!(dropped, "flushed input after open");
    }

    info!("serial link open");
    Ok(Link::from_transport(transport, config))
}

/// Open the serial device at `path` and wrap it in a link.
#[cfg(feature = "serial")]
pub fn open_port_with_config(path: &str, baud: u32, config: LinkConfig) -> Result<Link> {
    let port = upacket_transport::open_port(path, baud, config.timeout)?;
    open_serial_with_config(port, config)
}

/// Open the first USB serial device with product id `pid`.
#[cfg(feature = "serial")]
pub fn open_usb_pid_with_config(pid: u16, baud: u32, config: LinkConfig) -> Result<Link> {
    let path = upacket_transport::find_port_by_pid(pid)?;
    debug!(pid = format_args!("0x{pid:04X}"), %path, "resolved USB product id");
    open_port_with_config(&path, baud, config)
}
