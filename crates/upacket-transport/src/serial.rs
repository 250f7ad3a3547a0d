//! Native serial ports through the `serialport` crate.
//!
//! An opened port is a [`SerialLine`]; wrap it in a
//! [`StreamTransport`](crate::StreamTransport) to exchange frames.

use std::time::Duration;

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::SerialLine;

/// An opened native serial port.
pub type SerialPortLine = Box<dyn SerialPort>;

impl SerialLine for Box<dyn SerialPort> {
    fn bytes_to_read(&mut self) -> std::io::Result<usize> {
        let pending = SerialPort::bytes_to_read(&**self)?;
        Ok(pending as usize)
    }

    fn set_line_timeout(&mut self, timeout: Duration) -> std::io::Result<()> {
        SerialPort::set_timeout(&mut **self, timeout)?;
        Ok(())
    }
}

/// Open `path` at `baud` (8N1, no flow control).
pub fn open_port(path: &str, baud: u32, timeout: Duration) -> Result<SerialPortLine> {
    let port = serialport::new(path, baud)
        .timeout(timeout)
        .open()
        .map_err(|err| TransportError::Connect {
            addr: path.to_string(),
            source: err.into(),
        })?;
    info!(path, baud, "opened serial port");
    Ok(port)
}

/// Name of the first USB serial port whose product id is `pid`.
pub fn find_port_by_pid(pid: u16) -> Result<String> {
    let ports = serialport::available_ports().map_err(|err| TransportError::Connect {
        addr: format!("usb pid 0x{pid:04X}"),
        source: err.into(),
    })?;
    debug!(count = ports.len(), "enumerated serial ports");

    ports
        .into_iter()
        .find(|port| port_has_pid(port, pid))
        .map(|port| port.port_name)
        .ok_or(TransportError::PortNotFound { pid })
}

fn port_has_pid(port: &SerialPortInfo, pid: u16) -> bool {
    matches!(&port.port_type, SerialPortType::UsbPort(usb) if usb.pid == pid)
}
