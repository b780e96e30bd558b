use crate::config::SerialConfig;
use crate::error::ScannerError;
use crate::transport::{Connector, Link};
use serialport::{ClearBuffer, SerialPort};
use std::time::Duration;

/// Opens the scanner's serial port, once per (re)connect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialConnector {
    port_name: String,
    baud_rate: u32,
    timeout: Duration,
}

impl SerialConnector {
    pub fn new(port_name: &str, baud_rate: u32, timeout: Duration) -> SerialConnector {
        SerialConnector {
            port_name: port_name.to_string(),
            baud_rate,
            timeout,
        }
    }

    pub fn from_config(config: &SerialConfig) -> SerialConnector {
        SerialConnector::new(&config.port, config.baud_rate, config.read_timeout())
    }
}

impl Connector for SerialConnector {
    fn connect(&mut self) -> Result<Link, ScannerError> {
        let port = open_port(&self.port_name, self.baud_rate, self.timeout)?;
        let writer = port.try_clone()?;
        Ok(Link {
            reader: Box::new(port),
            writer: Box::new(writer),
        })
    }

    fn describe(&self) -> String {
        format!("{} at {} baud", self.port_name, self.baud_rate)
    }
}

pub(crate) fn open_port(
    port_name: &str,
    baud_rate: u32,
    timeout: Duration,
) -> Result<Box<dyn SerialPort>, ScannerError> {
    let port = serialport::new(port_name, baud_rate)
        .timeout(timeout)
        .open()?;
    // Bytes left over from a previous session would otherwise be framed
    // together with the first fresh line.
    flush(&*port)?;
    tracing::debug!("Opened serial port {} at {} baud", port_name, baud_rate);
    Ok(port)
}

pub(crate) fn flush(port: &dyn SerialPort) -> Result<(), ScannerError> {
    if port.bytes_to_read().unwrap_or(0) == 0 {
        return Ok(());
    }
    port.clear(ClearBuffer::Input)?;
    Ok(())
}
