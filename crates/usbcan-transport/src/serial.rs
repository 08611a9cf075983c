use std::time::Duration;

use serialport::{SerialPort, SerialPortType};
use tracing::{debug, info};

use crate::discovery::{DeviceSelector, PortInfo, PortLister};
use crate::error::{Result, TransportError};
use crate::traits::IoChannel;

/// A byte channel over an open serial port. The port closes when dropped.
pub type SerialChannel = IoChannel<Box<dyn SerialPort>>;

/// Serial port settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line rate. USB CDC adapters ignore it, but the host driver requires one.
    pub baud_rate: u32,
    /// Port-level read timeout; each expiry is one poll tick of the channel.
    pub poll_interval: Duration,
    /// Overall bound on a single `read_exact`. `None` blocks forever.
    pub read_timeout: Option<Duration>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            poll_interval: Duration::from_millis(100),
            read_timeout: None,
        }
    }
}

/// Lists ports through the host's serial subsystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialPortLister;

impl PortLister for SerialPortLister {
    fn list_ports(&self) -> Result<Vec<PortInfo>> {
        let ports = serialport::available_ports()
            .map_err(|err| TransportError::Enumerate(err.to_string()))?;

        Ok(ports
            .into_iter()
            .map(|port| {
                let description = match port.port_type {
                    SerialPortType::UsbPort(usb) => usb.product.or(usb.manufacturer),
                    _ => None,
                };
                PortInfo {
                    name: port.port_name,
                    description,
                }
            })
            .collect())
    }
}

/// Open a serial port by OS device name.
pub fn open_serial(port_name: &str, config: &SerialConfig) -> Result<SerialChannel> {
    let port = serialport::new(port_name, config.baud_rate)
        .timeout(config.poll_interval)
        .open()
        .map_err(|err| TransportError::Open {
            port: port_name.to_string(),
            message: err.to_string(),
        })?;

    info!(port = port_name, baud = config.baud_rate, "opened serial port");
    Ok(IoChannel::with_read_timeout(port, config.read_timeout))
}

/// Find the adapter matching `selector` and open it.
pub fn discover_serial(selector: &DeviceSelector, config: &SerialConfig) -> Result<SerialChannel> {
    let port = selector.select(&SerialPortLister)?;
    debug!(port = %port.name, description = ?port.description, "selected serial port");
    open_serial(&port.name, config)
}
