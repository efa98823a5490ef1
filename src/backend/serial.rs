//! Serial port transport
//!
//! Wraps a `serialport` handle. Reads use a short timeout so the read loop can
//! observe cancellation between reads; a timeout is reported as
//! [`ReadOutcome::Idle`] rather than an error.

use std::io::{ErrorKind, Read, Write};

use serialport::{SerialPort, SerialPortType};

use crate::config::SerialConfig;
use crate::error::{Result, ResultExt, VibError};

use super::transport::{ReadOutcome, Transport};

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

impl std::fmt::Display for PortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.description)
    }
}

/// List serial ports present on the system
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| {
            let description = match p.port_type {
                SerialPortType::UsbPort(usb) => match usb.product {
                    Some(product) => format!("USB {:04x}:{:04x} {}", usb.vid, usb.pid, product),
                    None => format!("USB {:04x}:{:04x}", usb.vid, usb.pid),
                },
                SerialPortType::PciPort => "PCI".to_string(),
                SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                SerialPortType::Unknown => "Unknown".to_string(),
            };
            PortInfo {
                name: p.port_name,
                description,
            }
        })
        .collect())
}

/// Serial link to the sensor
pub struct SerialTransport {
    name: String,
    port: Option<Box<dyn SerialPort>>,
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl SerialTransport {
    /// Open the configured port
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let name = config
            .port_name
            .clone()
            .ok_or_else(|| VibError::Config("No serial port configured".to_string()))?;

        let port = serialport::new(&name, config.baud_rate)
            .timeout(config.read_timeout())
            .open()
            .map_err(VibError::from)
            .with_context(|| format!("Failed to open {}", name))?;

        tracing::info!("Opened {} at {} baud", name, config.baud_rate);

        Ok(Self {
            name,
            port: Some(port),
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| VibError::Transport(format!("{} is closed", self.name)))
    }
}

impl Transport for SerialTransport {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port_mut()?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        let port = self.port_mut()?;
        match port.read(buf) {
            Ok(0) => Ok(ReadOutcome::Idle),
            Ok(n) => Ok(ReadOutcome::Data(n)),
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Ok(ReadOutcome::Idle)
            }
            Err(e) if e.kind() == ErrorKind::BrokenPipe || e.kind() == ErrorKind::UnexpectedEof => {
                Ok(ReadOutcome::Closed)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn try_clone_reader(&self) -> Result<Box<dyn Transport>> {
        let port = self
            .port
            .as_ref()
            .ok_or_else(|| VibError::Transport(format!("{} is closed", self.name)))?;
        Ok(Box::new(SerialTransport {
            name: self.name.clone(),
            port: Some(
                port.try_clone()
                    .map_err(VibError::from)
                    .context("Failed to clone read handle")?,
            ),
        }))
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::debug!("Closed {}", self.name);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}
