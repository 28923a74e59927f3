//! Serial devices via the `serialport` crate

use super::link::{PortOpener, PortSettings, SerialConnection, SerialReader, SerialWriter};
use crate::error::{Result, SerialVisError};
use crate::types::PortInfo;
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};
use std::io::{BufRead, BufReader, ErrorKind, Write};

/// Opens operating-system serial devices
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPortOpener;

impl SystemPortOpener {
    pub fn new() -> Self {
        Self
    }
}

impl PortOpener for SystemPortOpener {
    fn open(&self, settings: &PortSettings) -> Result<SerialConnection> {
        let port = serialport::new(&settings.port, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(settings.read_timeout)
            .open()?;

        // Errors from here on carry no port name; the transport adds it
        let writer = port.try_clone()?;

        Ok(SerialConnection {
            reader: Box::new(SystemPortReader {
                inner: BufReader::new(port),
            }),
            writer: Box::new(SystemPortWriter { port: writer }),
        })
    }

    fn list_ports(&self) -> Vec<PortInfo> {
        list_system_ports()
    }
}

/// Enumerate serial devices, returning an empty list if enumeration fails
pub fn list_system_ports() -> Vec<PortInfo> {
    match serialport::available_ports() {
        Ok(ports) => ports
            .into_iter()
            .map(|p| PortInfo {
                description: describe_port_type(&p.port_type),
                name: p.port_name,
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Serial port enumeration failed: {}", e);
            Vec::new()
        }
    }
}

fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(info) => info
            .product
            .clone()
            .or_else(|| info.manufacturer.clone())
            .unwrap_or_else(|| format!("USB {:04x}:{:04x}", info.vid, info.pid)),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => String::new(),
    }
}

struct SystemPortReader {
    inner: BufReader<Box<dyn SerialPort>>,
}

impl SerialReader for SystemPortReader {
    fn bytes_to_read(&mut self) -> Result<usize> {
        let pending = self
            .inner
            .get_ref()
            .bytes_to_read()
            .map_err(|e| SerialVisError::Io(e.into()))?;
        Ok(pending as usize + self.inner.buffer().len())
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        match self.inner.read_until(b'\n', &mut line) {
            Ok(_) => Ok(line),
            // read_until keeps what it consumed before the timeout
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(line),
            Err(e) => Err(SerialVisError::Io(e)),
        }
    }
}

struct SystemPortWriter {
    port: Box<dyn SerialPort>,
}

impl SerialWriter for SystemPortWriter {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }
}
