//! Serial link traits
//!
//! This module provides the seam between the [`Transport`](super::Transport)
//! and an actual device, so the real `serialport` backend and the in-memory
//! mock device can be used interchangeably.
//!
//! An open device is split into a reader half and a writer half. The
//! transport keeps them behind separate locks, which lets the foreground
//! write while the background reader is blocked in `read_line`.

use crate::error::Result;
use crate::types::PortInfo;
use std::time::Duration;

/// Parameters for opening a device
///
/// Framing is always 8 data bits, no parity, 1 stop bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSettings {
    /// Device path or name
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Upper bound on a single blocking read
    pub read_timeout: Duration,
}

/// Receiving half of an open device
pub trait SerialReader: Send {
    /// Number of bytes that can be read without blocking
    fn bytes_to_read(&mut self) -> Result<usize>;

    /// Read one record up to and including `\n`
    ///
    /// Blocks for at most the configured read timeout. On timeout the bytes
    /// received so far are returned, which may be an empty or partial line.
    fn read_line(&mut self) -> Result<Vec<u8>>;
}

/// Sending half of an open device
pub trait SerialWriter: Send {
    /// Write all bytes and flush
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;
}

/// An opened device, split into its two halves
pub struct SerialConnection {
    pub reader: Box<dyn SerialReader>,
    pub writer: Box<dyn SerialWriter>,
}

/// Opens devices by name and enumerates the ones available
pub trait PortOpener: Send + Sync {
    /// Open a device
    ///
    /// Fails with a connection error when the device does not exist, access
    /// is denied, it is already in use, or the driver rejects the settings.
    fn open(&self, settings: &PortSettings) -> Result<SerialConnection>;

    /// List the devices this opener can open
    fn list_ports(&self) -> Vec<PortInfo>;
}
