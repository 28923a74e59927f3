//! Mock Serial Device for Testing
//!
//! This module provides an in-memory serial device that can be used for
//! testing the pipeline without hardware, and as a demo port in the UI.
//!
//! # Features
//!
//! - **Scripted input**: Queue lines or raw bytes for the reader to receive
//! - **Write capture**: Inspect everything the transport wrote
//! - **Loopback**: Optionally echo written bytes back as received data
//! - **Missing devices**: Opening an unregistered name fails like a real
//!   missing device
//! - **Read failures**: Make the next read fail with an I/O error
//!
//! # Example
//!
//! ```ignore
//! use serialvis_rs::backend::mock_port::{MockDevice, MockPortOpener};
//!
//! let device = MockDevice::new();
//! let opener = MockPortOpener::new().with_device("mock://board", device.clone());
//!
//! device.feed_line("12.5\t7\t-3.2");
//! // ... connect a Transport to "mock://board" and read
//! assert_eq!(device.written_text(), "status\n");
//! ```

use super::link::{PortOpener, PortSettings, SerialConnection, SerialReader, SerialWriter};
use crate::error::{Result, SerialVisError};
use crate::types::PortInfo;
use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Name of the loopback device registered by [`MockPortOpener::new`]
pub const MOCK_LOOPBACK_PORT: &str = "mock://loopback";

/// Prefix that routes a port name to the mock opener
pub const MOCK_PORT_PREFIX: &str = "mock://";

#[derive(Debug, Default)]
struct MockDeviceState {
    incoming: VecDeque<u8>,
    written: Vec<u8>,
    loopback: bool,
    open_count: u32,
    failing_reads: u32,
}

/// Shared handle to an in-memory device
///
/// Clones refer to the same device, so a test can keep one handle while
/// the transport owns the opened halves.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockDevice {
    /// Create a new device with no pending input
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device that echoes every write back as input
    pub fn loopback() -> Self {
        let device = Self::new();
        device.lock().loopback = true;
        device
    }

    fn lock(&self) -> MutexGuard<'_, MockDeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue raw bytes for the reader
    pub fn feed_bytes(&self, bytes: &[u8]) {
        self.lock().incoming.extend(bytes.iter().copied());
    }

    /// Queue a line for the reader, adding `\n` if it has none
    pub fn feed_line(&self, line: &str) {
        let mut state = self.lock();
        state.incoming.extend(line.bytes());
        if !line.ends_with('\n') {
            state.incoming.push_back(b'\n');
        }
    }

    /// Number of bytes not yet read
    pub fn pending_input(&self) -> usize {
        self.lock().incoming.len()
    }

    /// Everything written to the device so far
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Everything written so far, as lossy UTF-8
    pub fn written_text(&self) -> String {
        String::from_utf8_lossy(&self.lock().written).into_owned()
    }

    /// Take and clear the captured writes
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.lock().written)
    }

    /// How many times the device has been opened
    pub fn open_count(&self) -> u32 {
        self.lock().open_count
    }

    /// Make the next `read_line` fail without consuming any input
    pub fn fail_next_read(&self) {
        self.lock().failing_reads += 1;
    }
}

struct MockReader {
    device: MockDevice,
}

impl SerialReader for MockReader {
    fn bytes_to_read(&mut self) -> Result<usize> {
        Ok(self.device.pending_input())
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut state = self.device.lock();
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(SerialVisError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock device read failure",
            )));
        }
        // Without a terminator this behaves like a timed-out read
        let end = state
            .incoming
            .iter()
            .position(|&b| b == b'\n')
            .map(|pos| pos + 1)
            .unwrap_or(state.incoming.len());
        Ok(state.incoming.drain(..end).collect())
    }
}

struct MockWriter {
    device: MockDevice,
}

impl SerialWriter for MockWriter {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.device.lock();
        state.written.extend_from_slice(bytes);
        if state.loopback {
            state.incoming.extend(bytes.iter().copied());
        }
        Ok(())
    }
}

/// Opens registered mock devices by name
#[derive(Debug, Clone)]
pub struct MockPortOpener {
    devices: BTreeMap<String, MockDevice>,
}

impl Default for MockPortOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPortOpener {
    /// Create an opener with the loopback device registered
    pub fn new() -> Self {
        Self::empty().with_device(MOCK_LOOPBACK_PORT, MockDevice::loopback())
    }

    /// Create an opener with no devices
    pub fn empty() -> Self {
        Self {
            devices: BTreeMap::new(),
        }
    }

    /// Register a device under a name
    pub fn with_device(mut self, name: impl Into<String>, device: MockDevice) -> Self {
        self.devices.insert(name.into(), device);
        self
    }

    /// Get a registered device
    pub fn device(&self, name: &str) -> Option<MockDevice> {
        self.devices.get(name).cloned()
    }
}

impl PortOpener for MockPortOpener {
    fn open(&self, settings: &PortSettings) -> Result<SerialConnection> {
        let device = self.devices.get(&settings.port).ok_or_else(|| {
            SerialVisError::connection(&settings.port, "No such device")
        })?;
        device.lock().open_count += 1;

        Ok(SerialConnection {
            reader: Box::new(MockReader {
                device: device.clone(),
            }),
            writer: Box::new(MockWriter {
                device: device.clone(),
            }),
        })
    }

    fn list_ports(&self) -> Vec<PortInfo> {
        self.devices
            .keys()
            .map(|name| PortInfo {
                name: name.clone(),
                description: "Mock device".to_string(),
            })
            .collect()
    }
}
