//! Core data types shared between the backend and the frontend
//!
//! # Main Types
//!
//! - [`RawLine`] - One decoded line as pulled from the serial link
//! - [`ConnectionStatus`] - State of the serial connection
//! - [`PortInfo`] - A serial device found during enumeration
//! - [`ReaderStats`] / [`CycleStats`] - Counters for the status bar

use std::time::Instant;

/// One newline-delimited record received from the device
///
/// Lines are queued in arrival order and consumed exactly once. The
/// sequence number is assigned by the reader and increases by one per
/// queued line, which makes ordering observable in tests and logs.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    /// Arrival sequence number (starts at 0 for each reader)
    pub sequence: u64,
    /// Decoded text, including the trailing newline if one was received
    pub text: String,
    /// When the reader pulled the line off the link
    pub received_at: Instant,
}

impl RawLine {
    /// Create a new line stamped with the current time
    pub fn new(sequence: u64, text: impl Into<String>) -> Self {
        Self {
            sequence,
            text: text.into(),
            received_at: Instant::now(),
        }
    }

    /// The line text without its trailing line terminator
    pub fn trimmed(&self) -> &str {
        self.text.trim_end_matches(['\r', '\n'])
    }
}

/// Connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No device open
    #[default]
    Disconnected,
    /// Opening the device / waiting for it to settle
    Connecting,
    /// Device open and ready
    Connected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting..."),
            ConnectionStatus::Connected => write!(f, "Connected"),
        }
    }
}

/// A serial device found during port enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device path or name passed to connect (e.g. `/dev/ttyUSB0`, `COM3`)
    pub name: String,
    /// Human-readable description (USB product, "PCI", ...)
    pub description: String,
}

impl std::fmt::Display for PortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.description)
        }
    }
}

/// Counters maintained by the reader loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Lines decoded and queued
    pub lines_read: u64,
    /// Lines dropped because they were not valid text
    pub decode_errors: u64,
    /// Reads that failed at the device level
    pub read_errors: u64,
    /// Bytes received, including dropped lines
    pub bytes_read: u64,
}

/// Counters maintained by the drain/update cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Number of times the cycle ran
    pub ticks: u64,
    /// Lines taken off the queue and appended to the series
    pub lines_processed: u64,
    /// Column values that could not be extracted
    pub parse_issues: u64,
    /// Redraw requests sent to a visible renderer
    pub redraws: u64,
}
