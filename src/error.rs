//! Error handling for the SerialVis-RS application
//!
//! This module defines custom error types and a Result alias for use
//! throughout the application.

use thiserror::Error;

/// Main error type for SerialVis-RS operations
#[derive(Error, Debug)]
pub enum SerialVisError {
    /// The serial device could not be opened (not found, permission denied,
    /// already in use, or a driver-level failure)
    #[error("Connection error on {port}: {message}")]
    Connection { port: String, message: String },

    /// A received line was not valid text
    #[error("Decode error: {0}")]
    Decode(String),

    /// User-entered plot configuration was rejected
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration file error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SerialVisError>,
    },
}

/// Per-column extraction failure for a single line
///
/// These never abort a line: the parser collects them as issues and the
/// remaining columns are still extracted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The configured column index is past the end of the field list
    #[error("column {column} out of range (line has {field_count} fields)")]
    ColumnOutOfRange { column: usize, field_count: usize },

    /// The field exists but contains no decimal number
    #[error("column {column} contains no number")]
    NoNumber { column: usize },
}

impl SerialVisError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SerialVisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Build a connection error for the given port
    pub fn connection(port: impl Into<String>, message: impl std::fmt::Display) -> Self {
        SerialVisError::Connection {
            port: port.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error (or the error it wraps) is a connection failure
    pub fn is_connection_error(&self) -> bool {
        match self {
            SerialVisError::Connection { .. } => true,
            SerialVisError::WithContext { source, .. } => source.is_connection_error(),
            _ => false,
        }
    }
}

/// Serialport errors do not know the port name; [`Transport`](crate::backend::Transport)
/// fills it in when a connect fails
impl From<serialport::Error> for SerialVisError {
    fn from(err: serialport::Error) -> Self {
        SerialVisError::Connection {
            port: String::new(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for SerialVis-RS operations
pub type Result<T> = std::result::Result<T, SerialVisError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SerialVisError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| SerialVisError::Io(e).with_context(f()))
    }
}
