//! Configuration module for SerialVis-RS
//!
//! This module handles application configuration including:
//! - The persisted session record (`config.json`): plot columns, baud rate
//!   and the permanent command slots
//! - Engineering settings (`settings.toml`): timeouts, poll cadence, log size
//! - The user-entered plot configuration ([`PlotConfiguration`])
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.serialvis.serialvis-rs/`
//! - **macOS**: `~/Library/Application Support/dev.serialvis.serialvis-rs/`
//! - **Windows**: `%APPDATA%\dev.serialvis.serialvis-rs\`
//!
//! # Files
//!
//! - `config.json` - Flat record read at startup and written on shutdown
//! - `settings.toml` - Optional, every key has a default
//! - `logs/` - Daily rolling log files
//!
//! # Example
//!
//! ```ignore
//! use serialvis_rs::config::{config_path, PersistedConfig};
//!
//! let path = config_path().unwrap();
//! let mut record = PersistedConfig::load_or_default(&path);
//! record.baudrate = 115_200;
//! record.save(&path)?;
//! ```

pub mod plot;

pub use plot::PlotConfiguration;

use crate::error::{Result, ResultExt, SerialVisError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.serialvis.serialvis-rs";

/// Persisted record filename
pub const CONFIG_FILE: &str = "config.json";

/// Settings filename
pub const SETTINGS_FILE: &str = "settings.toml";

/// Log directory name inside the app data directory
pub const LOG_DIR: &str = "logs";

/// Baud rate used when the record has none
pub const DEFAULT_BAUDRATE: u32 = 19200;

/// Number of permanent command slots
pub const PERMANENT_COMMAND_SLOTS: usize = 5;

/// Default read timeout for a single line in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Default delay after opening a port, for boards that reset on open
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;

/// Default reader poll cadence in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default drain/update cadence in milliseconds
pub const DEFAULT_DRAIN_INTERVAL_MS: u64 = 100;

/// Default number of entries kept in the display log
pub const DEFAULT_MAX_LOG_LINES: usize = 5000;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        SerialVisError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).context("Failed to create app data directory")?;
    }

    Ok(dir)
}

/// Get the path to the persisted record
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

/// Get the path to the settings file
pub fn settings_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(SETTINGS_FILE))
}

/// Get the log directory path
pub fn log_dir() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(LOG_DIR))
}

// ==================== Persisted Record ====================

/// The flat key/value record persisted between runs
///
/// Field names are part of the file format and must not be renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedConfig {
    /// Column used for the x axis, `null` for the running sample index
    #[serde(default)]
    pub x_column: Option<usize>,

    /// Columns plotted as y series, in legend order
    #[serde(default)]
    pub y_columns: Vec<usize>,

    /// Baud rate offered as the connect default
    #[serde(default = "default_baudrate")]
    pub baudrate: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_command_1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_command_2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_command_3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_command_4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_command_5: Option<String>,
}

fn default_baudrate() -> u32 {
    DEFAULT_BAUDRATE
}

impl Default for PersistedConfig {
    fn default() -> Self {
        Self {
            x_column: None,
            y_columns: Vec::new(),
            baudrate: DEFAULT_BAUDRATE,
            permanent_command_1: None,
            permanent_command_2: None,
            permanent_command_3: None,
            permanent_command_4: None,
            permanent_command_5: None,
        }
    }
}

impl PersistedConfig {
    /// Load the record from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SerialVisError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            SerialVisError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Load the record, returning defaults if the file is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config record, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the record to a file, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SerialVisError::Config(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SerialVisError::Serialization(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| {
            SerialVisError::Config(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    /// Get a permanent command by zero-based slot
    pub fn permanent_command(&self, slot: usize) -> Option<&str> {
        let value = match slot {
            0 => &self.permanent_command_1,
            1 => &self.permanent_command_2,
            2 => &self.permanent_command_3,
            3 => &self.permanent_command_4,
            4 => &self.permanent_command_5,
            _ => return None,
        };
        value.as_deref()
    }

    /// Set a permanent command by zero-based slot
    ///
    /// An empty command clears the slot. Out-of-range slots are ignored.
    pub fn set_permanent_command(&mut self, slot: usize, command: impl Into<String>) {
        let value = match slot {
            0 => &mut self.permanent_command_1,
            1 => &mut self.permanent_command_2,
            2 => &mut self.permanent_command_3,
            3 => &mut self.permanent_command_4,
            4 => &mut self.permanent_command_5,
            _ => return,
        };
        let command = command.into();
        *value = (!command.is_empty()).then_some(command);
    }

    /// All permanent command slots, empty strings for unset slots
    pub fn permanent_commands(&self) -> [String; PERMANENT_COMMAND_SLOTS] {
        std::array::from_fn(|slot| self.permanent_command(slot).unwrap_or_default().to_string())
    }

    /// The plot configuration stored in this record
    pub fn plot_configuration(&self) -> PlotConfiguration {
        PlotConfiguration::new(self.x_column, self.y_columns.clone())
    }

    /// Store a plot configuration in this record
    pub fn set_plot_configuration(&mut self, config: &PlotConfiguration) {
        self.x_column = config.x_column;
        self.y_columns = config.y_columns.clone();
    }
}

// ==================== Settings ====================

/// Engineering settings loaded from `settings.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Serial link settings
    #[serde(default)]
    pub serial: SerialConfig,

    /// Reader and drain cadence
    #[serde(default)]
    pub collection: CollectionConfig,

    /// Display settings
    #[serde(default)]
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SerialVisError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            SerialVisError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Load settings, returning defaults if the file is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save settings as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SerialVisError::Serialization(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| {
            SerialVisError::Config(format!(
                "Failed to write {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }
}

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Upper bound on a single `read_line` in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Wait after opening the port before it is used
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Terminator appended to sent commands
    #[serde(default)]
    pub line_ending: LineEnding,
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            line_ending: LineEnding::default(),
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Line terminator appended to outgoing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Send the command bytes verbatim
    None,
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// The terminator bytes
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::None => "",
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Append the terminator to a single-line command unless it already ends one
    pub fn terminate(&self, command: &str) -> String {
        if command.ends_with('\n') {
            command.to_string()
        } else {
            format!("{}{}", command, self.as_str())
        }
    }
}

impl std::fmt::Display for LineEnding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineEnding::None => write!(f, "None"),
            LineEnding::Lf => write!(f, "LF"),
            LineEnding::CrLf => write!(f, "CR+LF"),
        }
    }
}

/// Reader and drain cadence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Sleep between reader iterations in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub reader_poll_interval_ms: u64,

    /// Interval between drain/update ticks in milliseconds
    #[serde(default = "default_drain_interval_ms")]
    pub drain_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_drain_interval_ms() -> u64 {
    DEFAULT_DRAIN_INTERVAL_MS
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            reader_poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            drain_interval_ms: DEFAULT_DRAIN_INTERVAL_MS,
        }
    }
}

impl CollectionConfig {
    pub fn reader_poll_interval(&self) -> Duration {
        Duration::from_millis(self.reader_poll_interval_ms)
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }
}

/// Display settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Entries kept in the display log before the oldest are dropped
    #[serde(default = "default_max_log_lines")]
    pub max_log_lines: usize,

    /// Prefix log entries with the local receive time
    #[serde(default)]
    pub show_timestamps: bool,

    /// Echo sent commands into the log as `user > ...`
    #[serde(default = "default_true")]
    pub echo_commands: bool,
}

fn default_max_log_lines() -> usize {
    DEFAULT_MAX_LOG_LINES
}

fn default_true() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            max_log_lines: DEFAULT_MAX_LOG_LINES,
            show_timestamps: false,
            echo_commands: true,
        }
    }
}

// ==================== Tests ====================
