//! # SerialVis-RS: Serial Monitor and Live Plotter
//!
//! A desktop tool that connects to a microcontroller over a serial link,
//! shows the incoming line-delimited text, sends commands, and plots
//! selected tab-separated numeric columns in real time.
//!
//! ## Architecture
//!
//! - **Backend**: Owns the serial connection and runs the reader loop in a
//!   separate thread
//! - **Pipeline**: Queue, line parser, series store, and the drain/update
//!   cycle that ties them together
//! - **Controller**: Maps user actions (connect, send, reconfigure, reset)
//!   onto the core
//! - **Frontend**: Renders the UI using eframe/egui with egui_plot for graphs
//! - **Communication**: Crossbeam channels for thread-safe data transfer
//!
//! ## Configuration
//!
//! Files are stored in the platform-appropriate data directory under
//! `dev.serialvis.serialvis-rs`:
//!
//! - `config.json`: plot columns, baud rate, and permanent commands
//! - `settings.toml`: timeouts, poll intervals, and UI options
//! - `logs/`: daily rolling log files
//!
//! ## Example
//!
//! ```ignore
//! use serialvis_rs::{
//!     backend::{AppPortOpener, SerialBackend, Transport},
//!     config::AppConfig,
//!     pipeline::{DisplayLog, SharedPlotState, UpdateCycle},
//!     config::PlotConfiguration,
//! };
//! use std::sync::Arc;
//!
//! let config = AppConfig::default();
//! let transport = Arc::new(Transport::new(Arc::new(AppPortOpener::new()), &config.serial));
//! let plot = SharedPlotState::new(PlotConfiguration::new(Some(0), vec![1, 2]));
//!
//! let (backend, lines) = SerialBackend::new(transport.clone(), &config.collection);
//! let reader = backend.start()?;
//! let mut cycle = UpdateCycle::new(lines, plot.clone(), config.collection.drain_interval());
//!
//! transport.connect("mock://loopback", 19200)?;
//! transport.write(b"12.5\t7\t-3.2\n")?;
//! ```

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod frontend;
pub mod pipeline;
pub mod types;

// Re-export commonly used types
pub use backend::{AppPortOpener, ReaderHandle, SerialBackend, Transport};
pub use config::{AppConfig, PersistedConfig, PlotConfiguration};
pub use controller::SessionController;
pub use error::{Result, SerialVisError};
pub use frontend::SerialVisApp;
pub use pipeline::{SeriesStore, SharedPlotState, UpdateCycle};
