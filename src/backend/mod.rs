//! Backend module for serial I/O
//!
//! This module owns the serial connection and runs the reader loop in a
//! separate thread to keep the UI responsive. Received lines reach the
//! foreground through the line queue in [`crate::pipeline::queue`].
//!
//! # Architecture
//!
//! - [`Transport`] - The one serial connection: connect, disconnect, write, read
//! - [`ReaderWorker`] - Background loop that drains the transport into the queue
//! - [`SerialBackend`] - Wires a transport to a new queue and spawns the worker
//! - [`ReaderHandle`] - Foreground handle for cooperative stop and statistics
//!
//! # Devices
//!
//! - [`SystemPortOpener`] - Real serial devices via the `serialport` crate
//! - [`MockPortOpener`] - In-memory devices for tests and the demo port
//! - [`AppPortOpener`] - Routes `mock://` names to the mock opener, the rest
//!   to the system
//!
//! # Example
//!
//! ```ignore
//! use serialvis_rs::backend::{AppPortOpener, SerialBackend, Transport};
//! use serialvis_rs::config::AppConfig;
//! use std::sync::Arc;
//!
//! let config = AppConfig::default();
//! let transport = Arc::new(Transport::new(Arc::new(AppPortOpener::new()), &config.serial));
//! let (backend, lines) = SerialBackend::new(transport.clone(), &config.collection);
//! let reader = backend.start()?;
//!
//! transport.connect("/dev/ttyUSB0", 19200)?;
//! for line in lines.drain() {
//!     println!("{}", line.trimmed());
//! }
//!
//! serialvis_rs::backend::shutdown(reader, &transport);
//! ```

pub mod link;
pub mod mock_port;
pub mod system_port;
pub mod transport;
pub mod worker;

pub use link::{PortOpener, PortSettings, SerialConnection, SerialReader, SerialWriter};
pub use mock_port::{MockDevice, MockPortOpener, MOCK_LOOPBACK_PORT, MOCK_PORT_PREFIX};
pub use system_port::{list_system_ports, SystemPortOpener};
pub use transport::{ConnectionInfo, Transport};
pub use worker::{decode_line, ReaderWorker};

use crate::config::CollectionConfig;
use crate::error::Result;
use crate::pipeline::queue::{data_queue, LineReceiver};
use crate::types::{PortInfo, ReaderStats};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// Opener used by the application: system ports plus the mock demo ports
#[derive(Debug, Clone, Default)]
pub struct AppPortOpener {
    system: SystemPortOpener,
    mock: MockPortOpener,
}

impl AppPortOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific mock opener for `mock://` names
    pub fn with_mock(mock: MockPortOpener) -> Self {
        Self {
            system: SystemPortOpener::new(),
            mock,
        }
    }
}

impl PortOpener for AppPortOpener {
    fn open(&self, settings: &PortSettings) -> Result<SerialConnection> {
        if settings.port.starts_with(MOCK_PORT_PREFIX) {
            self.mock.open(settings)
        } else {
            self.system.open(settings)
        }
    }

    fn list_ports(&self) -> Vec<PortInfo> {
        let mut ports = self.system.list_ports();
        ports.extend(self.mock.list_ports());
        ports
    }
}

/// The serial backend: a transport plus the reader that drains it
pub struct SerialBackend {
    /// Reader worker, not yet started
    worker: ReaderWorker,
    /// Running flag
    running: Arc<AtomicBool>,
}

impl SerialBackend {
    /// Create a backend and the queue its reader will feed
    pub fn new(transport: Arc<Transport>, config: &CollectionConfig) -> (Self, LineReceiver) {
        let (tx, rx) = data_queue();
        let running = Arc::new(AtomicBool::new(true));
        let worker = ReaderWorker::new(
            transport,
            tx,
            Arc::clone(&running),
            config.reader_poll_interval(),
        );
        (Self { worker, running }, rx)
    }

    /// Get a handle to stop the reader
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Spawn the reader thread
    pub fn start(self) -> std::io::Result<ReaderHandle> {
        let stats = self.worker.stats_handle();
        let worker = self.worker;
        let join = std::thread::Builder::new()
            .name("serial-reader".to_string())
            .spawn(move || worker.run())?;

        Ok(ReaderHandle {
            running: self.running,
            join: Some(join),
            stats,
        })
    }
}

/// Handle to the running reader thread
///
/// Dropping the handle stops and joins the thread.
pub struct ReaderHandle {
    running: Arc<AtomicBool>,
    join: Option<JoinHandle<ReaderStats>>,
    stats: Arc<Mutex<ReaderStats>>,
}

impl ReaderHandle {
    /// Signal cancellation and wait for the thread to exit
    pub fn stop(mut self) -> ReaderStats {
        self.stop_and_join()
    }

    /// Latest statistics published by the reader
    pub fn stats(&self) -> ReaderStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the reader loop is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self.join.as_ref().is_some_and(|j| !j.is_finished())
    }

    fn stop_and_join(&mut self) -> ReaderStats {
        self.running.store(false, Ordering::SeqCst);
        match self.join.take() {
            Some(join) => join.join().unwrap_or_else(|_| {
                tracing::error!("Reader thread panicked");
                self.stats()
            }),
            None => self.stats(),
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.stop_and_join();
        }
    }
}

/// Stop the reader, wait for it, then close the transport
///
/// Persisting configuration is left to the caller and should happen after
/// this returns.
pub fn shutdown(reader: ReaderHandle, transport: &Transport) -> ReaderStats {
    tracing::info!("Shutting down serial backend");
    let stats = reader.stop();
    transport.disconnect();
    stats
}
