//! Transport: owner of the one serial connection
//!
//! At most one device is open at a time. The transport is shared behind an
//! `Arc` between the foreground (connect, disconnect, write) and the reader
//! thread (poll, read_line).
//!
//! # Locking
//!
//! - `lifecycle` serializes connect and disconnect
//! - `reader` is held by the reader thread for the duration of one `read_line`
//! - `writer` is independent, so a write never waits on a pending read
//! - `state` only guards the status snapshot and is never held across I/O
//!
//! `disconnect` never waits on `reader`. If a read is in flight, the reader
//! half is flagged and dropped by the reader thread once that read returns.

use super::link::{PortOpener, PortSettings, SerialReader, SerialWriter};
use crate::config::SerialConfig;
use crate::error::{Result, SerialVisError};
use crate::types::{ConnectionStatus, PortInfo};
use crossbeam_channel::{bounded, Receiver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Duration;

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Details of the open connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub port: String,
    pub baud_rate: u32,
}

#[derive(Debug, Default)]
struct TransportState {
    status: ConnectionStatus,
    connection: Option<ConnectionInfo>,
}

/// Owns the serial connection lifecycle
pub struct Transport {
    opener: Arc<dyn PortOpener>,
    read_timeout: Duration,
    settle_delay: Duration,
    lifecycle: Mutex<()>,
    reader: Mutex<Option<Box<dyn SerialReader>>>,
    reader_close_pending: AtomicBool,
    writer: Mutex<Option<Box<dyn SerialWriter>>>,
    state: Mutex<TransportState>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("read_timeout", &self.read_timeout)
            .field("settle_delay", &self.settle_delay)
            .field("status", &self.status())
            .finish()
    }
}

impl Transport {
    /// Create a transport using the configured timeout and settle delay
    pub fn new(opener: Arc<dyn PortOpener>, config: &SerialConfig) -> Self {
        Self::with_timing(opener, config.read_timeout(), config.settle_delay())
    }

    /// Create a transport with explicit timing
    pub fn with_timing(
        opener: Arc<dyn PortOpener>,
        read_timeout: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            opener,
            read_timeout,
            settle_delay,
            lifecycle: Mutex::new(()),
            reader: Mutex::new(None),
            reader_close_pending: AtomicBool::new(false),
            writer: Mutex::new(None),
            state: Mutex::new(TransportState::default()),
        }
    }

    /// Open a device with 8-N-1 framing
    ///
    /// Blocks for the settle delay after the device opens, since many
    /// USB-serial boards reset when the port is opened. An already open
    /// connection is closed first. On failure the transport stays
    /// disconnected; nothing is retried.
    pub fn connect(&self, port: &str, baud_rate: u32) -> Result<()> {
        let _guard = lock(&self.lifecycle);

        if self.is_connected() {
            tracing::info!("Closing current connection before opening {}", port);
            self.close_handles();
        }
        self.set_state(ConnectionStatus::Connecting, None);

        let settings = PortSettings {
            port: port.to_string(),
            baud_rate,
            read_timeout: self.read_timeout,
        };

        match self.opener.open(&settings) {
            Ok(connection) => {
                if !self.settle_delay.is_zero() {
                    std::thread::sleep(self.settle_delay);
                }
                {
                    let mut reader = lock(&self.reader);
                    self.reader_close_pending.store(false, Ordering::SeqCst);
                    *reader = Some(connection.reader);
                }
                *lock(&self.writer) = Some(connection.writer);
                self.set_state(
                    ConnectionStatus::Connected,
                    Some(ConnectionInfo {
                        port: port.to_string(),
                        baud_rate,
                    }),
                );
                tracing::info!("Connected to {} at {} baud", port, baud_rate);
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionStatus::Disconnected, None);
                tracing::error!("Failed to connect to {}: {}", port, e);
                Err(match e {
                    SerialVisError::Connection { port: p, message } if p.is_empty() => {
                        SerialVisError::Connection {
                            port: port.to_string(),
                            message,
                        }
                    }
                    other => other,
                })
            }
        }
    }

    /// Run [`connect`](Self::connect) on a helper thread
    ///
    /// The returned channel yields exactly one result. Use this from a UI
    /// thread so the settle delay does not stall rendering.
    pub fn connect_in_background(self: &Arc<Self>, port: String, baud_rate: u32) -> Receiver<Result<()>> {
        let (tx, rx) = bounded(1);
        let transport = Arc::clone(self);
        let spawned = std::thread::Builder::new()
            .name("serial-connect".to_string())
            .spawn(move || {
                let _ = tx.send(transport.connect(&port, baud_rate));
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn connect thread: {}", e);
            let (tx, rx) = bounded(1);
            let _ = tx.send(Err(SerialVisError::Io(e)));
            return rx;
        }
        rx
    }

    /// Close the connection; does nothing if already closed
    ///
    /// Returns without waiting for a read in progress on the reader thread.
    pub fn disconnect(&self) {
        let _guard = lock(&self.lifecycle);
        let was_connected = self.is_connected();
        lock(&self.writer).take();
        match self.reader.try_lock() {
            Ok(mut reader) => {
                reader.take();
            }
            Err(TryLockError::Poisoned(poisoned)) => {
                poisoned.into_inner().take();
            }
            Err(TryLockError::WouldBlock) => {
                self.reader_close_pending.store(true, Ordering::SeqCst);
            }
        }
        self.set_state(ConnectionStatus::Disconnected, None);
        if was_connected {
            tracing::info!("Disconnected");
        }
    }

    /// Send bytes to the device
    ///
    /// Returns `Ok(false)` without error when no device is open: the bytes
    /// are dropped.
    pub fn write(&self, bytes: &[u8]) -> Result<bool> {
        let mut writer = lock(&self.writer);
        match writer.as_mut() {
            Some(w) => {
                w.write_bytes(bytes)?;
                tracing::trace!("Wrote {} bytes", bytes.len());
                Ok(true)
            }
            None => {
                tracing::debug!("Dropping {} bytes, not connected", bytes.len());
                Ok(false)
            }
        }
    }

    /// Bytes ready to read without blocking; 0 when idle or disconnected
    pub fn poll_available(&self) -> usize {
        let mut reader = self.lock_reader();
        match reader.as_mut() {
            Some(r) => r.bytes_to_read().unwrap_or_else(|e| {
                tracing::warn!("Failed to query pending bytes: {}", e);
                0
            }),
            None => 0,
        }
    }

    /// Read one newline-terminated record, bounded by the read timeout
    ///
    /// Returns `Ok(None)` when no device is open.
    pub fn read_line(&self) -> Result<Option<Vec<u8>>> {
        let mut reader = self.lock_reader();
        let result = match reader.as_mut() {
            Some(r) => r.read_line().map(Some),
            None => Ok(None),
        };
        if self.reader_close_pending.swap(false, Ordering::SeqCst) {
            reader.take();
            tracing::debug!("Closed reader after in-flight read");
        }
        result
    }

    /// Whether a device is open
    pub fn is_connected(&self) -> bool {
        lock(&self.state).status == ConnectionStatus::Connected
    }

    /// Current connection status
    pub fn status(&self) -> ConnectionStatus {
        lock(&self.state).status
    }

    /// Port and baud rate of the open connection
    pub fn connection_info(&self) -> Option<ConnectionInfo> {
        lock(&self.state).connection.clone()
    }

    /// Devices the opener can see
    pub fn list_ports(&self) -> Vec<PortInfo> {
        self.opener.list_ports()
    }

    /// Lock the reader half, dropping it first if a disconnect flagged it
    fn lock_reader(&self) -> MutexGuard<'_, Option<Box<dyn SerialReader>>> {
        let mut reader = lock(&self.reader);
        if self.reader_close_pending.swap(false, Ordering::SeqCst) {
            reader.take();
        }
        reader
    }

    fn close_handles(&self) {
        lock(&self.writer).take();
        lock(&self.reader).take();
    }

    fn set_state(&self, status: ConnectionStatus, connection: Option<ConnectionInfo>) {
        let mut state = lock(&self.state);
        state.status = status;
        state.connection = connection;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::link::SerialConnection;
    use crate::backend::mock_port::{MockDevice, MockPortOpener};
    use crossbeam_channel::Sender;

    /// Reader whose `read_line` blocks until the test releases it
    struct GatedReader {
        entered: Sender<()>,
        release: Receiver<()>,
    }

    impl SerialReader for GatedReader {
        fn bytes_to_read(&mut self) -> Result<usize> {
            Ok(1)
        }

        fn read_line(&mut self) -> Result<Vec<u8>> {
            let _ = self.entered.send(());
            let _ = self.release.recv();
            Ok(b"late\n".to_vec())
        }
    }

    struct NullWriter;

    impl SerialWriter for NullWriter {
        fn write_bytes(&mut self, _bytes: &[u8]) -> Result<()> {
            Ok(())
        }
    }

    struct GatedOpener {
        entered: Sender<()>,
        release: Receiver<()>,
    }

    impl PortOpener for GatedOpener {
        fn open(&self, _settings: &PortSettings) -> Result<SerialConnection> {
            Ok(SerialConnection {
                reader: Box::new(GatedReader {
                    entered: self.entered.clone(),
                    release: self.release.clone(),
                }),
                writer: Box::new(NullWriter),
            })
        }

        fn list_ports(&self) -> Vec<PortInfo> {
            Vec::new()
        }
    }

    struct UnnamedFailureOpener;

    impl PortOpener for UnnamedFailureOpener {
        fn open(&self, _settings: &PortSettings) -> Result<SerialConnection> {
            Err(serialport::Error::new(serialport::ErrorKind::NoDevice, "device gone").into())
        }

        fn list_ports(&self) -> Vec<PortInfo> {
            Vec::new()
        }
    }

    fn mock_transport() -> (Transport, MockDevice) {
        let device = MockDevice::new();
        let opener = MockPortOpener::empty().with_device("mock://board", device.clone());
        let transport = Transport::with_timing(
            Arc::new(opener),
            Duration::from_millis(10),
            Duration::ZERO,
        );
        (transport, device)
    }

    #[test]
    fn test_connect_and_disconnect() {
        let (transport, device) = mock_transport();
        assert_eq!(transport.status(), ConnectionStatus::Disconnected);

        transport.connect("mock://board", 115_200).unwrap();
        assert!(transport.is_connected());
        assert_eq!(
            transport.connection_info(),
            Some(ConnectionInfo {
                port: "mock://board".to_string(),
                baud_rate: 115_200
            })
        );
        assert_eq!(device.open_count(), 1);

        transport.disconnect();
        assert!(!transport.is_connected());
        assert!(transport.connection_info().is_none());
    }

    #[test]
    fn test_connect_missing_device_stays_disconnected() {
        let (transport, _) = mock_transport();
        let err = transport.connect("mock://nope", 9600).unwrap_err();
        assert!(err.is_connection_error());
        assert!(err.to_string().contains("mock://nope"));
        assert_eq!(transport.status(), ConnectionStatus::Disconnected);
        assert_eq!(transport.poll_available(), 0);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let (transport, _) = mock_transport();
        transport.disconnect();
        transport.disconnect();
        assert_eq!(transport.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_write_when_disconnected_is_dropped() {
        let (transport, device) = mock_transport();
        assert!(!transport.write(b"hello\n").unwrap());
        assert!(device.written().is_empty());

        transport.connect("mock://board", 9600).unwrap();
        assert!(transport.write(b"hello\n").unwrap());
        assert_eq!(device.written_text(), "hello\n");
    }

    #[test]
    fn test_poll_and_read_line() {
        let (transport, device) = mock_transport();
        assert!(transport.read_line().unwrap().is_none());

        transport.connect("mock://board", 9600).unwrap();
        assert_eq!(transport.poll_available(), 0);

        device.feed_line("1\t2");
        assert_eq!(transport.poll_available(), 4);
        assert_eq!(transport.read_line().unwrap(), Some(b"1\t2\n".to_vec()));
        assert_eq!(transport.poll_available(), 0);
    }

    #[test]
    fn test_reconnect_replaces_connection() {
        let (transport, device) = mock_transport();
        transport.connect("mock://board", 9600).unwrap();
        transport.connect("mock://board", 19200).unwrap();
        assert_eq!(device.open_count(), 2);
        assert_eq!(transport.connection_info().unwrap().baud_rate, 19200);
    }

    #[test]
    fn test_connect_in_background() {
        let (transport, _) = mock_transport();
        let transport = Arc::new(transport);

        let result = transport
            .connect_in_background("mock://board".to_string(), 9600)
            .recv_timeout(Duration::from_secs(2))
            .unwrap();
        assert!(result.is_ok());
        assert!(transport.is_connected());

        let failed = transport
            .connect_in_background("mock://nope".to_string(), 9600)
            .recv_timeout(Duration::from_secs(2))
            .unwrap();
        assert!(failed.is_err());
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_connect_error_names_the_port() {
        let transport = Transport::with_timing(
            Arc::new(UnnamedFailureOpener),
            Duration::from_millis(10),
            Duration::ZERO,
        );
        let err = transport.connect("/dev/ttyACM7", 9600).unwrap_err();
        assert!(err.is_connection_error());
        assert!(err.to_string().contains("/dev/ttyACM7"));
        assert!(err.to_string().contains("device gone"));
    }

    #[test]
    fn test_disconnect_does_not_wait_for_read_in_flight() {
        let (entered_tx, entered_rx) = bounded(1);
        let (release_tx, release_rx) = bounded(1);
        let transport = Arc::new(Transport::with_timing(
            Arc::new(GatedOpener {
                entered: entered_tx,
                release: release_rx,
            }),
            Duration::from_millis(10),
            Duration::ZERO,
        ));
        transport.connect("gated", 9600).unwrap();

        let reading = Arc::clone(&transport);
        let reader_thread = std::thread::spawn(move || reading.read_line());
        entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();

        let disconnecting = Arc::clone(&transport);
        let (done_tx, done_rx) = bounded(1);
        std::thread::spawn(move || {
            disconnecting.disconnect();
            let _ = done_tx.send(());
        });
        done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(transport.status(), ConnectionStatus::Disconnected);
        assert!(!transport.write(b"x").unwrap());

        release_tx.send(()).unwrap();
        let in_flight = reader_thread.join().unwrap().unwrap();
        assert_eq!(in_flight, Some(b"late\n".to_vec()));
        assert_eq!(transport.poll_available(), 0);
        assert!(transport.read_line().unwrap().is_none());
    }
}
