//! Reader Worker Thread Implementation
//!
//! This module contains the reader loop that runs in a separate thread and
//! drains the serial device into the line queue, so the UI never blocks on
//! serial I/O.
//!
//! # Loop Body
//!
//! Each iteration:
//!
//! 1. Checks the running flag and exits if it was cleared
//! 2. If the transport reports pending bytes, reads one line
//! 3. Decodes the line as UTF-8; undecodable lines are logged and dropped
//! 4. Pushes the decoded line onto the queue
//! 5. Sleeps for the poll interval, whether or not data was read
//!
//! # Cancellation
//!
//! Cancellation is cooperative. After the flag is cleared the loop exits
//! within one poll interval plus any read already in flight (bounded by the
//! transport's read timeout). Lines already queued are never dropped.

use super::transport::Transport;
use crate::error::{Result, SerialVisError};
use crate::pipeline::queue::LineSender;
use crate::types::{RawLine, ReaderStats};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Decode raw bytes as UTF-8 text
pub fn decode_line(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        SerialVisError::Decode(format!(
            "invalid UTF-8 after {} bytes",
            e.utf8_error().valid_up_to()
        ))
    })
}

/// The reader worker that runs the polling loop
pub struct ReaderWorker {
    /// Shared transport to poll
    transport: Arc<Transport>,
    /// Producer side of the line queue
    queue: LineSender,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Sleep between iterations
    poll_interval: Duration,
    /// Sequence number for the next queued line
    next_sequence: u64,
    /// Statistics
    stats: ReaderStats,
    /// Statistics snapshot visible to other threads
    shared_stats: Arc<Mutex<ReaderStats>>,
}

impl ReaderWorker {
    /// Create a new reader worker
    pub fn new(
        transport: Arc<Transport>,
        queue: LineSender,
        running: Arc<AtomicBool>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            transport,
            queue,
            running,
            poll_interval,
            next_sequence: 0,
            stats: ReaderStats::default(),
            shared_stats: Arc::new(Mutex::new(ReaderStats::default())),
        }
    }

    /// Handle for reading the statistics while the worker runs
    pub fn stats_handle(&self) -> Arc<Mutex<ReaderStats>> {
        Arc::clone(&self.shared_stats)
    }

    /// Run the reader loop until the running flag is cleared
    pub fn run(mut self) -> ReaderStats {
        tracing::info!("Reader worker started");

        while self.running.load(Ordering::SeqCst) {
            if !self.poll_once() {
                self.running.store(false, Ordering::SeqCst);
                break;
            }
            self.publish_stats();
            std::thread::sleep(self.poll_interval);
        }

        self.publish_stats();
        tracing::info!(
            "Reader worker stopped after {} lines ({} dropped)",
            self.stats.lines_read,
            self.stats.decode_errors
        );
        self.stats
    }

    /// One iteration without the sleep
    ///
    /// Returns `false` when the queue consumer is gone and the loop should end.
    pub fn poll_once(&mut self) -> bool {
        if self.transport.poll_available() == 0 {
            return true;
        }

        let bytes = match self.transport.read_line() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return true,
            Err(e) => {
                self.stats.read_errors += 1;
                tracing::warn!("Serial read failed: {}", e);
                return true;
            }
        };

        if bytes.is_empty() {
            return true;
        }
        self.stats.bytes_read += bytes.len() as u64;

        let text = match decode_line(bytes) {
            Ok(text) => text,
            Err(e) => {
                self.stats.decode_errors += 1;
                tracing::warn!("Dropping line: {}", e);
                return true;
            }
        };

        let line = RawLine::new(self.next_sequence, text);
        if let Err(e) = self.queue.push(line) {
            tracing::warn!("Stopping reader: {}", e);
            return false;
        }
        self.next_sequence += 1;
        self.stats.lines_read += 1;
        true
    }

    /// Statistics gathered so far
    pub fn stats(&self) -> &ReaderStats {
        &self.stats
    }

    fn publish_stats(&self) {
        let mut shared = self
            .shared_stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *shared = self.stats.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock_port::{MockDevice, MockPortOpener};
    use crate::pipeline::queue::{data_queue, LineReceiver};

    fn connected_worker() -> (ReaderWorker, MockDevice, LineReceiver) {
        let device = MockDevice::new();
        let opener = MockPortOpener::empty().with_device("mock://board", device.clone());
        let transport = Arc::new(Transport::with_timing(
            Arc::new(opener),
            Duration::from_millis(10),
            Duration::ZERO,
        ));
        transport.connect("mock://board", 9600).unwrap();

        let (tx, rx) = data_queue();
        let worker = ReaderWorker::new(
            transport,
            tx,
            Arc::new(AtomicBool::new(true)),
            Duration::from_millis(1),
        );
        (worker, device, rx)
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"1\t2\n".to_vec()).unwrap(), "1\t2\n");
        let err = decode_line(vec![b'1', 0xff, b'\n']).unwrap_err();
        assert!(matches!(err, SerialVisError::Decode(_)));
    }

    #[test]
    fn test_poll_once_reads_one_line() {
        let (mut worker, device, rx) = connected_worker();
        device.feed_line("1\t2");
        device.feed_line("3\t4");

        assert!(worker.poll_once());
        assert_eq!(rx.len(), 1);
        assert!(worker.poll_once());

        let lines = rx.drain();
        assert_eq!(lines[0].text, "1\t2\n");
        assert_eq!(lines[1].text, "3\t4\n");
        assert_eq!(lines[1].sequence, 1);
        assert_eq!(worker.stats().lines_read, 2);
    }

    #[test]
    fn test_idle_poll_queues_nothing() {
        let (mut worker, _, rx) = connected_worker();
        assert!(worker.poll_once());
        assert!(rx.is_empty());
    }

    #[test]
    fn test_decode_error_drops_line_and_continues() {
        let (mut worker, device, rx) = connected_worker();
        device.feed_bytes(&[0xc3, 0x28, b'\n']);
        device.feed_line("5\t6");

        assert!(worker.poll_once());
        assert!(worker.poll_once());

        let lines = rx.drain();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "5\t6\n");
        assert_eq!(lines[0].sequence, 0);
        assert_eq!(worker.stats().decode_errors, 1);
    }

    #[test]
    fn test_read_error_is_counted_and_loop_continues() {
        let (mut worker, device, rx) = connected_worker();
        device.feed_line("7\t8");
        device.fail_next_read();

        assert!(worker.poll_once());
        assert_eq!(worker.stats().read_errors, 1);
        assert!(rx.is_empty());

        assert!(worker.poll_once());
        let lines = rx.drain();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "7\t8\n");
        assert_eq!(worker.stats().lines_read, 1);
    }

    #[test]
    fn test_dropped_receiver_ends_loop() {
        let (mut worker, device, rx) = connected_worker();
        drop(rx);
        device.feed_line("1");
        assert!(!worker.poll_once());
    }
}
