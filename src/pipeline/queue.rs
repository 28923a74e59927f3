//! DataQueue: FIFO of received lines between the reader and the drain cycle
//!
//! Backed by an unbounded crossbeam channel. The reader thread is the only
//! producer and the drain cycle the only consumer; there is no backpressure.

use crate::error::{Result, SerialVisError};
use crate::types::RawLine;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

/// Create a connected sender/receiver pair
pub fn data_queue() -> (LineSender, LineReceiver) {
    let (tx, rx) = unbounded();
    (LineSender { tx }, LineReceiver { rx })
}

/// Producer side of the queue
#[derive(Debug, Clone)]
pub struct LineSender {
    tx: Sender<RawLine>,
}

impl LineSender {
    /// Queue a line; fails only when the receiver has been dropped
    pub fn push(&self, line: RawLine) -> Result<()> {
        self.tx
            .send(line)
            .map_err(|_| SerialVisError::Channel("line queue receiver dropped".to_string()))
    }
}

/// Consumer side of the queue
#[derive(Debug, Clone)]
pub struct LineReceiver {
    rx: Receiver<RawLine>,
}

impl LineReceiver {
    /// Take the oldest line without blocking
    pub fn pop(&self) -> Option<RawLine> {
        match self.rx.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take every line currently queued, oldest first
    pub fn drain(&self) -> Vec<RawLine> {
        self.rx.try_iter().collect()
    }

    /// Number of lines waiting
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
