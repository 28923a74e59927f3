//! Collaborators fed by the drain cycle
//!
//! - [`DisplaySink`] receives every line in arrival order, plus echoed user
//!   commands
//! - [`SeriesRenderer`] receives the full series after each append while it
//!   is visible
//!
//! [`DisplayLog`] is the in-memory display used by the frontend.

use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// Receives text for the serial log
#[cfg_attr(test, mockall::automock)]
pub trait DisplaySink {
    /// A line received from the device, terminator removed
    fn on_line(&mut self, text: &str);

    /// A command the user sent
    fn on_user_command(&mut self, command: &str);

    /// Remove everything shown so far
    fn clear(&mut self);
}

/// Draws the plot
#[cfg_attr(test, mockall::automock)]
pub trait SeriesRenderer {
    /// Whether a plot view is open; redraws are only requested while it is
    fn is_visible(&self) -> bool;

    /// Full current series; y series may be ragged
    fn on_series_update(&mut self, x_coords: &[f64], y_coords: &[Vec<f64>]);

    /// Series were rebuilt; `labels` has one entry per y series
    fn on_reconfigure(&mut self, labels: &[String]);
}

/// Kind of entry in the display log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEntryKind {
    Received,
    UserCommand,
}

/// One line of the display log
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub kind: LogEntryKind,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl LogEntry {
    /// Text as shown, with the `user > ` prefix on commands
    pub fn display_text(&self) -> String {
        match self.kind {
            LogEntryKind::Received => self.text.clone(),
            LogEntryKind::UserCommand => format!("user > {}", self.text),
        }
    }

    /// Display text with an optional `HH:MM:SS.mmm` prefix
    pub fn format(&self, show_timestamp: bool) -> String {
        if show_timestamp {
            format!(
                "[{}] {}",
                self.timestamp.format("%H:%M:%S%.3f"),
                self.display_text()
            )
        } else {
            self.display_text()
        }
    }
}

/// Bounded display log; the oldest entries are discarded first
#[derive(Debug, Clone)]
pub struct DisplayLog {
    entries: VecDeque<LogEntry>,
    max_lines: usize,
    show_timestamps: bool,
}

impl DisplayLog {
    pub fn new(max_lines: usize, show_timestamps: bool) -> Self {
        Self {
            entries: VecDeque::new(),
            max_lines: max_lines.max(1),
            show_timestamps,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn show_timestamps(&self) -> bool {
        self.show_timestamps
    }

    pub fn set_show_timestamps(&mut self, show: bool) {
        self.show_timestamps = show;
    }

    /// Formatted lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.format(self.show_timestamps))
            .collect()
    }

    fn push(&mut self, kind: LogEntryKind, text: &str) {
        if self.entries.len() >= self.max_lines {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            kind,
            text: text.to_string(),
            timestamp: Local::now(),
        });
    }
}

impl Default for DisplayLog {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_LOG_LINES, false)
    }
}

impl DisplaySink for DisplayLog {
    fn on_line(&mut self, text: &str) {
        self.push(LogEntryKind::Received, text);
    }

    fn on_user_command(&mut self, command: &str) {
        self.push(LogEntryKind::UserCommand, command);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_keeps_order_and_kinds() {
        let mut log = DisplayLog::new(10, false);
        log.on_line("1\t2");
        log.on_user_command("status");
        log.on_line("3\t4");

        assert_eq!(log.lines(), vec!["1\t2", "user > status", "3\t4"]);
        let kinds: Vec<_> = log.entries().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LogEntryKind::Received,
                LogEntryKind::UserCommand,
                LogEntryKind::Received
            ]
        );
    }

    #[test]
    fn test_log_is_bounded() {
        let mut log = DisplayLog::new(3, false);
        for i in 0..5 {
            log.on_line(&i.to_string());
        }
        assert_eq!(log.lines(), vec!["2", "3", "4"]);
    }

    #[test]
    fn test_clear() {
        let mut log = DisplayLog::default();
        log.on_line("x");
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_timestamp_prefix() {
        let mut log = DisplayLog::new(10, true);
        log.on_line("hello");
        let line = &log.lines()[0];
        assert!(line.starts_with('['));
        assert!(line.ends_with("] hello"));
        // [HH:MM:SS.mmm] hello
        assert_eq!(line.len(), "[00:00:00.000] hello".len());
    }
}
