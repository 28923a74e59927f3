//! Collaborator doubles that record what the pipeline tells them

use serialvis_rs::pipeline::{DisplaySink, HostContext, SeriesRenderer};
use std::cell::Cell;

/// Display that keeps every call in order
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub lines: Vec<String>,
    pub commands: Vec<String>,
    pub clears: usize,
}

impl DisplaySink for RecordingDisplay {
    fn on_line(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }

    fn on_user_command(&mut self, command: &str) {
        self.commands.push(command.to_string());
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.commands.clear();
        self.clears += 1;
    }
}

/// Renderer that keeps the last series it was given
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub visible: bool,
    pub updates: usize,
    pub last_x: Vec<f64>,
    pub last_y: Vec<Vec<f64>>,
    pub labels: Vec<String>,
}

impl RecordingRenderer {
    pub fn visible() -> Self {
        Self {
            visible: true,
            ..Default::default()
        }
    }
}

impl SeriesRenderer for RecordingRenderer {
    fn is_visible(&self) -> bool {
        self.visible
    }

    fn on_series_update(&mut self, x_coords: &[f64], y_coords: &[Vec<f64>]) {
        self.updates += 1;
        self.last_x = x_coords.to_vec();
        self.last_y = y_coords.to_vec();
    }

    fn on_reconfigure(&mut self, labels: &[String]) {
        self.labels = labels.to_vec();
    }
}

/// Host that stays alive for a fixed number of checks
pub struct TicksHost {
    remaining: Cell<usize>,
}

impl TicksHost {
    pub fn new(ticks: usize) -> Self {
        Self {
            remaining: Cell::new(ticks),
        }
    }
}

impl HostContext for TicksHost {
    fn is_alive(&self) -> bool {
        let remaining = self.remaining.get();
        if remaining == 0 {
            return false;
        }
        self.remaining.set(remaining - 1);
        true
    }
}
