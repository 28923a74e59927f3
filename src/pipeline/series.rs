//! Series store: accumulated x/y samples backing the live plot
//!
//! Append is the only growth operation. Each append advances `x_coords` by
//! exactly one. A y value at position `i` of a line's value list goes to
//! inner series `i`, so a line that supplies fewer values than configured
//! leaves the trailing series un-appended for that line. Series can
//! therefore become ragged; renderers plot the common prefix.
//!
//! [`PlotState`] pairs the store with the [`PlotConfiguration`] it was last
//! aligned to, and [`SharedPlotState`] guards both with one mutex so a
//! reconfigure is atomic with respect to a concurrent drain.

use super::parser::ParsedLine;
use crate::config::PlotConfiguration;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// x/y coordinate buffers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesStore {
    x_coords: Vec<f64>,
    y_coords: Vec<Vec<f64>>,
    expected_series: usize,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with `count` empty y series
    pub fn with_series(count: usize) -> Self {
        let mut store = Self::new();
        store.reconfigure(count);
        store
    }

    /// Append one sample
    pub fn append(&mut self, x: f64, y_values: &[f64]) {
        self.x_coords.push(x);
        for (i, &value) in y_values.iter().enumerate() {
            if self.y_coords.len() <= i {
                self.y_coords.resize_with(i + 1, Vec::new);
            }
            self.y_coords[i].push(value);
        }
    }

    /// Append a parsed line, substituting the sample index for a missing x
    ///
    /// Returns the x value that was used.
    pub fn append_parsed(&mut self, parsed: &ParsedLine) -> f64 {
        let x = parsed.x.unwrap_or_else(|| self.next_sample_index());
        self.append(x, &parsed.y_values);
        x
    }

    /// Index the next sample will have
    pub fn next_sample_index(&self) -> f64 {
        self.x_coords.len() as f64
    }

    /// Remove all samples, keeping the series count
    pub fn reset(&mut self) {
        self.x_coords.clear();
        self.y_coords.clear();
        self.y_coords.resize_with(self.expected_series, Vec::new);
    }

    /// Remove all samples and realign to `series_count` empty y series
    pub fn reconfigure(&mut self, series_count: usize) {
        self.expected_series = series_count;
        self.reset();
    }

    pub fn x_coords(&self) -> &[f64] {
        &self.x_coords
    }

    pub fn y_coords(&self) -> &[Vec<f64>] {
        &self.y_coords
    }

    /// Number of samples appended since the last reset
    pub fn len(&self) -> usize {
        self.x_coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_coords.is_empty()
    }

    /// Number of y series currently held
    pub fn series_count(&self) -> usize {
        self.y_coords.len()
    }

    /// Whether every y series has the same length as `x_coords`
    pub fn is_aligned(&self) -> bool {
        self.y_coords.iter().all(|s| s.len() == self.x_coords.len())
    }

    /// Number of samples for which every series has a value
    pub fn common_len(&self) -> usize {
        self.y_coords
            .iter()
            .map(Vec::len)
            .fold(self.x_coords.len(), usize::min)
    }

    /// `[x, y]` pairs for series `index`, paired positionally with `x_coords`
    pub fn points(&self, index: usize) -> Vec<[f64; 2]> {
        self.y_coords
            .get(index)
            .map(|ys| {
                self.x_coords
                    .iter()
                    .zip(ys)
                    .map(|(&x, &y)| [x, y])
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Plot configuration together with the store aligned to it
#[derive(Debug, Clone, Default)]
pub struct PlotState {
    pub config: PlotConfiguration,
    pub series: SeriesStore,
}

impl PlotState {
    pub fn new(config: PlotConfiguration) -> Self {
        let series = SeriesStore::with_series(config.series_count());
        Self { config, series }
    }

    /// Install a new configuration and realign the store to it
    pub fn reconfigure(&mut self, config: PlotConfiguration) {
        self.series.reconfigure(config.series_count());
        self.config = config;
    }
}

/// Mutex-guarded [`PlotState`] shared between the drain cycle and UI actions
#[derive(Debug, Clone, Default)]
pub struct SharedPlotState {
    inner: Arc<Mutex<PlotState>>,
}

impl SharedPlotState {
    pub fn new(config: PlotConfiguration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PlotState::new(config))),
        }
    }

    /// Lock the state, recovering it if a holder panicked
    pub fn lock(&self) -> MutexGuard<'_, PlotState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current configuration
    pub fn configuration(&self) -> PlotConfiguration {
        self.lock().config.clone()
    }
}
