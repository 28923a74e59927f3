//! Drain/update cycle: the consumer side of the line queue
//!
//! Invoked on a fixed cadence by the host. Each tick drains the queue to
//! empty; every line is shown, parsed, appended to the series store and, if a
//! plot is visible, followed by a redraw. A line that yields parse issues is
//! still appended with whatever values it produced.
//!
//! The cycle reschedules itself while the host reports it is alive. Once the
//! host is gone the cycle stops for good.

use super::parser::parse_line;
use super::queue::LineReceiver;
use super::series::SharedPlotState;
use super::sinks::{DisplaySink, SeriesRenderer};
use crate::types::{CycleStats, RawLine};
use std::time::Duration;

/// The hosting window or scheduler
#[cfg_attr(test, mockall::automock)]
pub trait HostContext {
    /// Whether the host still exists
    fn is_alive(&self) -> bool;
}

/// What the host should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleControl {
    /// Run the next tick after this delay
    Continue(Duration),
    /// Do not schedule again
    Stop,
}

/// Consumer-side loop
pub struct UpdateCycle {
    queue: LineReceiver,
    plot: SharedPlotState,
    interval: Duration,
    stats: CycleStats,
    stopped: bool,
}

impl UpdateCycle {
    pub fn new(queue: LineReceiver, plot: SharedPlotState, interval: Duration) -> Self {
        Self {
            queue,
            plot,
            interval,
            stats: CycleStats::default(),
            stopped: false,
        }
    }

    /// Process every queued line; returns how many were processed
    pub fn drain(
        &mut self,
        display: &mut dyn DisplaySink,
        renderer: &mut dyn SeriesRenderer,
    ) -> usize {
        let mut processed = 0;
        while let Some(line) = self.queue.pop() {
            self.process_line(&line, display, renderer);
            processed += 1;
        }
        if processed > 0 {
            tracing::trace!("Drained {} lines", processed);
        }
        processed
    }

    fn process_line(
        &mut self,
        line: &RawLine,
        display: &mut dyn DisplaySink,
        renderer: &mut dyn SeriesRenderer,
    ) {
        let text = line.trimmed();
        display.on_line(text);

        let mut state = self.plot.lock();
        let parsed = parse_line(text, &state.config);
        for issue in &parsed.issues {
            tracing::debug!("Line {}: {}", line.sequence, issue);
        }
        self.stats.parse_issues += parsed.issues.len() as u64;

        state.series.append_parsed(&parsed);
        self.stats.lines_processed += 1;

        if renderer.is_visible() {
            renderer.on_series_update(state.series.x_coords(), state.series.y_coords());
            self.stats.redraws += 1;
        }
    }

    /// Run one scheduled tick
    ///
    /// Returns [`CycleControl::Stop`] once the host is gone; every later call
    /// also returns `Stop` without touching the queue.
    pub fn tick(
        &mut self,
        host: &dyn HostContext,
        display: &mut dyn DisplaySink,
        renderer: &mut dyn SeriesRenderer,
    ) -> CycleControl {
        if self.stopped || !host.is_alive() {
            if !self.stopped {
                tracing::info!("Host closed, stopping update cycle");
                self.stopped = true;
            }
            return CycleControl::Stop;
        }

        self.stats.ticks += 1;
        self.drain(display, renderer);
        CycleControl::Continue(self.interval)
    }

    /// Tick on the calling thread until the host goes away
    pub fn run_until_closed(
        &mut self,
        host: &dyn HostContext,
        display: &mut dyn DisplaySink,
        renderer: &mut dyn SeriesRenderer,
    ) {
        while let CycleControl::Continue(delay) = self.tick(host, display, renderer) {
            std::thread::sleep(delay);
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Lines waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
