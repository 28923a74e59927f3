//! Session controller: the boundary where user actions enter the core
//!
//! Every method here is called from the UI thread in response to a button
//! or key press. Failures are returned for the caller to show to the user;
//! nothing in here panics on bad input.

use crate::backend::Transport;
use crate::config::{LineEnding, PlotConfiguration};
use crate::error::Result;
use crate::pipeline::{DisplaySink, SeriesRenderer, SharedPlotState};
use crossbeam_channel::Receiver;
use std::sync::Arc;

/// Maps user actions onto the transport and the shared plot state
pub struct SessionController {
    transport: Arc<Transport>,
    plot: SharedPlotState,
    line_ending: LineEnding,
    echo_commands: bool,
}

impl SessionController {
    pub fn new(transport: Arc<Transport>, plot: SharedPlotState) -> Self {
        Self {
            transport,
            plot,
            line_ending: LineEnding::default(),
            echo_commands: true,
        }
    }

    /// Set the terminator appended to sent commands
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Set whether sent commands are echoed to the display
    pub fn with_echo(mut self, echo_commands: bool) -> Self {
        self.echo_commands = echo_commands;
        self
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Open a device, blocking for the settle delay
    pub fn connect(&self, port: &str, baud_rate: u32) -> Result<()> {
        self.transport.connect(port, baud_rate)
    }

    /// Open a device on a helper thread; the receiver yields the outcome
    pub fn connect_async(&self, port: &str, baud_rate: u32) -> Receiver<Result<()>> {
        self.transport
            .connect_in_background(port.to_string(), baud_rate)
    }

    pub fn disconnect(&self) {
        self.transport.disconnect();
    }

    /// Send a command followed by the configured line ending
    ///
    /// The command is echoed to the display even when disconnected.
    /// Returns `Ok(false)` if nothing was written because no device is open.
    pub fn send(&self, command: &str, display: &mut dyn DisplaySink) -> Result<bool> {
        if self.echo_commands {
            display.on_user_command(command);
        }
        let framed = self.line_ending.terminate(command);
        let written = self.transport.write(framed.as_bytes())?;
        if written {
            tracing::debug!("Sent command {:?}", command);
        }
        Ok(written)
    }

    /// Apply new column selections typed by the user
    ///
    /// The input is validated in full first. On error nothing changes: not
    /// the configuration, the series, nor the display.
    pub fn reconfigure(
        &self,
        x_text: &str,
        y_text: &str,
        display: &mut dyn DisplaySink,
        renderer: &mut dyn SeriesRenderer,
    ) -> Result<PlotConfiguration> {
        let config = PlotConfiguration::from_inputs(x_text, y_text)?;

        let mut state = self.plot.lock();
        state.reconfigure(config.clone());
        display.clear();
        renderer.on_reconfigure(&config.series_labels());
        renderer.on_series_update(state.series.x_coords(), state.series.y_coords());

        tracing::info!(
            "Plot reconfigured: x={:?} y={:?}",
            config.x_column,
            config.y_columns
        );
        Ok(config)
    }

    /// Clear the series and the display, keeping the configuration
    ///
    /// The renderer is always handed the emptied series, visible or not, so
    /// no cached copy outlives the reset.
    pub fn reset(&self, display: &mut dyn DisplaySink, renderer: &mut dyn SeriesRenderer) {
        let mut state = self.plot.lock();
        state.series.reset();
        display.clear();
        renderer.on_series_update(state.series.x_coords(), state.series.y_coords());
        tracing::debug!("Series reset");
    }

    /// Push the full current series to the renderer
    pub fn redraw(&self, renderer: &mut dyn SeriesRenderer) {
        let state = self.plot.lock();
        renderer.on_series_update(state.series.x_coords(), state.series.y_coords());
    }

    /// Samples held by the series store
    pub fn sample_count(&self) -> usize {
        self.plot.lock().series.len()
    }

    /// Copy of the configuration currently applied
    pub fn plot_configuration(&self) -> PlotConfiguration {
        self.plot.configuration()
    }
}
