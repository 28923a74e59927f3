//! Serial Monitor and Live Plotter - Main Entry Point
//!
//! Wires the serial backend, the pipeline, and the egui frontend together,
//! then runs the window until it is closed.

use anyhow::{anyhow, Context};
use serialvis_rs::{
    backend::{AppPortOpener, SerialBackend, Transport},
    config::{self, AppConfig, PersistedConfig},
    controller::SessionController,
    frontend::{SerialVisApp, Session},
    pipeline::{SharedPlotState, UpdateCycle},
};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install stderr and rolling file logging
///
/// The returned guard flushes the file writer when dropped.
fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,serialvis_rs=debug"));

    let file = config::log_dir().and_then(|dir| match std::fs::create_dir_all(&dir) {
        Ok(()) => Some(tracing_appender::non_blocking(tracing_appender::rolling::daily(
            dir,
            "serialvis.log",
        ))),
        Err(e) => {
            eprintln!("Failed to create log directory {}: {}", dir.display(), e);
            None
        }
    });

    let (file_layer, guard) = match file {
        Some((writer, guard)) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer),
            ),
            Some(guard),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

fn main() -> anyhow::Result<()> {
    let _log_guard = init_logging();

    tracing::info!("Starting Serial Monitor");

    if let Err(e) = config::ensure_app_data_dir() {
        tracing::warn!("Configuration will not be saved: {}", e);
    }

    let settings = config::settings_path()
        .map(AppConfig::load_or_default)
        .unwrap_or_default();
    let record_path = config::config_path();
    let record = record_path
        .as_ref()
        .map(PersistedConfig::load_or_default)
        .unwrap_or_default();

    let transport = Arc::new(Transport::new(
        Arc::new(AppPortOpener::new()),
        &settings.serial,
    ));
    let plot = SharedPlotState::new(record.plot_configuration());

    let (backend, lines) = SerialBackend::new(Arc::clone(&transport), &settings.collection);
    let reader = backend.start().context("Failed to start serial reader thread")?;

    let cycle = UpdateCycle::new(lines, plot.clone(), settings.collection.drain_interval());
    let controller = SessionController::new(transport, plot)
        .with_line_ending(settings.serial.line_ending)
        .with_echo(settings.ui.echo_commands);

    let session = Session {
        controller,
        cycle,
        reader,
        record,
        record_path,
        ui: settings.ui.clone(),
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 720.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("Serial Monitor"),
        ..Default::default()
    };

    // Shutdown and the final save run in SerialVisApp::on_exit
    eframe::run_native(
        "Serial Monitor",
        native_options,
        Box::new(|cc| Ok(Box::new(SerialVisApp::new(cc, session)))),
    )
    .map_err(|e| anyhow!("Failed to run UI: {e}"))?;

    tracing::info!("Shut down cleanly");
    Ok(())
}
