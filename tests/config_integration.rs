//! Integration tests for configuration files
//!
//! - The persisted record keeps its verbatim field names
//! - Settings load with defaults for anything omitted
//! - A startup/shutdown round trip restores the plot configuration

mod common;

use serialvis_rs::config::{AppConfig, LineEnding, PersistedConfig, PlotConfiguration};
use serialvis_rs::pipeline::SharedPlotState;
use tempfile::TempDir;

#[test]
fn test_record_round_trip_through_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut record = PersistedConfig::default();
    record.set_plot_configuration(&PlotConfiguration::new(Some(0), vec![1, 2]));
    record.baudrate = 115_200;
    record.set_permanent_command(0, "status");
    record.set_permanent_command(3, "led off");
    record.save(&path).unwrap();

    let loaded = PersistedConfig::load(&path).unwrap();
    assert_eq!(loaded, record);
    assert_eq!(loaded.permanent_command(3), Some("led off"));
    assert_eq!(loaded.permanent_command(1), None);
}

#[test]
fn test_record_reads_foreign_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "x_column": null,
            "y_columns": [2, 0],
            "baudrate": 9600,
            "permanent_command_2": "reset",
            "window_geometry": "800x600"
        }"#,
    )
    .unwrap();

    let record = PersistedConfig::load_or_default(&path);
    assert_eq!(record.plot_configuration(), PlotConfiguration::new(None, vec![2, 0]));
    assert_eq!(record.baudrate, 9600);
    assert_eq!(record.permanent_commands()[1], "reset");
}

#[test]
fn test_record_defaults_when_missing_or_corrupt() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");
    assert_eq!(PersistedConfig::load_or_default(&missing), PersistedConfig::default());
    assert!(PersistedConfig::load(&missing).is_err());

    let corrupt = dir.path().join("corrupt.json");
    std::fs::write(&corrupt, "{ not json").unwrap();
    let record = PersistedConfig::load_or_default(&corrupt);
    assert_eq!(record.baudrate, 19200);
    assert!(record.y_columns.is_empty());
}

#[test]
fn test_saved_keys_are_verbatim() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let mut record = PersistedConfig::default();
    record.set_permanent_command(4, "ping");
    record.save(&path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let object = value.as_object().unwrap();
    let mut keys: Vec<_> = object.keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["baudrate", "permanent_command_5", "x_column", "y_columns"]
    );
    assert!(object["x_column"].is_null());
}

#[test]
fn test_settings_partial_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(
        &path,
        "[serial]\nsettle_delay_ms = 0\nline_ending = \"crlf\"\n\n[ui]\nshow_timestamps = true\n",
    )
    .unwrap();

    let settings = AppConfig::load(&path).unwrap();
    assert_eq!(settings.serial.settle_delay_ms, 0);
    assert_eq!(settings.serial.read_timeout_ms, 1000);
    assert_eq!(settings.serial.line_ending, LineEnding::CrLf);
    assert_eq!(settings.collection.reader_poll_interval_ms, 100);
    assert!(settings.ui.show_timestamps);
    assert!(settings.ui.echo_commands);

    let out = dir.path().join("out.toml");
    settings.save(&out).unwrap();
    assert_eq!(AppConfig::load(&out).unwrap(), settings);
}

#[test]
fn test_plot_configuration_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    // First run: user reconfigures, shutdown persists
    let plot = SharedPlotState::new(PersistedConfig::load_or_default(&path).plot_configuration());
    plot.lock()
        .reconfigure(PlotConfiguration::from_inputs("1", "0, 2").unwrap());
    let mut record = PersistedConfig::load_or_default(&path);
    record.set_plot_configuration(&plot.configuration());
    record.save(&path).unwrap();

    // Second run: startup seeds the state
    let restored = SharedPlotState::new(PersistedConfig::load_or_default(&path).plot_configuration());
    let state = restored.lock();
    assert_eq!(state.config, PlotConfiguration::new(Some(1), vec![0, 2]));
    assert_eq!(state.series.series_count(), 2);
}
