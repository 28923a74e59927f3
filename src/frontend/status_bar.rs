//! Status bar panel: bottom bar showing connection, counters, and error info.

use egui::{Color32, RichText, Ui};

use crate::backend::ConnectionInfo;
use crate::types::{ConnectionStatus, CycleStats, ReaderStats};

/// Context needed to render the status bar.
pub struct StatusBarContext<'a> {
    pub status: ConnectionStatus,
    pub connection: Option<&'a ConnectionInfo>,
    pub reader: &'a ReaderStats,
    pub cycle: &'a CycleStats,
    pub samples: usize,
    pub last_error: Option<&'a str>,
}

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, ctx: &StatusBarContext<'_>) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        // === Connection status dot + port ===
        let status_color = match ctx.status {
            ConnectionStatus::Connected => Color32::GREEN,
            ConnectionStatus::Connecting => Color32::YELLOW,
            ConnectionStatus::Disconnected => Color32::GRAY,
        };
        ui.colored_label(status_color, "●");
        let status_text = match ctx.connection {
            Some(info) => format!("{}: {} @ {}", ctx.status, info.port, info.baud_rate),
            None => ctx.status.to_string(),
        };
        ui.label(RichText::new(status_text).small());

        ui.separator();

        ui.label(RichText::new(format!("Lines: {}", ctx.reader.lines_read)).small());

        ui.separator();

        ui.label(RichText::new(format!("Samples: {}", ctx.samples)).small());

        ui.separator();

        // === Dropped lines and parse issues ===
        let dropped = ctx.reader.decode_errors + ctx.reader.read_errors;
        let error_color = if dropped > 0 {
            Color32::LIGHT_RED
        } else {
            Color32::GRAY
        };
        ui.colored_label(
            error_color,
            RichText::new(format!("Dropped: {}", dropped)).small(),
        );
        ui.label(RichText::new(format!("Parse issues: {}", ctx.cycle.parse_issues)).small());

        ui.separator();

        let kb = ctx.reader.bytes_read as f64 / 1024.0;
        let data_text = if kb > 1024.0 {
            format!("Data: {:.2} MB", kb / 1024.0)
        } else {
            format!("Data: {:.2} KB", kb)
        };
        ui.label(RichText::new(data_text).small());

        // === Error message (right-aligned) ===
        if let Some(error) = ctx.last_error {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.colored_label(Color32::RED, RichText::new(error).small());
            });
        }
    });
}
