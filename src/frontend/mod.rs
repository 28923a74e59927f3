//! Frontend module for egui UI
//!
//! This module hosts the pipeline in an eframe window. Every frame it runs
//! one tick of the drain/update cycle, then lays out the controls, the
//! serial log, and the plot window.
//!
//! # Main Types
//!
//! - [`SerialVisApp`] - Main application state implementing [`eframe::App`]
//! - [`Session`] - Everything the app needs from startup wiring
//! - [`PlotView`] - Plot window implementing the series renderer
//!
//! User actions collected during layout are applied after it as
//! [`UiAction`]s, so layout code never calls into the controller directly.

mod plot;
mod status_bar;

pub use plot::PlotView;
pub use status_bar::{render_status_bar, StatusBarContext};

use crate::backend::{self, ReaderHandle};
use crate::config::{PersistedConfig, UiConfig, PERMANENT_COMMAND_SLOTS};
use crate::controller::SessionController;
use crate::error::Result;
use crate::pipeline::{CycleControl, DisplayLog, HostContext, LogEntryKind, UpdateCycle};
use crate::types::PortInfo;
use crossbeam_channel::{Receiver, TryRecvError};
use egui::{Color32, RichText};
use std::path::PathBuf;

/// Startup wiring handed to the app
pub struct Session {
    pub controller: SessionController,
    pub cycle: UpdateCycle,
    pub reader: ReaderHandle,
    pub record: PersistedConfig,
    pub record_path: Option<PathBuf>,
    pub ui: UiConfig,
}

/// Actions triggered from the UI
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    RefreshPorts,
    Connect,
    Disconnect,
    Send(String),
    UpdatePlot,
    Reset,
    TogglePlot,
}

/// The egui context as seen by the update cycle
struct FrameHost<'a> {
    ctx: &'a egui::Context,
}

impl HostContext for FrameHost<'_> {
    fn is_alive(&self) -> bool {
        !self.ctx.input(|i| i.viewport().close_requested())
    }
}

/// Main application state
pub struct SerialVisApp {
    controller: SessionController,
    cycle: UpdateCycle,
    reader: Option<ReaderHandle>,
    display: DisplayLog,
    plot_view: PlotView,

    record: PersistedConfig,
    record_path: Option<PathBuf>,

    // === Inputs ===
    ports: Vec<PortInfo>,
    selected_port: String,
    baud_text: String,
    command_text: String,
    permanent_commands: [String; PERMANENT_COMMAND_SLOTS],
    x_text: String,
    y_text: String,

    pending_connect: Option<Receiver<Result<()>>>,
    last_error: Option<String>,
}

impl SerialVisApp {
    pub fn new(cc: &eframe::CreationContext<'_>, session: Session) -> Self {
        let plot_config = session.controller.plot_configuration();
        let ports = session.controller.transport().list_ports();
        let selected_port = ports.first().map(|p| p.name.clone()).unwrap_or_default();

        Self {
            plot_view: PlotView::new(plot_config.series_labels())
                .with_repaint_context(cc.egui_ctx.clone()),
            display: DisplayLog::new(session.ui.max_log_lines, session.ui.show_timestamps),
            x_text: plot_config.x_column_text(),
            y_text: plot_config.y_columns_text(),
            baud_text: session.record.baudrate.to_string(),
            permanent_commands: session.record.permanent_commands(),
            controller: session.controller,
            cycle: session.cycle,
            reader: Some(session.reader),
            record: session.record,
            record_path: session.record_path,
            ports,
            selected_port,
            command_text: String::new(),
            pending_connect: None,
            last_error: None,
        }
    }

    fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::RefreshPorts => {
                self.ports = self.controller.transport().list_ports();
                tracing::debug!("Found {} ports", self.ports.len());
            }
            UiAction::Connect => self.start_connect(),
            UiAction::Disconnect => {
                self.pending_connect = None;
                self.controller.disconnect();
            }
            UiAction::Send(command) => {
                match self.controller.send(&command, &mut self.display) {
                    Ok(true) => self.last_error = None,
                    Ok(false) => self.last_error = Some("Not connected".to_string()),
                    Err(e) => self.report(e),
                }
            }
            UiAction::UpdatePlot => {
                match self.controller.reconfigure(
                    &self.x_text,
                    &self.y_text,
                    &mut self.display,
                    &mut self.plot_view,
                ) {
                    Ok(config) => {
                        self.x_text = config.x_column_text();
                        self.y_text = config.y_columns_text();
                        self.last_error = None;
                    }
                    Err(e) => self.report(e),
                }
            }
            UiAction::Reset => self.controller.reset(&mut self.display, &mut self.plot_view),
            UiAction::TogglePlot => {
                if self.plot_view.toggle() {
                    self.controller.redraw(&mut self.plot_view);
                }
            }
        }
    }

    fn start_connect(&mut self) {
        let baud_rate = match self.baud_text.trim().parse::<u32>() {
            Ok(baud) if baud > 0 => baud,
            _ => {
                self.last_error = Some(format!("Invalid baud rate '{}'", self.baud_text));
                return;
            }
        };
        if self.selected_port.is_empty() {
            self.last_error = Some("No port selected".to_string());
            return;
        }

        self.last_error = None;
        self.record.baudrate = baud_rate;
        self.pending_connect = Some(self.controller.connect_async(&self.selected_port, baud_rate));
    }

    fn poll_pending_connect(&mut self) {
        let Some(rx) = &self.pending_connect else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(())) => self.pending_connect = None,
            Ok(Err(e)) => {
                self.pending_connect = None;
                self.report(e);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => self.pending_connect = None,
        }
    }

    fn report(&mut self, error: crate::error::SerialVisError) {
        tracing::warn!("{}", error);
        self.last_error = Some(error.to_string());
    }

    fn sync_record(&mut self) {
        self.record
            .set_plot_configuration(&self.controller.plot_configuration());
        for (slot, command) in self.permanent_commands.iter().enumerate() {
            self.record.set_permanent_command(slot, command.as_str());
        }
    }

    fn connection_panel(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let connected = self.controller.transport().is_connected();
        let connecting = self.pending_connect.is_some();

        ui.horizontal(|ui| {
            ui.label("Port:");
            egui::ComboBox::from_id_salt("port_select")
                .selected_text(self.selected_port.as_str())
                .show_ui(ui, |ui| {
                    for port in &self.ports {
                        ui.selectable_value(&mut self.selected_port, port.name.clone(), port.to_string());
                    }
                });
            if ui.button("⟳").on_hover_text("Refresh ports").clicked() {
                actions.push(UiAction::RefreshPorts);
            }

            ui.label("Baud:");
            ui.add(egui::TextEdit::singleline(&mut self.baud_text).desired_width(70.0));

            if connected {
                if ui.button("Disconnect").clicked() {
                    actions.push(UiAction::Disconnect);
                }
            } else if connecting {
                ui.add_enabled(false, egui::Button::new("Connecting..."));
            } else if ui.button("Connect").clicked() {
                actions.push(UiAction::Connect);
            }
        });
    }

    fn command_panel(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.horizontal(|ui| {
            ui.label("Command:");
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.command_text).desired_width(300.0),
            );
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if (enter || ui.button("Send").clicked()) && !self.command_text.is_empty() {
                actions.push(UiAction::Send(std::mem::take(&mut self.command_text)));
                response.request_focus();
            }
        });

        ui.horizontal(|ui| {
            for command in self.permanent_commands.iter_mut() {
                ui.add(egui::TextEdit::singleline(command).desired_width(90.0));
                if ui.small_button("▶").clicked() && !command.is_empty() {
                    actions.push(UiAction::Send(command.clone()));
                }
            }
        });
    }

    fn plot_panel(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.horizontal(|ui| {
            ui.label("X column:");
            ui.add(egui::TextEdit::singleline(&mut self.x_text).desired_width(50.0));
            ui.label("Y columns:");
            ui.add(egui::TextEdit::singleline(&mut self.y_text).desired_width(120.0));
            if ui.button("Update Plot").clicked() {
                actions.push(UiAction::UpdatePlot);
            }
            if ui.button("Reset").clicked() {
                actions.push(UiAction::Reset);
            }
            let toggle = if self.plot_view.visible {
                "Hide Graph"
            } else {
                "Show Graph"
            };
            if ui.button(toggle).clicked() {
                actions.push(UiAction::TogglePlot);
            }
        });
    }

    fn log_panel(&self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .stick_to_bottom(true)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for entry in self.display.entries() {
                    let text = RichText::new(entry.format(self.display.show_timestamps())).monospace();
                    match entry.kind {
                        LogEntryKind::Received => ui.label(text),
                        LogEntryKind::UserCommand => ui.label(text.color(Color32::LIGHT_BLUE)),
                    };
                }
            });
    }
}

impl eframe::App for SerialVisApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_pending_connect();

        let host = FrameHost { ctx };
        if let CycleControl::Continue(delay) =
            self.cycle.tick(&host, &mut self.display, &mut self.plot_view)
        {
            ctx.request_repaint_after(delay);
        }

        let mut actions = Vec::new();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.connection_panel(ui, &mut actions);
            ui.separator();
            self.command_panel(ui, &mut actions);
            ui.separator();
            self.plot_panel(ui, &mut actions);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            let reader_stats = self.reader.as_ref().map(|r| r.stats()).unwrap_or_default();
            let connection = self.controller.transport().connection_info();
            let samples = self.controller.sample_count();
            render_status_bar(
                ui,
                &StatusBarContext {
                    status: self.controller.transport().status(),
                    connection: connection.as_ref(),
                    reader: &reader_stats,
                    cycle: self.cycle.stats(),
                    samples,
                    last_error: self.last_error.as_deref(),
                },
            );
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.log_panel(ui);
        });

        if self.plot_view.visible {
            self.plot_view.show(ctx);
        }

        for action in actions {
            self.apply(action);
        }
        self.sync_record();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Reader first, then the port, then the record
        if let Some(reader) = self.reader.take() {
            let stats = backend::shutdown(reader, self.controller.transport());
            tracing::info!("Reader processed {} lines", stats.lines_read);
        }

        self.sync_record();
        if let Some(path) = &self.record_path {
            if let Err(e) = self.record.save(path) {
                tracing::warn!("Failed to save configuration on exit: {}", e);
            }
        }
    }
}
