//! Plot rendering module using egui_plot
//!
//! [`PlotView`] is the [`SeriesRenderer`] used by the application. It keeps
//! its own copy of the series, extended incrementally on each update since
//! the store only ever grows between resets, and draws it in a floating
//! window while visible.
//!
//! The copy is only trusted while the view is visible. Hiding the view drops
//! it, and the owner pushes a full redraw when the view is shown again.
//!
//! Ragged series are drawn up to the shorter of x and that series.

use crate::pipeline::SeriesRenderer;
use egui::{Color32, Context};
use egui_plot::{Corner, Legend, Line, Plot, PlotPoints};

const SERIES_COLORS: [Color32; 8] = [
    Color32::from_rgb(31, 119, 180),
    Color32::from_rgb(255, 127, 14),
    Color32::from_rgb(44, 160, 44),
    Color32::from_rgb(214, 39, 40),
    Color32::from_rgb(148, 103, 189),
    Color32::from_rgb(140, 86, 75),
    Color32::from_rgb(227, 119, 194),
    Color32::from_rgb(23, 190, 207),
];

/// Plot window state
#[derive(Debug, Clone)]
pub struct PlotView {
    /// Whether the plot window is open
    pub visible: bool,
    /// Whether to show the legend
    pub show_legend: bool,
    /// Line width for all series
    pub line_width: f32,
    labels: Vec<String>,
    x_coords: Vec<f64>,
    y_coords: Vec<Vec<f64>>,
    repaint: Option<Context>,
}

impl Default for PlotView {
    fn default() -> Self {
        Self {
            visible: false,
            show_legend: true,
            line_width: 1.5,
            labels: Vec::new(),
            x_coords: Vec::new(),
            y_coords: Vec::new(),
            repaint: None,
        }
    }
}

impl PlotView {
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            ..Default::default()
        }
    }

    /// Request a repaint of `ctx` whenever new data arrives
    pub fn with_repaint_context(mut self, ctx: Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    /// Flip visibility; returns whether the view is now visible
    pub fn toggle(&mut self) -> bool {
        self.set_visible(!self.visible);
        self.visible
    }

    /// Show or hide the view, dropping the cached series when hidden
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.x_coords.clear();
            self.y_coords.clear();
        }
    }

    fn label(&self, index: usize) -> String {
        self.labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("Series{}", index + 1))
    }

    /// Draw the plot window if visible
    pub fn show(&mut self, ctx: &Context) {
        let mut open = self.visible;
        egui::Window::new("Plot")
            .open(&mut open)
            .default_size([640.0, 360.0])
            .resizable(true)
            .show(ctx, |ui| {
                let mut plot = Plot::new("serial_plot")
                    .show_axes(true)
                    .show_grid(true)
                    .x_axis_label("x")
                    .y_axis_label("value");
                if self.show_legend {
                    plot = plot.legend(Legend::default().position(Corner::RightTop));
                }

                plot.show(ui, |plot_ui| {
                    for (i, ys) in self.y_coords.iter().enumerate() {
                        let points: Vec<[f64; 2]> = self
                            .x_coords
                            .iter()
                            .zip(ys)
                            .map(|(&x, &y)| [x, y])
                            .collect();
                        if points.is_empty() {
                            continue;
                        }

                        let line = Line::new(self.label(i), PlotPoints::from(points))
                            .color(SERIES_COLORS[i % SERIES_COLORS.len()])
                            .width(self.line_width);
                        plot_ui.line(line);
                    }
                });
            });
        if !open {
            self.set_visible(false);
        }
    }
}

impl SeriesRenderer for PlotView {
    fn is_visible(&self) -> bool {
        self.visible
    }

    fn on_series_update(&mut self, x_coords: &[f64], y_coords: &[Vec<f64>]) {
        let restarted =
            x_coords.len() < self.x_coords.len() || y_coords.len() != self.y_coords.len();
        if restarted {
            self.x_coords = x_coords.to_vec();
            self.y_coords = y_coords.to_vec();
        } else {
            self.x_coords
                .extend_from_slice(&x_coords[self.x_coords.len()..]);
            for (cached, ys) in self.y_coords.iter_mut().zip(y_coords) {
                if ys.len() < cached.len() {
                    *cached = ys.clone();
                } else {
                    cached.extend_from_slice(&ys[cached.len()..]);
                }
            }
        }

        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
    }

    fn on_reconfigure(&mut self, labels: &[String]) {
        self.labels = labels.to_vec();
        self.x_coords.clear();
        self.y_coords.clear();
    }
}
