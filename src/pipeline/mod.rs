//! Line pipeline from the reader queue to the display and plot
//!
//! ```text
//! [ReaderWorker] ──► DataQueue ──► [UpdateCycle] ──► DisplaySink
//!                                       │
//!                                       ├──► parse_line ──► SeriesStore
//!                                       └──► SeriesRenderer (when visible)
//! ```
//!
//! # Design
//!
//! - **Single consumer**: only the cycle pops from the queue, so lines are
//!   processed in arrival order.
//! - **Total parsing**: the parser never fails a line; missing columns are
//!   collected as issues.
//! - **Shared plot state**: configuration and series sit behind one mutex,
//!   passed explicitly to the cycle and the controller.

pub mod cycle;
pub mod parser;
pub mod queue;
pub mod series;
pub mod sinks;

pub use cycle::{CycleControl, HostContext, UpdateCycle};
pub use parser::{extract_number, parse_line, ParsedLine, FIELD_SEPARATOR};
pub use queue::{data_queue, LineReceiver, LineSender};
pub use series::{PlotState, SeriesStore, SharedPlotState};
pub use sinks::{DisplayLog, DisplaySink, LogEntry, LogEntryKind, SeriesRenderer};
