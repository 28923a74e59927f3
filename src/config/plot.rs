//! Plot configuration: which columns of a line feed the x axis and the y series
//!
//! Column indices are zero-based positions in a tab-delimited line. The
//! order of `y_columns` defines series identity and legend order; duplicates
//! are allowed and produce duplicate series.
//!
//! User input is validated in full before anything is changed: a rejected
//! edit leaves the previous configuration untouched.

use crate::error::{Result, SerialVisError};
use serde::{Deserialize, Serialize};

/// Keyword accepted in place of a column index to mean "no column"
const NONE_KEYWORD: &str = "none";

/// Mapping of line fields to plot series
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotConfiguration {
    /// Field used as the x value; `None` plots against the sample index
    pub x_column: Option<usize>,
    /// Fields plotted as y series, in legend order
    pub y_columns: Vec<usize>,
}

impl PlotConfiguration {
    pub fn new(x_column: Option<usize>, y_columns: Vec<usize>) -> Self {
        Self {
            x_column,
            y_columns,
        }
    }

    /// Build a configuration from the text a user typed into the x and y fields
    ///
    /// The x field may be empty or `none`. The y field is a list separated by
    /// commas or whitespace where empty entries and `none` are skipped. Any other entry that
    /// is not a non-negative integer rejects the whole input.
    pub fn from_inputs(x_text: &str, y_text: &str) -> Result<Self> {
        let x_column = Self::parse_x_column(x_text)?;
        let y_columns = Self::parse_y_columns(y_text)?;
        Ok(Self::new(x_column, y_columns))
    }

    /// Parse the x column field
    pub fn parse_x_column(text: &str) -> Result<Option<usize>> {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case(NONE_KEYWORD) {
            return Ok(None);
        }
        parse_index(text, "X column").map(Some)
    }

    /// Parse the y columns field
    pub fn parse_y_columns(text: &str) -> Result<Vec<usize>> {
        text.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|entry| !entry.is_empty() && !entry.eq_ignore_ascii_case(NONE_KEYWORD))
            .map(|entry| parse_index(entry, "Y column"))
            .collect()
    }

    /// Text for the x input field (empty when unset)
    pub fn x_column_text(&self) -> String {
        self.x_column.map(|c| c.to_string()).unwrap_or_default()
    }

    /// Text for the y input field (`1,2,3`)
    pub fn y_columns_text(&self) -> String {
        self.y_columns
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Number of y series this configuration produces
    pub fn series_count(&self) -> usize {
        self.y_columns.len()
    }

    /// Legend label for each y series, one-based for display
    pub fn series_labels(&self) -> Vec<String> {
        self.y_columns
            .iter()
            .map(|c| format!("Column{}", c + 1))
            .collect()
    }
}

fn parse_index(entry: &str, what: &str) -> Result<usize> {
    entry.parse::<usize>().map_err(|_| {
        SerialVisError::Configuration(format!(
            "{} '{}' is not a non-negative integer",
            what, entry
        ))
    })
}
