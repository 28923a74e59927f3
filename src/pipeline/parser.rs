//! Line parser: text line to optional x value and y values
//!
//! A line is trimmed of surrounding whitespace and split on tabs. For each
//! configured column the first signed decimal number anywhere in that field
//! is extracted. Columns that are out of range or hold no number contribute
//! nothing; they are reported as issues and the rest of the line is still
//! parsed.
//!
//! Numbers match `[-+]?\d*\.?\d+`: an optional sign, then either digits with
//! an optional fractional part, or a bare fraction such as `.5`. Exponents
//! are not recognised, so `1e3` yields `1`.

use crate::config::PlotConfiguration;
use crate::error::ParseError;

/// Field delimiter within a line
pub const FIELD_SEPARATOR: char = '\t';

/// Result of parsing one line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLine {
    /// Value of the x column, if configured and present
    pub x: Option<f64>,
    /// Values of the y columns that produced a number, in configured order
    ///
    /// May be shorter than the configured y columns.
    pub y_values: Vec<f64>,
    /// Columns that produced no value
    pub issues: Vec<ParseError>,
}

impl ParsedLine {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Parse a line against a plot configuration
pub fn parse_line(line: &str, config: &PlotConfiguration) -> ParsedLine {
    let fields: Vec<&str> = line.trim().split(FIELD_SEPARATOR).collect();
    let mut parsed = ParsedLine::default();

    if let Some(column) = config.x_column {
        match column_value(&fields, column) {
            Ok(value) => parsed.x = Some(value),
            Err(issue) => parsed.issues.push(issue),
        }
    }

    for &column in &config.y_columns {
        match column_value(&fields, column) {
            Ok(value) => parsed.y_values.push(value),
            Err(issue) => parsed.issues.push(issue),
        }
    }

    parsed
}

fn column_value(fields: &[&str], column: usize) -> Result<f64, ParseError> {
    let field = fields.get(column).ok_or(ParseError::ColumnOutOfRange {
        column,
        field_count: fields.len(),
    })?;
    extract_number(field).ok_or(ParseError::NoNumber { column })
}

/// First signed decimal number found anywhere in `text`
pub fn extract_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    (0..bytes.len()).find_map(|start| {
        let end = match_number_at(bytes, start)?;
        // The matched range is ASCII, so it is always a valid str slice
        text.get(start..end)?.parse::<f64>().ok()
    })
}

/// End of the longest number starting exactly at `start`
fn match_number_at(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = start;
    if matches!(bytes.get(pos), Some(b'+') | Some(b'-')) {
        pos += 1;
    }

    let int_end = skip_digits(bytes, pos);
    if bytes.get(int_end) == Some(&b'.') {
        let frac_end = skip_digits(bytes, int_end + 1);
        if frac_end > int_end + 1 {
            return Some(frac_end);
        }
    }

    (int_end > pos).then_some(int_end)
}

fn skip_digits(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(x: Option<usize>, y: &[usize]) -> PlotConfiguration {
        PlotConfiguration::new(x, y.to_vec())
    }

    #[test]
    fn test_parse_tab_separated_line() {
        let parsed = parse_line("12.5\t7\t-3.2\n", &config(Some(0), &[1, 2]));
        assert_eq!(parsed.x, Some(12.5));
        assert_eq!(parsed.y_values, vec![7.0, -3.2]);
        assert!(parsed.is_clean());
    }

    #[test]
    fn test_parse_line_without_numbers() {
        let parsed = parse_line("abc\txyz\n", &config(Some(0), &[1]));
        assert_eq!(parsed.x, None);
        assert!(parsed.y_values.is_empty());
        assert_eq!(
            parsed.issues,
            vec![
                ParseError::NoNumber { column: 0 },
                ParseError::NoNumber { column: 1 }
            ]
        );
    }

    #[test]
    fn test_out_of_range_column_is_skipped() {
        let parsed = parse_line("1\t2\n", &config(None, &[1, 5, 0]));
        assert_eq!(parsed.y_values, vec![2.0, 1.0]);
        assert_eq!(
            parsed.issues,
            vec![ParseError::ColumnOutOfRange {
                column: 5,
                field_count: 2
            }]
        );
    }

    #[test]
    fn test_number_embedded_in_text() {
        let parsed = parse_line("temp=21.5C\tV:+3.3\tI -0.25A", &config(Some(0), &[1, 2]));
        assert_eq!(parsed.x, Some(21.5));
        assert_eq!(parsed.y_values, vec![3.3, -0.25]);
    }

    #[test]
    fn test_duplicate_columns_repeat_values() {
        let parsed = parse_line("4\t9", &config(None, &[1, 1]));
        assert_eq!(parsed.y_values, vec![9.0, 9.0]);
    }

    #[test]
    fn test_no_columns_configured() {
        let parsed = parse_line("1\t2\t3", &PlotConfiguration::default());
        assert_eq!(parsed, ParsedLine::default());
    }

    #[test]
    fn test_extract_number_forms() {
        assert_eq!(extract_number("42"), Some(42.0));
        assert_eq!(extract_number("-7"), Some(-7.0));
        assert_eq!(extract_number("+1.25"), Some(1.25));
        assert_eq!(extract_number(".5"), Some(0.5));
        assert_eq!(extract_number("-.5"), Some(-0.5));
        assert_eq!(extract_number("3."), Some(3.0));
        assert_eq!(extract_number("1.2.3"), Some(1.2));
        assert_eq!(extract_number("1e3"), Some(1.0));
        assert_eq!(extract_number("x-y 12"), Some(12.0));
        assert_eq!(extract_number("--5"), Some(-5.0));
        assert_eq!(extract_number(""), None);
        assert_eq!(extract_number("abc"), None);
        assert_eq!(extract_number("+-."), None);
    }

    #[test]
    fn test_extract_number_after_multibyte_text() {
        assert_eq!(extract_number("é°C 18"), Some(18.0));
    }

    #[test]
    fn test_carriage_return_is_trimmed() {
        let parsed = parse_line("1\t2\r\n", &config(Some(0), &[1]));
        assert_eq!(parsed.x, Some(1.0));
        assert_eq!(parsed.y_values, vec![2.0]);
    }

    proptest! {
        #[test]
        fn prop_extract_never_panics(text in ".*") {
            let _ = extract_number(&text);
        }

        #[test]
        fn prop_integer_fields_round_trip(values in proptest::collection::vec(-100_000i64..100_000, 1..8)) {
            let line = values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("\t");
            let columns: Vec<usize> = (0..values.len()).collect();
            let parsed = parse_line(&line, &config(None, &columns));
            let expected: Vec<f64> = values.iter().map(|&v| v as f64).collect();
            prop_assert_eq!(parsed.y_values, expected);
            prop_assert!(parsed.issues.is_empty());
        }

        #[test]
        fn prop_values_plus_issues_cover_columns(
            line in "[a-z0-9.\\t-]{0,40}",
            columns in proptest::collection::vec(0usize..6, 0..6),
        ) {
            let parsed = parse_line(&line, &config(None, &columns));
            prop_assert_eq!(parsed.y_values.len() + parsed.issues.len(), columns.len());
        }
    }
}
