//! In-memory table model
//!
//! A [`Table`] is what a CSV turns into after ingestion: an ordered header
//! plus rows of [`Cell`]s. Every row has exactly one cell per column. Cells
//! are typed per value, not per column, so a column may mix numbers, text and
//! missing entries the same way an uploaded spreadsheet does.

use serde::{Serialize, Serializer};
use std::fmt;

/// Tokens read as a missing value, matched exactly after trimming.
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single table value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    /// A numeric field and its trimmed source text. Labels use the text, so
    /// `1.0` and `1` stay distinct categories.
    Number { value: f64, raw: String },
    Text(String),
}

impl Cell {
    /// Interpret one raw CSV field.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if MISSING_TOKENS.contains(&trimmed) {
            return Cell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Number {
                value,
                raw: trimmed.to_string(),
            },
            Ok(_) => Cell::Missing,
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    /// A number with no source text; its label is [`format_number`].
    pub fn number(value: f64) -> Self {
        Cell::Number {
            value,
            raw: format_number(value),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric coercion: numbers pass through, everything else is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// String coercion used for label comparisons: the field as written.
    /// Missing values have none.
    pub fn as_label(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Number { raw, .. } => Some(raw.clone()),
            Cell::Text(text) => Some(text.clone()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cell::Missing => serde_json::Value::Null,
            Cell::Number { value, .. } => number_to_json(*value),
            Cell::Text(text) => serde_json::Value::String(text.clone()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Number { value, .. } => f.write_str(&format_number(*value)),
            Cell::Text(text) => f.write_str(text),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Integral values print without a fraction.
pub fn format_number(value: f64) -> String {
    match integral(value) {
        Some(int) => int.to_string(),
        None => value.to_string(),
    }
}

fn integral(value: f64) -> Option<i64> {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Some(value as i64)
    } else {
        None
    }
}

fn number_to_json(value: f64) -> serde_json::Value {
    match integral(value) {
        Some(int) => serde_json::Value::from(int),
        None => serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
    }
}

/// Rows × named columns
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from rows, padding short rows with missing cells and
    /// cutting long ones to the header width.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Missing);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Index of the first column named exactly `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of the first column, in header order, whose name satisfies `pred`.
    pub fn find_column<F>(&self, pred: F) -> Option<usize>
    where
        F: Fn(&str) -> bool,
    {
        self.columns.iter().position(|c| pred(c))
    }

    /// First column whose lowercased name contains `needle` (lowercase).
    pub fn find_column_containing(&self, needle: &str) -> Option<usize> {
        let needle = needle.to_lowercase();
        self.find_column(|name| name.to_lowercase().contains(&needle))
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// The numeric-coercible values of a column, in row order, skipping the rest.
    pub fn numeric_values(&self, index: usize) -> Vec<f64> {
        self.column(index).filter_map(Cell::as_number).collect()
    }

    /// New table holding the rows at `indices`, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// The first `n` rows (all of them when there are fewer).
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["Equipment Type".into(), "Flowrate".into(), "Note".into()],
            vec![
                vec![Cell::parse("Pump"), Cell::parse("10"), Cell::parse("ok")],
                vec![Cell::parse("Valve"), Cell::parse("n/a")],
                vec![Cell::parse("Pump"), Cell::parse("12.5"), Cell::parse("")],
            ],
        )
    }

    #[test]
    fn test_cell_parse() {
        assert_eq!(Cell::parse("42"), Cell::number(42.0));
        assert_eq!(Cell::parse(" 3.5 ").as_number(), Some(3.5));
        assert_eq!(Cell::parse(""), Cell::Missing);
        assert_eq!(Cell::parse("NaN"), Cell::Missing);
        assert_eq!(Cell::parse("inf"), Cell::Missing);
        assert_eq!(Cell::parse("Pump"), Cell::Text("Pump".into()));
    }

    #[test]
    fn test_cell_display_and_json() {
        assert_eq!(Cell::number(10.0).to_string(), "10");
        assert_eq!(Cell::number(2.25).to_string(), "2.25");
        assert_eq!(Cell::Missing.to_string(), "");
        assert_eq!(Cell::number(10.0).to_json(), serde_json::json!(10));
        assert_eq!(Cell::number(0.5).to_json(), serde_json::json!(0.5));
        assert_eq!(Cell::Missing.to_json(), serde_json::Value::Null);
        assert_eq!(Cell::Missing.as_label(), None);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = sample();
        assert_eq!(table.row(1).unwrap().len(), 3);
        assert!(table.row(1).unwrap()[2].is_missing());
    }

    #[test]
    fn test_column_lookup_first_match_wins() {
        let table = sample();
        assert_eq!(table.find_column_containing("TYPE"), Some(0));
        assert_eq!(table.find_column_containing("flow"), Some(1));
        assert_eq!(table.column_index("Type"), None);
        assert_eq!(table.numeric_values(1), vec![10.0, 12.5]);
    }

    #[test]
    fn test_select_rows_leaves_source_untouched() {
        let table = sample();
        let before = table.clone();
        let picked = table.select_rows(&[2, 0]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked.row(0).unwrap()[1], Cell::number(12.5));
        assert_eq!(table, before);
        assert_eq!(table.head(10).len(), 3);
    }

    #[test]
    fn test_numeric_labels_keep_source_text() {
        let one = Cell::parse("1.0");
        assert_eq!(one.as_number(), Some(1.0));
        assert_eq!(one.as_label().as_deref(), Some("1.0"));
        assert_eq!(Cell::parse(" 1 ").as_label().as_deref(), Some("1"));
        assert_eq!(Cell::parse("2.50").as_label().as_deref(), Some("2.50"));
        assert_eq!(one.to_json(), serde_json::json!(1));
    }

    #[test]
    fn test_missing_tokens_follow_csv_defaults() {
        for token in ["<NA>", "#NA", "-NaN", "#N/A N/A", "1.#QNAN", "None", " NULL "] {
            assert!(Cell::parse(token).is_missing(), "{:?} should be missing", token);
        }
        assert_eq!(Cell::parse("none"), Cell::Text("none".into()));
        assert_eq!(Cell::parse("Na"), Cell::Text("Na".into()));
    }
}
