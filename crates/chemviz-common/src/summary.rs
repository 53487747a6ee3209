//! Dataset summary computation
//!
//! The summary is computed once, at upload time, from the parsed table and
//! stored next to the raw CSV. It is a pure function of the table.

use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of leading rows kept in the preview.
pub const PREVIEW_ROWS: usize = 5;

/// Column whose values are counted into the type distribution.
pub const TYPE_COLUMN: &str = "Type";

/// Columns averaged into `<lowercased name>_avg`.
pub const AVERAGED_COLUMNS: [&str; 3] = ["Flowrate", "Pressure", "Temperature"];

/// One preview row: header label to value, in column order, nulls kept.
pub type PreviewRow = serde_json::Map<String, serde_json::Value>;

/// Aggregate statistics for one uploaded dataset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_rows: u64,
    pub columns: Vec<String>,
    pub preview: Vec<PreviewRow>,
    #[serde(default)]
    pub type_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub averages: BTreeMap<String, f64>,
}

impl Summary {
    pub fn average(&self, key: &str) -> Option<f64> {
        self.averages.get(key).copied()
    }
}

/// Summary of the most recent dataset, tagged with its file name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestSummary {
    #[serde(flatten)]
    pub summary: Summary,
    pub file_name: String,
}

/// Compute the summary of a table.
pub fn compute(table: &Table) -> Summary {
    Summary {
        total_rows: table.len() as u64,
        columns: table.columns().to_vec(),
        preview: preview(table),
        type_distribution: type_distribution(table),
        averages: averages(table),
    }
}

fn preview(table: &Table) -> Vec<PreviewRow> {
    table
        .rows()
        .iter()
        .take(PREVIEW_ROWS)
        .map(|row| {
            table
                .columns()
                .iter()
                .zip(row)
                .map(|(column, cell)| (column.clone(), cell.to_json()))
                .collect()
        })
        .collect()
}

fn type_distribution(table: &Table) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    if let Some(index) = table.column_index(TYPE_COLUMN) {
        for label in table.column(index).filter_map(|cell| cell.as_label()) {
            *counts.entry(label).or_insert(0) += 1;
        }
    }
    counts
}

fn averages(table: &Table) -> BTreeMap<String, f64> {
    AVERAGED_COLUMNS
        .iter()
        .filter_map(|&name| {
            let index = table.column_index(name)?;
            let mean = mean(&table.numeric_values(index))?;
            Some((format!("{}_avg", name.to_lowercase()), mean))
        })
        .collect()
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    mean.is_finite().then_some(mean)
}
