//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod history;
pub mod latest;
pub mod login;
pub mod logout;
pub mod report;
pub mod show;
pub mod upload;

use crate::api::{ApiClient, DatasetListItem};
use crate::error::{CliError, Result};
use chemviz_common::{ingest, Summary, Table};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

/// A dataset pulled from the server and parsed locally
pub struct LoadedDataset {
    pub item: DatasetListItem,
    pub table: Table,
}

/// Fetch a dataset's metadata and raw CSV, and parse it.
pub async fn load_dataset(client: &mut ApiClient, id: i64) -> Result<LoadedDataset> {
    let item = client
        .list_datasets(None)
        .await?
        .into_iter()
        .find(|item| item.id == id)
        .ok_or_else(|| CliError::not_found(format!("dataset {}", id)))?;

    let raw = client.download(id).await?;
    let table = ingest::parse_text(&raw)?;

    tracing::debug!(id, rows = table.len(), columns = table.width(), "Dataset loaded");
    Ok(LoadedDataset { item, table })
}

/// Two decimals, or `-` when there is no value.
pub fn format_average(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}

/// Rounded-corner table with the given header.
pub fn new_table<T: ToString>(header: impl IntoIterator<Item = T>) -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header.into_iter().map(|h| h.to_string()).collect::<Vec<_>>());
    table
}

/// First `rows` rows of a table, formatted for the terminal.
pub fn format_rows(data: &Table, rows: usize) -> String {
    let mut table = new_table(data.columns());
    for row in data.rows().iter().take(rows) {
        table.add_row(row.iter().map(ToString::to_string).collect::<Vec<_>>());
    }
    table.to_string()
}

/// Print a stored summary: size, columns, averages, distribution, preview.
pub fn print_summary(summary: &Summary) {
    println!("  Rows:    {}", summary.total_rows);
    println!("  Columns: {}", summary.columns.join(", "));

    println!();
    println!("{}", "Averages:".cyan().bold());
    for key in ["flowrate_avg", "pressure_avg", "temperature_avg"] {
        println!("  {:<16} {}", key, format_average(summary.average(key)));
    }

    if !summary.type_distribution.is_empty() {
        println!();
        println!("{}", "Type distribution:".cyan().bold());
        for (label, count) in &summary.type_distribution {
            println!("  {:<16} {}", label, count);
        }
    }

    if !summary.preview.is_empty() {
        println!();
        println!("{}", "Preview:".cyan().bold());
        let mut table = new_table(&summary.columns);
        for row in &summary.preview {
            table.add_row(
                summary
                    .columns
                    .iter()
                    .map(|c| match row.get(c) {
                        None | Some(serde_json::Value::Null) => String::new(),
                        Some(serde_json::Value::String(s)) => s.clone(),
                        Some(other) => other.to_string(),
                    })
                    .collect::<Vec<_>>(),
            );
        }
        println!("{}", table);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chemviz_common::ingest::parse_text;

    #[test]
    fn test_format_average() {
        assert_eq!(format_average(Some(20.0)), "20.00");
        assert_eq!(format_average(Some(1.005_1)), "1.01");
        assert_eq!(format_average(None), "-");
    }

    #[test]
    fn test_format_rows_limits_output() {
        let table = parse_text("Type,Flowrate\nA,10\nB,20\nC,30\n").unwrap();
        let out = format_rows(&table, 2);
        assert!(out.contains("Flowrate"));
        assert!(out.contains("B"));
        assert!(!out.contains("30"));
    }
}
