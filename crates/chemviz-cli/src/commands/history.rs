//! `chemviz history` command implementation
//!
//! Lists the most recent uploads, newest first.

use crate::api::{ApiClient, DatasetListItem};
use crate::commands::{format_average, new_table};
use crate::config::Config;
use crate::error::Result;
use colored::Colorize;

/// Show the last `limit` datasets (config default when `None`)
pub async fn run(config: &Config, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(config.history_limit);
    let mut client = ApiClient::new(config)?;
    let items = client.list_datasets(Some(limit)).await?;

    if items.is_empty() {
        println!("No datasets uploaded yet.");
        println!("Run 'chemviz upload <file>' to add one.");
        return Ok(());
    }

    println!("{}", "Recent datasets:".cyan().bold());
    println!("{}", format_history(&items));
    Ok(())
}

fn format_history(items: &[DatasetListItem]) -> String {
    let mut table = new_table(["ID", "File", "Uploaded", "Rows", "Flowrate", "Pressure", "Temperature"]);
    for item in items {
        let summary = &item.summary;
        table.add_row(vec![
            item.id.to_string(),
            item.file_name.clone(),
            item.uploaded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            summary.total_rows.to_string(),
            format_average(summary.average("flowrate_avg")),
            format_average(summary.average("pressure_avg")),
            format_average(summary.average("temperature_avg")),
        ]);
    }
    table.to_string()
}
