//! `chemviz show` command implementation
//!
//! Loads one dataset, applies the filters locally and prints what the
//! filtered view looks like: averages, available filter values, a preview,
//! the chart data and the findings.

use crate::api::ApiClient;
use crate::charts;
use crate::commands::{format_average, format_rows, load_dataset};
use crate::config::Config;
use crate::error::Result;
use crate::filter::{self, FilterSpec, ALL_CATEGORIES};
use crate::insight;
use colored::Colorize;

/// Lines printed per chart.
const CHART_LINES: usize = 8;

/// Show a filtered view of dataset `id`
pub async fn run(config: &Config, id: i64, spec: FilterSpec, rows: usize) -> Result<()> {
    let mut client = ApiClient::new(config)?;
    let dataset = load_dataset(&mut client, id).await?;
    let table = &dataset.table;
    let view = filter::apply(table, &spec);

    println!(
        "{} {} (id {})",
        "Dataset:".cyan().bold(),
        dataset.item.file_name.bold(),
        id
    );
    println!("  Rows: {} of {}", view.len(), table.len());

    let categories = filter::category_options(table);
    if !categories.is_empty() {
        println!("  Categories: {}, {}", ALL_CATEGORIES, categories.join(", "));
    }
    if let Some((start, end)) = filter::date_bounds(table) {
        println!("  Dates: {} to {}", start, end);
    }

    println!();
    println!("{}", "Averages (filtered):".cyan().bold());
    for (label, value) in filter::view_averages(&view.table) {
        println!("  {:<16} {}", label, format_average(value));
    }

    if !view.is_empty() {
        println!();
        println!("{}", format_rows(&view.table, rows));
    }

    println!();
    println!("{}", "Charts:".cyan().bold());
    for chart in charts::derive(&view.table) {
        let lines = charts::describe(&chart);
        if lines.is_empty() {
            println!("  {} {}", chart.title, "(no data)".dimmed());
            continue;
        }
        println!("  {}", chart.title);
        for line in lines.iter().take(CHART_LINES) {
            println!("    {}", line);
        }
    }

    println!();
    println!("{}", "Insights:".cyan().bold());
    for finding in insight::findings(&view.table) {
        println!("  - {}", finding);
    }

    Ok(())
}
