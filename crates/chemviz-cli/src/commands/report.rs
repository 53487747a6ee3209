//! `chemviz report` command implementation

use crate::api::ApiClient;
use crate::charts;
use crate::commands::load_dataset;
use crate::config::Config;
use crate::error::Result;
use crate::filter::{self, FilterSpec};
use crate::report::{write_report, ReportInput};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Write the PDF report for dataset `id`, and the chart PNGs when asked
pub async fn run(
    config: &Config,
    id: i64,
    output: &Path,
    charts_dir: Option<PathBuf>,
    spec: FilterSpec,
) -> Result<()> {
    let mut client = ApiClient::new(config)?;
    let dataset = load_dataset(&mut client, id).await?;

    let view = filter::apply(&dataset.table, &spec);
    let table = if spec.is_active() {
        &view.table
    } else {
        &dataset.table
    };

    let rendered = charts::render_all(&charts::derive(table));
    for chart in &rendered {
        if let Err(e) = &chart.outcome {
            println!("{} {} unavailable: {}", "!".yellow(), chart.title, e);
        }
    }

    if let Some(dir) = charts_dir {
        let written = charts::export_png(&rendered, &dir)?;
        println!(
            "{} Exported {} chart(s) to {}",
            "✓".green(),
            written.len(),
            dir.display()
        );
    }

    write_report(
        &ReportInput {
            file_name: &dataset.item.file_name,
            generated_at: chrono::Local::now().naive_local(),
            table,
            charts: &rendered,
            summary: &dataset.item.summary,
        },
        output,
    )?;

    println!("{} Report written to {}", "✓".green(), output.display());
    Ok(())
}
