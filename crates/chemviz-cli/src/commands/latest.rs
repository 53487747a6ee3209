//! `chemviz latest` command implementation

use crate::api::ApiClient;
use crate::commands::print_summary;
use crate::config::Config;
use crate::error::Result;
use colored::Colorize;

/// Print the summary of the most recent upload
pub async fn run(config: &Config) -> Result<()> {
    let mut client = ApiClient::new(config)?;
    let latest = client.latest_summary().await?.latest_summary;

    println!("{} {}", "Latest dataset:".cyan().bold(), latest.file_name.bold());
    print_summary(&latest.summary);
    Ok(())
}
