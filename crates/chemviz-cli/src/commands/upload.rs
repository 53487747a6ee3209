//! `chemviz upload` command implementation

use crate::api::ApiClient;
use crate::commands::print_summary;
use crate::config::Config;
use crate::error::{CliError, Result};
use colored::Colorize;
use std::path::Path;

/// Upload a CSV file and print the summary the server computed
pub async fn run(config: &Config, file: &Path) -> Result<()> {
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::config(format!("'{}' is not a file path", file.display())))?
        .to_string();

    let content = tokio::fs::read(file).await?;
    tracing::debug!(file = %file.display(), bytes = content.len(), "Uploading");

    let mut client = ApiClient::new(config)?;
    let response = client.upload(&file_name, content).await?;

    println!("{} {}: {}", "✓".green(), response.message, file_name.bold());
    println!();
    print_summary(&response.summary);
    Ok(())
}
