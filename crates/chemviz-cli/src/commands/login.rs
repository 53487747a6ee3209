//! `chemviz login` command implementation

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::Result;
use colored::Colorize;

/// Obtain a token pair and store it as the session
pub async fn run(config: &Config, username: String, password: String) -> Result<()> {
    let mut client = ApiClient::new(config)?;
    client.login(&username, &password).await?;

    println!("{} Logged in as {}", "✓".green(), username.bold());
    println!("  Session: {}", config.session_file.display());
    Ok(())
}
