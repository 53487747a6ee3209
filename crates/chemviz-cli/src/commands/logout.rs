//! `chemviz logout` command implementation

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::Result;
use colored::Colorize;

/// Forget the stored session
pub async fn run(config: &Config) -> Result<()> {
    let mut client = ApiClient::new(config)?;
    let had_session = client.session().is_some();
    client.logout()?;

    if had_session {
        println!("{} Logged out", "✓".green());
    } else {
        println!("Not logged in.");
    }
    Ok(())
}
