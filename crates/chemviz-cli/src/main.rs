//! Chemviz CLI - Main entry point

use chemviz_cli::config::Config;
use chemviz_cli::{Cli, Commands};
use chemviz_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use clap::Parser;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Handle markdown help generation
    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    // Ensure a command is provided
    if cli.command.is_none() {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    }

    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("chemviz-cli")
        .console_stderr(true)
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // CLI should work without logging
    let _guard = init_logging(&log_config).ok().flatten();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "No .env file loaded");
    }

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Resolve configuration: environment first, then command-line flags.
fn resolve_config(cli: &Cli) -> chemviz_cli::Result<Config> {
    let mut config = Config::from_env()?;

    if let Some(url) = &cli.server_url {
        config.server_url = url.clone();
    }
    if let Some(path) = &cli.session_file {
        config.session_file = path.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> chemviz_cli::Result<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };
    let config = resolve_config(cli)?;

    match command {
        Commands::Login { username, password } => {
            chemviz_cli::commands::login::run(&config, username.clone(), password.clone()).await
        },

        Commands::Logout => chemviz_cli::commands::logout::run(&config).await,

        Commands::Upload { file } => chemviz_cli::commands::upload::run(&config, file).await,

        Commands::History { limit } => {
            chemviz_cli::commands::history::run(&config, *limit).await
        },

        Commands::Show { id, filters, rows } => {
            chemviz_cli::commands::show::run(&config, *id, filters.into(), *rows).await
        },

        Commands::Latest => chemviz_cli::commands::latest::run(&config).await,

        Commands::Report {
            id,
            output,
            charts_dir,
            filters,
        } => {
            chemviz_cli::commands::report::run(
                &config,
                *id,
                output,
                charts_dir.clone(),
                filters.into(),
            )
            .await
        },
    }
}
