//! Chemviz CLI Library
//!
//! Command-line client for the chemviz server: upload equipment CSV files,
//! browse history, and explore a dataset locally.
//!
//! # Overview
//!
//! - **Session**: log in once, tokens are refreshed on demand (`chemviz login`)
//! - **Upload**: send a CSV and print its summary (`chemviz upload`)
//! - **History**: most recent uploads (`chemviz history`)
//! - **Explore**: filter a dataset, see averages and findings (`chemviz show`)
//! - **Report**: charts and a PDF for a (filtered) dataset (`chemviz report`)

pub mod api;
pub mod charts;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod insight;
pub mod report;
pub mod session;

// Re-export commonly used types
pub use error::{CliError, Result};
pub use session::Session;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Chemviz - Chemical Equipment Parameter Visualizer
#[derive(Parser, Debug)]
#[command(name = "chemviz")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Server URL
    #[arg(long, env = "CHEMVIZ_SERVER_URL", global = true)]
    pub server_url: Option<String>,

    /// Where the login session is stored
    #[arg(long, env = "CHEMVIZ_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,

    /// Print the CLI reference as Markdown
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        /// Account name
        #[arg(short, long, default_value = "admin")]
        username: String,

        /// Account password
        #[arg(short, long, env = "CHEMVIZ_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Upload a CSV file
    Upload {
        /// Path to the CSV file
        file: PathBuf,
    },

    /// List the most recent uploads
    History {
        /// Number of datasets to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Load a dataset, filter it and print averages and findings
    Show {
        /// Dataset id (see `chemviz history`)
        id: i64,

        #[command(flatten)]
        filters: FilterArgs,

        /// Number of rows to print
        #[arg(short, long, default_value = "10")]
        rows: usize,
    },

    /// Show the summary of the most recent upload
    Latest,

    /// Write a PDF report (and optionally chart PNGs) for a dataset
    Report {
        /// Dataset id (see `chemviz history`)
        id: i64,

        /// PDF file to write
        #[arg(short, long, default_value = "chemviz-report.pdf")]
        output: PathBuf,

        /// Also export the charts as PNG files into this directory
        #[arg(long)]
        charts_dir: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,
    },
}

/// Row filters shared by `show` and `report`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep rows on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Keep rows on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Keep rows of this equipment type ("All" keeps every row)
    #[arg(long)]
    pub category: Option<String>,

    /// Keep rows whose flow is at least this value
    #[arg(long)]
    pub min_flow: Option<f64>,
}

impl From<&FilterArgs> for filter::FilterSpec {
    fn from(args: &FilterArgs) -> Self {
        Self {
            start_date: args.start_date,
            end_date: args.end_date,
            category: args.category.clone(),
            threshold: args.min_flow.map(filter::NumericThreshold::flow),
        }
    }
}
