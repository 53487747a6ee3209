//! Chemviz Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared data model, CSV ingestion and summary computation for the chemviz
//! server and client.
//!
//! # Overview
//!
//! - **Table**: rows × named columns with possibly missing cells (`table`)
//! - **Ingestion**: tolerant CSV parsing of uploaded bytes (`ingest`)
//! - **Summary**: row count, columns, preview, type distribution, averages (`summary`)
//! - **Wire types**: request/response bodies shared by server and client (`types`)
//! - **Error Handling**: the CSV parse error (`error`)
//!
//! # Example
//!
//! ```no_run
//! use chemviz_common::{ingest, summary};
//!
//! fn summarize(bytes: &[u8]) -> chemviz_common::Result<()> {
//!     let table = ingest::parse_bytes(bytes)?;
//!     let summary = summary::compute(&table);
//!     println!("{} rows", summary.total_rows);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod ingest;
pub mod logging;
pub mod summary;
pub mod table;
pub mod types;

// Re-export commonly used types
pub use error::{ChemvizError, Result};
pub use summary::Summary;
pub use table::{Cell, Table};
