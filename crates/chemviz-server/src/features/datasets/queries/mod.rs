//! Dataset queries

pub mod download;
pub mod latest_summary;
pub mod list;

pub use download::{DownloadDatasetError, DownloadDatasetQuery, DownloadDatasetResponse};
pub use latest_summary::{LatestSummaryError, NO_DATASETS_MESSAGE};
pub use list::{ListDatasetsError, ListDatasetsQuery};
