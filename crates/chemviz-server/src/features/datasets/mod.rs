//! Dataset feature: upload, history, raw download and latest summary

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{UploadDatasetCommand, UploadDatasetError};
pub use queries::{
    DownloadDatasetError, DownloadDatasetQuery, DownloadDatasetResponse, LatestSummaryError,
    ListDatasetsError, ListDatasetsQuery,
};
pub use routes::datasets_routes;
