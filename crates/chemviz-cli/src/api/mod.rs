//! API client module
//!
//! HTTP client for the chemviz server, with the session and the
//! refresh-on-401 retry.

pub mod client;
pub mod endpoints;

pub use client::{ApiClient, REFRESH_FAILED_MESSAGE};
pub use chemviz_common::types::{
    DatasetListItem, ErrorBody, LatestSummaryResponse, TokenPair, UploadResponse,
};
