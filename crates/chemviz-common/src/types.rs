//! Request and response bodies shared by the server and the client

use crate::summary::{LatestSummary, Summary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a dataset by the server
pub type DatasetId = i64;

/// Dataset metadata as listed by `GET datasets/` (no raw CSV)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetListItem {
    pub id: DatasetId,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub summary: Summary,
}

/// Body of a successful `POST upload/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub summary: Summary,
}

/// Body of `GET latest_summary/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestSummaryResponse {
    pub latest_summary: LatestSummary,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// `POST token/` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// `POST token/` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// `POST token/refresh/` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// `POST token/refresh/` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access: String,
}
