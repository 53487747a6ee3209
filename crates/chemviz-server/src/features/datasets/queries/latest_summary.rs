//! Latest summary query
//!
//! Picks the most recent dataset and summarizes the file currently stored
//! under its name in the media directory, not the stored raw text. A later
//! upload reusing the name therefore changes what this returns.

use chemviz_common::{ingest, summary, summary::LatestSummary, types::LatestSummaryResponse};
use chemviz_common::ChemvizError;
use sqlx::SqlitePool;

use crate::db::{datasets, DbError};
use crate::storage::Storage;

pub const NO_DATASETS_MESSAGE: &str = "No datasets found";

#[derive(Debug, thiserror::Error)]
pub enum LatestSummaryError {
    #[error("{}", NO_DATASETS_MESSAGE)]
    NoDatasets,
    #[error("Could not read CSV: {0}")]
    Read(#[from] anyhow::Error),
    #[error(transparent)]
    Parse(#[from] ChemvizError),
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

#[tracing::instrument(skip(pool, storage))]
pub async fn handle(
    pool: SqlitePool,
    storage: Storage,
) -> Result<LatestSummaryResponse, LatestSummaryError> {
    let latest = datasets::latest(&pool)
        .await?
        .ok_or(LatestSummaryError::NoDatasets)?;

    let raw = storage.download(&latest.file_name).await?;
    let table = ingest::parse_bytes(&raw)?;

    tracing::debug!(id = latest.id, file_name = %latest.file_name, "Recomputed latest summary");

    Ok(LatestSummaryResponse {
        latest_summary: LatestSummary {
            summary: summary::compute(&table),
            file_name: latest.file_name,
        },
    })
}
