//! Download raw CSV query

use chemviz_common::types::DatasetId;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::{datasets, DbError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadDatasetQuery {
    pub id: DatasetId,
}

#[derive(Debug, Clone)]
pub struct DownloadDatasetResponse {
    pub file_name: String,
    pub raw_csv: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadDatasetError {
    #[error("{}", datasets::DATASET_NOT_FOUND)]
    NotFound,
    #[error("Database error: {0}")]
    Database(DbError),
}

impl From<DbError> for DownloadDatasetError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(_) => Self::NotFound,
            other => Self::Database(other),
        }
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: SqlitePool,
    query: DownloadDatasetQuery,
) -> Result<DownloadDatasetResponse, DownloadDatasetError> {
    let record = datasets::get(&pool, query.id).await?;

    Ok(DownloadDatasetResponse {
        file_name: record.file_name,
        raw_csv: record.raw_csv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_conversion() {
        let err = DownloadDatasetError::from(DbError::not_found("Dataset", "3"));
        assert!(matches!(err, DownloadDatasetError::NotFound));
        assert_eq!(err.to_string(), "Dataset not found");
    }
}
