//! List datasets query
//!
//! Most recent first. Each item carries the summary stored at upload time,
//! never the raw text.

use chemviz_common::types::DatasetListItem;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::{datasets, DbError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDatasetsQuery {
    /// Return at most this many datasets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListDatasetsError {
    #[error("limit must not be negative")]
    NegativeLimit,
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl ListDatasetsQuery {
    pub fn validate(&self) -> Result<(), ListDatasetsError> {
        match self.limit {
            Some(limit) if limit < 0 => Err(ListDatasetsError::NegativeLimit),
            _ => Ok(()),
        }
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: SqlitePool,
    query: ListDatasetsQuery,
) -> Result<Vec<DatasetListItem>, ListDatasetsError> {
    query.validate()?;

    let rows = datasets::list(&pool, query.limit).await?;
    Ok(rows.into_iter().map(DatasetListItem::from).collect())
}
