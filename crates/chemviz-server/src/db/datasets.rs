//! Dataset store
//!
//! Append-only: records are inserted on upload and read back by id, by
//! recency, or as the single most recent one. The summary is stored as JSON
//! next to the raw text so listings never re-parse CSV.

use chemviz_common::{types::DatasetId, Summary};
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, SqlitePool};

use super::{DbError, DbResult};

/// Message returned when an id does not resolve.
pub const DATASET_NOT_FOUND: &str = "Dataset not found";

/// A stored dataset including its raw CSV text
#[derive(Debug, Clone, FromRow)]
pub struct DatasetRecord {
    pub id: DatasetId,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub raw_csv: String,
    pub summary: Json<Summary>,
}

/// Dataset metadata without the raw text
#[derive(Debug, Clone, FromRow)]
pub struct DatasetMeta {
    pub id: DatasetId,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub summary: Json<Summary>,
}

impl From<DatasetMeta> for chemviz_common::types::DatasetListItem {
    fn from(meta: DatasetMeta) -> Self {
        Self {
            id: meta.id,
            file_name: meta.file_name,
            uploaded_at: meta.uploaded_at,
            summary: meta.summary.0,
        }
    }
}

/// Values needed to insert a dataset
#[derive(Debug, Clone)]
pub struct NewDataset<'a> {
    pub file_name: &'a str,
    pub raw_csv: &'a str,
    pub summary: &'a Summary,
}

/// Insert a dataset stamped with the current time and return its id.
#[tracing::instrument(skip(pool, dataset), fields(file_name = %dataset.file_name))]
pub async fn insert(pool: &SqlitePool, dataset: NewDataset<'_>) -> DbResult<DatasetId> {
    let uploaded_at = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO datasets (file_name, uploaded_at, raw_csv, summary)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(dataset.file_name)
    .bind(uploaded_at)
    .bind(dataset.raw_csv)
    .bind(Json(dataset.summary))
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    tracing::debug!(id, "Dataset inserted");
    Ok(id)
}

/// Datasets ordered most recent first, optionally limited to `limit` entries.
pub async fn list(pool: &SqlitePool, limit: Option<i64>) -> DbResult<Vec<DatasetMeta>> {
    // SQLite treats a negative LIMIT as "no limit".
    let limit = limit.unwrap_or(-1);

    let rows = sqlx::query_as::<_, DatasetMeta>(
        r#"
        SELECT id, file_name, uploaded_at, summary
        FROM datasets
        ORDER BY uploaded_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get(pool: &SqlitePool, id: DatasetId) -> DbResult<DatasetRecord> {
    sqlx::query_as::<_, DatasetRecord>(
        r#"
        SELECT id, file_name, uploaded_at, raw_csv, summary
        FROM datasets
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DbError::NotFound(DATASET_NOT_FOUND.to_string()))
}

/// The most recently uploaded dataset, if any.
pub async fn latest(pool: &SqlitePool) -> DbResult<Option<DatasetMeta>> {
    let row = sqlx::query_as::<_, DatasetMeta>(
        r#"
        SELECT id, file_name, uploaded_at, summary
        FROM datasets
        ORDER BY uploaded_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
