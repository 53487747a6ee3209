use chemviz_common::{ingest, summary, types::UploadResponse, ChemvizError};
use sqlx::SqlitePool;

use crate::db::{datasets, DbError};
use crate::storage::Storage;

/// Message returned with the summary of a stored upload.
pub const UPLOAD_SUCCESS_MESSAGE: &str = "Uploaded successfully";

#[derive(Debug, Clone)]
pub struct UploadDatasetCommand {
    /// Client-supplied file name of the `file` part, if one was sent
    pub file_name: Option<String>,
    pub content: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadDatasetError {
    #[error("No file uploaded")]
    FileRequired,
    #[error(transparent)]
    Parse(#[from] ChemvizError),
    #[error("Could not save CSV: {0}")]
    Storage(#[from] anyhow::Error),
    #[error("Could not save to database: {0}")]
    Database(#[from] DbError),
}

impl UploadDatasetCommand {
    pub fn validate(&self) -> Result<(), UploadDatasetError> {
        match self.file_name.as_deref() {
            Some(name) if !name.trim().is_empty() => {},
            _ => return Err(UploadDatasetError::FileRequired),
        }
        Ok(())
    }
}

/// Store the file, parse and summarize it, then persist the record.
///
/// Any failure aborts the upload; nothing is written to the database unless
/// parsing succeeded.
#[tracing::instrument(skip(pool, storage, command), fields(file_name = ?command.file_name))]
pub async fn handle(
    pool: SqlitePool,
    storage: Storage,
    command: UploadDatasetCommand,
) -> Result<UploadResponse, UploadDatasetError> {
    command.validate()?;

    let key = command
        .file_name
        .as_deref()
        .and_then(|name| storage.build_key(name))
        .ok_or(UploadDatasetError::FileRequired)?;

    storage.upload(&key, &command.content).await?;

    let table = ingest::parse_bytes(&command.content)?;
    let summary = summary::compute(&table);
    let raw_csv = ingest::decode(&command.content);

    let id = datasets::insert(
        &pool,
        datasets::NewDataset {
            file_name: &key,
            raw_csv: &raw_csv,
            summary: &summary,
        },
    )
    .await?;

    tracing::info!(
        id,
        file_name = %key,
        total_rows = summary.total_rows,
        "Dataset uploaded"
    );

    Ok(UploadResponse {
        message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        summary,
    })
}
