use axum::{
    extract::{
        multipart::MultipartRejection, DefaultBodyLimit, Extension, Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chemviz_common::types::DatasetId;

use super::{
    commands::{upload, UploadDatasetCommand, UploadDatasetError},
    queries::{
        download, latest_summary, list, DownloadDatasetError, DownloadDatasetQuery,
        LatestSummaryError, ListDatasetsError, ListDatasetsQuery,
    },
};
use crate::error::AppError;
use crate::features::FeatureState;
use crate::middleware::auth::AuthUser;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Dataset routes, relative to the API root
pub fn datasets_routes() -> Router<FeatureState> {
    Router::new()
        .route("/upload/", post(upload_dataset))
        .route("/datasets/", get(list_datasets))
        .route("/download/:id/", get(download_dataset))
        .route("/latest_summary/", get(get_latest_summary))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /upload/ (multipart, field `file`)
#[tracing::instrument(skip_all, fields(user = %user.0))]
async fn upload_dataset(
    State(state): State<FeatureState>,
    Extension(user): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, DatasetApiError> {
    // A body that is not multipart at all carries no file either.
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "Upload without multipart body");
        UploadDatasetError::FileRequired
    })?;

    let mut file_name: Option<String> = None;
    let mut content: Vec<u8> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file bytes: {}", e)))?;
            content = data.to_vec();
        }
    }

    let command = UploadDatasetCommand { file_name, content };
    let response = upload::handle(state.db, state.storage, command).await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// GET /datasets/?limit=N
async fn list_datasets(
    State(state): State<FeatureState>,
    Query(query): Query<ListDatasetsQuery>,
) -> Result<Response, DatasetApiError> {
    let items = list::handle(state.db, query).await?;
    Ok((StatusCode::OK, Json(items)).into_response())
}

/// GET /download/:id/ returns the stored CSV text as-is
#[tracing::instrument(skip(state))]
async fn download_dataset(
    State(state): State<FeatureState>,
    Path(id): Path<DatasetId>,
) -> Result<Response, DatasetApiError> {
    let response = download::handle(state.db, DownloadDatasetQuery { id }).await?;

    tracing::debug!(id, file_name = %response.file_name, "Serving raw CSV");

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        response.raw_csv,
    )
        .into_response())
}

/// GET /latest_summary/
async fn get_latest_summary(
    State(state): State<FeatureState>,
) -> Result<Response, DatasetApiError> {
    let response = latest_summary::handle(state.db, state.storage).await?;
    Ok((StatusCode::OK, Json(response)).into_response())
}

#[derive(Debug)]
enum DatasetApiError {
    Upload(UploadDatasetError),
    List(ListDatasetsError),
    Download(DownloadDatasetError),
    LatestSummary(LatestSummaryError),
    Request(AppError),
}

impl From<UploadDatasetError> for DatasetApiError {
    fn from(err: UploadDatasetError) -> Self {
        Self::Upload(err)
    }
}

impl From<ListDatasetsError> for DatasetApiError {
    fn from(err: ListDatasetsError) -> Self {
        Self::List(err)
    }
}

impl From<DownloadDatasetError> for DatasetApiError {
    fn from(err: DownloadDatasetError) -> Self {
        Self::Download(err)
    }
}

impl From<LatestSummaryError> for DatasetApiError {
    fn from(err: LatestSummaryError) -> Self {
        Self::LatestSummary(err)
    }
}

impl From<AppError> for DatasetApiError {
    fn from(err: AppError) -> Self {
        Self::Request(err)
    }
}

impl From<DatasetApiError> for AppError {
    fn from(err: DatasetApiError) -> Self {
        match err {
            DatasetApiError::Upload(UploadDatasetError::FileRequired) => {
                AppError::Validation(UploadDatasetError::FileRequired.to_string())
            },
            DatasetApiError::Upload(UploadDatasetError::Parse(e)) => e.into(),
            DatasetApiError::Upload(e @ UploadDatasetError::Storage(_))
            | DatasetApiError::Upload(e @ UploadDatasetError::Database(_)) => {
                AppError::Persistence(e.to_string())
            },

            DatasetApiError::List(e @ ListDatasetsError::NegativeLimit) => {
                AppError::Validation(e.to_string())
            },
            DatasetApiError::List(ListDatasetsError::Database(e)) => e.into(),

            DatasetApiError::Download(e @ DownloadDatasetError::NotFound) => {
                AppError::NotFound(e.to_string())
            },
            DatasetApiError::Download(DownloadDatasetError::Database(e)) => e.into(),

            DatasetApiError::LatestSummary(e @ LatestSummaryError::NoDatasets) => {
                AppError::NotFound(e.to_string())
            },
            DatasetApiError::LatestSummary(e @ LatestSummaryError::Read(_))
            | DatasetApiError::LatestSummary(e @ LatestSummaryError::Parse(_)) => {
                AppError::Internal(e.to_string())
            },
            DatasetApiError::LatestSummary(LatestSummaryError::Database(e)) => e.into(),

            DatasetApiError::Request(e) => e,
        }
    }
}

impl IntoResponse for DatasetApiError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemviz_common::ChemvizError;

    fn status_of(err: DatasetApiError) -> StatusCode {
        AppError::from(err).status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(UploadDatasetError::FileRequired.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(UploadDatasetError::Parse(ChemvizError::parse("bad")).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(UploadDatasetError::Storage(anyhow::anyhow!("disk full")).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(DownloadDatasetError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(LatestSummaryError::NoDatasets.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ListDatasetsError::NegativeLimit.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_routes_structure() {
        let router = datasets_routes();
        assert!(format!("{:?}", router).contains("Router"));
    }
}
