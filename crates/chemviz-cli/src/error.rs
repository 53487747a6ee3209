//! Error types for the chemviz CLI
//!
//! Messages are user-facing: they say what went wrong and what to do next.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Server answered with an error body
    #[error("Server error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Credentials missing, rejected, or no longer refreshable
    #[error("Authentication required: {0}. Run 'chemviz login' to sign in again.")]
    Auth(String),

    /// Requested dataset does not exist
    #[error("Not found: {0}. Run 'chemviz history' to list available datasets.")]
    NotFound(String),

    /// Downloaded CSV could not be turned into a table
    #[error("Could not load dataset: {0}")]
    Ingest(#[from] chemviz_common::ChemvizError),

    /// Report or chart export failed
    #[error("Report generation failed: {0}")]
    Report(String),

    /// HTTP request failed
    #[error("Network request failed: {0}. Check that the server is running and CHEMVIZ_SERVER_URL is correct.")]
    Http(#[from] reqwest::Error),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables.")]
    Config(String),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<lopdf::Error> for CliError {
    fn from(err: lopdf::Error) -> Self {
        Self::Report(err.to_string())
    }
}

impl From<image::ImageError> for CliError {
    fn from(err: image::ImageError) -> Self {
        Self::Report(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_actionable() {
        let err = CliError::auth("Token refresh failed");
        assert!(err.to_string().contains("chemviz login"));

        let err = CliError::api(500, "Could not save CSV: disk full");
        assert_eq!(err.to_string(), "Server error (500): Could not save CSV: disk full");

        let err = CliError::not_found("Dataset not found");
        assert!(err.to_string().contains("chemviz history"));
    }
}
