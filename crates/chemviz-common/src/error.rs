//! Error types for chemviz

use thiserror::Error;

/// Result type alias for chemviz operations
pub type Result<T> = std::result::Result<T, ChemvizError>;

/// Why uploaded bytes could not become a table
#[derive(Error, Debug)]
pub enum ChemvizError {
    #[error("Could not parse CSV: {0}")]
    Parse(String),
}

impl ChemvizError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
