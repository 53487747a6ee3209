//! Dataset commands

pub mod upload;

pub use upload::{UploadDatasetCommand, UploadDatasetError, UPLOAD_SUCCESS_MESSAGE};
