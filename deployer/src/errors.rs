//! Error types for the deployer

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for a deployment
///
/// Only request-level problems surface here. Failures of individual files
/// are captured as [`UploadError`] inside the upload outcomes and are folded
/// into [`DeployError::AggregateDeploymentFailure`] by the aggregator.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("File name is not valid UTF-8 and cannot become an object key: {}", .0.display())]
    InvalidFileName(PathBuf),

    #[error("Cannot append to a non-existent artifact: project '{project}' has no published {publish_type} artifacts")]
    AppendTargetNotFound {
        project: String,
        publish_type: String,
    },

    #[error("Deployment log is malformed: {0}")]
    LogFormat(String),

    #[error("Deployment failed: {} file(s) were not uploaded", failed.len())]
    AggregateDeploymentFailure { failed: Vec<FailedFile> },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a single file did not make it to the remote store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("read error: {0}")]
    FileRead(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// A file that failed to upload, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: UploadError,
}

impl std::fmt::Display for FailedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}
