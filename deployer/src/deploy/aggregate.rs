//! Upload result aggregation

use tracing::{info, warn};

use crate::deploy::request::DeploymentRequest;
use crate::deploy::uploader::UploadOutcome;
use crate::errors::{DeployError, FailedFile};
use crate::models::deployment::ArtifactRecord;
use crate::storage::publish_log::{DeploymentLog, DeploymentLogStore};

/// Outcome of a whole batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: Vec<FailedFile>,
}

impl BatchSummary {
    /// Fold per-file outcomes into a summary
    pub fn from_outcomes(outcomes: Vec<UploadOutcome>) -> Self {
        let mut succeeded = 0;
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome {
                UploadOutcome::Uploaded { .. } => succeeded += 1,
                UploadOutcome::Failed(file) => failed.push(file),
            }
        }
        Self { succeeded, failed }
    }

    /// A batch succeeds only if no file failed
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Record a successful publish in the deployment log
///
/// Nothing is written when any file failed, so a failed deployment never
/// changes the recorded history. Appends extend an existing artifact and
/// are not recorded either. Returns whether the log file was rewritten.
pub async fn record_if_successful(
    summary: &BatchSummary,
    request: &DeploymentRequest,
    artifact_url: &str,
    mut log: DeploymentLog,
    log_store: &DeploymentLogStore,
) -> Result<bool, DeployError> {
    if !summary.is_success() {
        warn!(
            "{} of {} files failed, deployment log left untouched",
            summary.failed.len(),
            summary.succeeded + summary.failed.len()
        );
        return Ok(false);
    }

    if request.is_append() {
        info!("Append complete, no new artifact to record");
        return Ok(false);
    }

    log.append_record(
        request.publish_type(),
        request.project(),
        ArtifactRecord {
            id: request.artifact_id().to_string(),
            url: artifact_url.to_string(),
        },
    )?;
    log_store.persist(&log).await?;

    info!(
        "Recorded {} for {} in {}",
        request.artifact_id(),
        request.project(),
        log_store.file().path().display()
    );
    Ok(true)
}
