//! Deployment models

use serde::{Deserialize, Serialize};

use crate::deploy::request::{Environment, PublishType};
use crate::errors::{DeployError, FailedFile};

/// A published artifact as recorded in the deployment log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Artifact identifier
    pub id: String,

    /// Public URL of the artifact root
    pub url: String,
}

/// Terminal report of a deployment
#[derive(Debug, Clone)]
pub struct DeploymentReport {
    /// True when every file was uploaded
    pub success: bool,

    pub project: String,

    /// Effective artifact identifier (`<latest>/<sub/path>` for appends)
    pub artifact_id: String,

    /// Latest artifact the files were appended to, if any
    pub appended_to: Option<String>,

    pub publish_type: PublishType,

    pub environment: Environment,

    /// Public URL of the published artifact
    pub public_url: String,

    /// Direct object store URL of the published artifact
    pub origin_url: String,

    /// Number of files uploaded
    pub succeeded: usize,

    /// Files that failed, with the reason
    pub failed: Vec<FailedFile>,

    /// Whether the deployment log was rewritten
    pub log_updated: bool,

    /// Why recording the artifact failed after every file was uploaded
    pub log_error: Option<String>,
}

impl DeploymentReport {
    /// Total number of files processed
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    /// Turn a failed report into [`DeployError::AggregateDeploymentFailure`]
    pub fn into_result(self) -> Result<DeploymentReport, DeployError> {
        if self.success {
            Ok(self)
        } else {
            Err(DeployError::AggregateDeploymentFailure {
                failed: self.failed,
            })
        }
    }
}
