//! Deployment progress events and observers

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::deploy::request::Environment;
use crate::errors::UploadError;
use crate::models::deployment::DeploymentReport;

/// Progress event emitted during a deployment
#[derive(Debug, Clone)]
pub enum DeployEvent {
    /// The target is resolved and uploading is about to begin
    Started {
        project: String,
        artifact_id: String,
        environment: Environment,
        /// Latest artifact being appended to, for appends
        appended_to: Option<String>,
    },

    /// Files found in the source directory
    Discovered { total: usize },

    /// One file reached the store; `completed` counts in completion order
    FileUploaded {
        completed: usize,
        total: usize,
        public_url: String,
    },

    /// One file failed
    FileFailed {
        completed: usize,
        total: usize,
        path: PathBuf,
        error: UploadError,
    },

    /// Every file has been processed
    Finished(Box<DeploymentReport>),
}

/// Receives deployment progress
///
/// Called from concurrent upload tasks, so implementations must not block.
pub trait DeployObserver: Send + Sync {
    fn on_event(&self, event: &DeployEvent);
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DeployObserver for NoopObserver {
    fn on_event(&self, _event: &DeployEvent) {}
}

/// Observer that writes events to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DeployObserver for TracingObserver {
    fn on_event(&self, event: &DeployEvent) {
        match event {
            DeployEvent::Started {
                project,
                artifact_id,
                environment,
                appended_to,
            } => match appended_to {
                Some(latest) => info!(
                    project = %project,
                    environment = %environment,
                    "Appending files to {} as {}", latest, artifact_id
                ),
                None => info!(
                    project = %project,
                    environment = %environment,
                    "Uploading files as {}", artifact_id
                ),
            },
            DeployEvent::Discovered { total } => info!("Found {} files to upload", total),
            DeployEvent::FileUploaded {
                completed,
                total,
                public_url,
            } => info!("[{}/{}] {}", completed, total, public_url),
            DeployEvent::FileFailed {
                completed,
                total,
                path,
                error,
            } => error!("[{}/{}] {}: {}", completed, total, path.display(), error),
            DeployEvent::Finished(report) => {
                if let Some(e) = &report.log_error {
                    warn!(
                        "Published {} files to {} but the deployment log was not updated: {}",
                        report.succeeded, report.public_url, e
                    );
                } else if report.success {
                    info!(
                        "Published {} files to {}",
                        report.succeeded, report.public_url
                    );
                } else {
                    warn!(
                        "Deployment failed: {} of {} files were not uploaded",
                        report.failed.len(),
                        report.total()
                    );
                }
            }
        }
    }
}

/// Observer that forwards events to a channel
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<DeployEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DeployEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DeployObserver for ChannelObserver {
    fn on_event(&self, event: &DeployEvent) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.tx.send(event.clone());
    }
}
