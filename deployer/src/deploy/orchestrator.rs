//! Deployment orchestrator
//!
//! Sequences a single deployment: validate, resolve the append target,
//! discover files, upload them, then decide and record the result.

use std::sync::Arc;

use tracing::{error, info};

use crate::deploy::aggregate::{record_if_successful, BatchSummary};
use crate::deploy::append::resolve_target;
use crate::deploy::discovery::discover_files;
use crate::deploy::events::{DeployEvent, DeployObserver, NoopObserver};
use crate::deploy::request::DeploymentRequest;
use crate::deploy::uploader::{plan_transfers, UploadEngine, DEFAULT_MAX_CONCURRENT_UPLOADS};
use crate::errors::DeployError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;
use crate::models::deployment::DeploymentReport;
use crate::remote::ObjectStore;
use crate::storage::publish_log::DeploymentLogStore;
use crate::storage::settings::PublishRoots;
use crate::utils::join_segments;

/// Deployer options
#[derive(Debug, Clone)]
pub struct DeployerOptions {
    /// Deployment log file
    pub log_file: File,

    /// Remote root prefix per publish type
    pub publish_roots: PublishRoots,

    /// Maximum simultaneously in-flight uploads
    pub max_concurrent_uploads: usize,
}

impl Default for DeployerOptions {
    fn default() -> Self {
        Self {
            log_file: File::new("config.json"),
            publish_roots: PublishRoots::default(),
            max_concurrent_uploads: DEFAULT_MAX_CONCURRENT_UPLOADS,
        }
    }
}

/// Publishes build output to an object store
pub struct Deployer {
    store: Arc<dyn ObjectStore>,
    engine: UploadEngine,
    log_store: DeploymentLogStore,
    publish_roots: PublishRoots,
    observer: Arc<dyn DeployObserver>,
}

impl Deployer {
    /// Create a deployer that reports nowhere
    pub fn new(store: Arc<dyn ObjectStore>, options: DeployerOptions) -> Self {
        Self {
            engine: UploadEngine::new(Arc::clone(&store), options.max_concurrent_uploads),
            store,
            log_store: DeploymentLogStore::new(options.log_file),
            publish_roots: options.publish_roots,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Report progress to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn DeployObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Deploy one request
    ///
    /// Resolves once every file has been processed. Request-level problems
    /// (missing source, unknown append target, unreadable log) are returned
    /// as errors before anything is uploaded; per-file failures and a failed
    /// log write only show up in the returned report, see
    /// [`DeploymentReport::into_result`].
    pub async fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentReport, DeployError> {
        if !Dir::new(request.source_dir()).exists().await {
            error!("Source directory {} does not exist", request.source_dir().display());
            return Err(DeployError::PathNotFound(request.source_dir().to_path_buf()));
        }

        let log = self.log_store.load().await?;
        let target = resolve_target(request, &log)?;

        let files = discover_files(&target.source_dir).await?;
        self.observer.on_event(&DeployEvent::Started {
            project: request.project().to_string(),
            artifact_id: target.artifact_id.clone(),
            environment: request.environment(),
            appended_to: target.appended_to.clone(),
        });
        self.observer
            .on_event(&DeployEvent::Discovered { total: files.len() });

        let remote_root = self.publish_roots.for_type(request.publish_type());
        let remote_prefix = join_segments(remote_root, &[request.project(), &target.artifact_id]);
        let public_url = join_segments(
            request.public_base_url(),
            &[request.project(), &target.artifact_id],
        );

        let tasks = plan_transfers(files, &remote_prefix, &public_url);
        let outcomes = self
            .engine
            .upload_all(tasks, Arc::clone(&self.observer))
            .await;

        let summary = BatchSummary::from_outcomes(outcomes);
        let artifact_url = join_segments(
            request.public_base_url(),
            &[request.project(), request.artifact_id()],
        );
        // The files are live by now; a log write failure goes into the report
        let (log_updated, log_error) =
            match record_if_successful(&summary, request, &artifact_url, log, &self.log_store)
                .await
            {
                Ok(updated) => (updated, None),
                Err(e) => {
                    error!(
                        "Unable to record {} in {}: {}",
                        request.artifact_id(),
                        self.log_store.file().path().display(),
                        e
                    );
                    (false, Some(e.to_string()))
                }
            };

        let report = DeploymentReport {
            success: summary.is_success(),
            project: request.project().to_string(),
            artifact_id: target.artifact_id,
            appended_to: target.appended_to,
            publish_type: request.publish_type(),
            environment: request.environment(),
            public_url,
            origin_url: self.store.origin_url(&remote_prefix),
            succeeded: summary.succeeded,
            failed: summary.failed,
            log_updated,
            log_error,
        };

        if report.success {
            info!(
                "Deployment of {} succeeded: {}/{} files",
                report.project,
                report.succeeded,
                report.total()
            );
        } else {
            error!(
                "Deployment of {} failed: {} succeeded, {} failed",
                report.project,
                report.succeeded,
                report.failed.len()
            );
        }

        self.observer
            .on_event(&DeployEvent::Finished(Box::new(report.clone())));
        Ok(report)
    }
}
