//! Deployer entry point composition

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use crate::app::options::CliOptions;
use crate::deploy::console::ConsoleObserver;
use crate::deploy::events::{DeployEvent, DeployObserver, TracingObserver};
use crate::deploy::orchestrator::{Deployer, DeployerOptions};
use crate::deploy::request::{DeploymentParams, DeploymentRequest};
use crate::errors::DeployError;
use crate::filesys::file::File;
use crate::models::deployment::DeploymentReport;
use crate::remote::http::{HttpObjectStore, HttpStoreOptions};
use crate::remote::local::LocalObjectStore;
use crate::remote::ObjectStore;
use crate::storage::settings::Settings;
use crate::utils::generate_artifact_id;

/// Build the validated request for an invocation
pub fn build_request(
    options: &CliOptions,
    settings: &Settings,
) -> Result<DeploymentRequest, DeployError> {
    let project = match &options.project {
        Some(project) => project.clone(),
        None => default_project_name()?,
    };
    let artifact_id = options
        .artifact
        .clone()
        .unwrap_or_else(generate_artifact_id);
    let public_base_url = settings
        .target(options.environment)
        .public_url(options.publish_type)
        .to_string();

    DeploymentRequest::new(DeploymentParams {
        source_dir: options.source.clone().unwrap_or_default(),
        project,
        artifact_id,
        publish_type: options.publish_type,
        environment: options.environment,
        public_base_url,
        append_path: options.append.clone(),
    })
}

/// Current directory name, the conventional project identifier
fn default_project_name() -> Result<String, DeployError> {
    let cwd = std::env::current_dir()?;
    Ok(cwd
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default())
}

/// Object store for an invocation
pub fn build_store(
    options: &CliOptions,
    settings: &Settings,
) -> Result<Arc<dyn ObjectStore>, DeployError> {
    if let Some(dir) = &options.dry_run {
        info!("Dry run, mirroring uploads into {}", dir.display());
        return Ok(Arc::new(LocalObjectStore::new(dir)));
    }

    let target = settings.target(options.environment);
    let store = HttpObjectStore::new(HttpStoreOptions {
        endpoint: target.endpoint.clone(),
        bucket: target.bucket.clone(),
        token: target.token(),
        timeout: Duration::from_secs(settings.request_timeout_secs),
    })?;
    Ok(Arc::new(store))
}

/// Run one deployment and return its report
///
/// A report whose `success` is false is still returned as `Ok`; the caller
/// decides how to surface it.
pub async fn run(options: CliOptions, settings: Settings) -> anyhow::Result<DeploymentReport> {
    let request = build_request(&options, &settings).context("invalid deployment request")?;
    let store = build_store(&options, &settings).context("unable to set up the object store")?;

    info!(
        "Deploying {} ({}) to {}",
        request.project(),
        request.publish_type(),
        request.environment()
    );

    let deployer = Deployer::new(
        store,
        DeployerOptions {
            log_file: File::new(&settings.publish_log),
            publish_roots: settings.publish_roots.clone(),
            max_concurrent_uploads: settings.max_concurrent_uploads,
        },
    )
    .with_observer(Arc::new(ReportingObserver));

    let report = deployer
        .deploy(&request)
        .await
        .with_context(|| format!("deployment of {} aborted", request.project()))?;
    Ok(report)
}

/// Console output for people, tracing for the log file
struct ReportingObserver;

impl DeployObserver for ReportingObserver {
    fn on_event(&self, event: &DeployEvent) {
        ConsoleObserver.on_event(event);
        if matches!(
            event,
            DeployEvent::Started { .. } | DeployEvent::Discovered { .. } | DeployEvent::Finished(_)
        ) {
            TracingObserver.on_event(event);
        }
    }
}
