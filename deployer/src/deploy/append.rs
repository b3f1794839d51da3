//! Append target resolution

use tracing::info;

use crate::deploy::request::{DeploymentRequest, DeploymentTarget};
use crate::errors::DeployError;
use crate::storage::publish_log::DeploymentLog;

/// Resolve where a request's files come from and which artifact they join
///
/// A plain publish targets the request's own artifact. An append nests both
/// the source directory and the artifact identifier under the append path,
/// rooted at the latest artifact recorded for the project.
pub fn resolve_target(
    request: &DeploymentRequest,
    log: &DeploymentLog,
) -> Result<DeploymentTarget, DeployError> {
    let Some(append_path) = request.append_path() else {
        return Ok(request.new_artifact_target());
    };

    let latest = log
        .latest(request.publish_type(), request.project())?
        .ok_or_else(|| DeployError::AppendTargetNotFound {
            project: request.project().to_string(),
            publish_type: request.publish_type().to_string(),
        })?;

    let source_dir = append_path
        .split('/')
        .fold(request.source_dir().to_path_buf(), |dir, part| dir.join(part));
    let artifact_id = format!("{}/{}", latest.id.trim_end_matches('/'), append_path);

    info!(
        "Appending {} to latest artifact {} of {}",
        append_path,
        latest.id,
        request.project()
    );

    Ok(DeploymentTarget {
        source_dir,
        artifact_id,
        appended_to: Some(latest.id),
    })
}
