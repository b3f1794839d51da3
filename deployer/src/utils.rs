//! Utility functions

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Version information for the deployer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Generate a sortable artifact identifier from the current local time
pub fn generate_artifact_id() -> String {
    artifact_id_at(&Local::now())
}

/// Artifact identifier for a given instant: `build-YYYY-MM-DD_HH-MM-SS`
pub fn artifact_id_at<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("build-%Y-%m-%d_%H-%M-%S").to_string()
}

/// Join path segments with `/`, without doubling or dropping separators
///
/// Empty segments are skipped. A leading scheme such as `https://` on the
/// first segment is kept intact.
pub fn join_segments(base: &str, segments: &[&str]) -> String {
    let mut joined = base.trim_end_matches('/').to_string();
    for segment in segments {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push('/');
        }
        joined.push_str(segment);
    }
    joined
}
