//! Source file discovery

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::DeployError;
use crate::filesys::dir::Dir;

/// OS housekeeping files that are never published
pub const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// A file found under the source root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Absolute local path
    pub path: PathBuf,

    /// Path relative to the source root, `/`-separated on every platform
    pub relative_path: String,
}

/// Recursively list every publishable file under `root`
///
/// Results are sorted by relative path so repeated runs report progress in
/// the same submission order. A path that is not valid UTF-8 fails the whole
/// discovery with [`DeployError::InvalidFileName`].
pub async fn discover_files(root: &Path) -> Result<Vec<DiscoveredFile>, DeployError> {
    let dir = Dir::new(root);
    if !dir.exists().await {
        return Err(DeployError::PathNotFound(root.to_path_buf()));
    }
    let root = tokio::fs::canonicalize(root).await?;

    let paths = Dir::new(&root)
        .list_files_recursive(|name| !IGNORED_FILES.contains(&name))
        .await?;

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let relative = path.strip_prefix(&root).map_err(|e| {
            DeployError::Internal(format!("{} is outside {}: {}", path.display(), root.display(), e))
        })?;
        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| DeployError::InvalidFileName(path.clone()))?
            .join("/");
        files.push(DiscoveredFile {
            path,
            relative_path,
        });
    }
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    debug!("Discovered {} files under {}", files.len(), root.display());
    Ok(files)
}
