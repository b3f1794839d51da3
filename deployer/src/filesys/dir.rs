//! Directory operations

use std::path::PathBuf;

use tokio::fs;

use crate::errors::DeployError;

/// A directory wrapper with path
#[derive(Debug, Clone)]
pub struct Dir {
    path: PathBuf,
}

impl Dir {
    /// Create a new directory reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Check if the directory exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// List every regular file below this directory
    ///
    /// Symlinks to files are followed, symlinked directories are not
    /// descended into. Files whose name is rejected by `keep` are skipped.
    pub async fn list_files_recursive<F>(&self, keep: F) -> Result<Vec<PathBuf>, DeployError>
    where
        F: Fn(&str) -> bool,
    {
        let mut files = Vec::new();
        let mut pending = vec![self.path.clone()];

        while let Some(current) = pending.pop() {
            let mut entries = fs::read_dir(&current).await?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }

                let is_file = if file_type.is_symlink() {
                    fs::metadata(&path)
                        .await
                        .map(|m| m.is_file())
                        .unwrap_or(false)
                } else {
                    file_type.is_file()
                };

                if is_file && keep(&entry.file_name().to_string_lossy()) {
                    files.push(path);
                }
            }
        }

        Ok(files)
    }
}
