//! Local directory standing in for the object store

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::errors::UploadError;
use crate::remote::ObjectStore;

/// Mirrors object keys as files under a root directory
///
/// Used for dry runs: the tree it produces is exactly what would be
/// published.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Local path an object key maps to
    pub fn object_path(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put_file(
        &self,
        key: &str,
        mut file: tokio::fs::File,
        _len: u64,
    ) -> Result<(), UploadError> {
        let dest = self.object_path(key);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| UploadError::Transport(e.to_string()))?;
        }

        let mut out = fs::File::create(&dest)
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        tokio::io::copy(&mut file, &mut out)
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        Ok(())
    }

    fn origin_url(&self, key: &str) -> String {
        format!("file://{}", self.object_path(key).display())
    }
}
