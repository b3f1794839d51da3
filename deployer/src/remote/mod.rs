//! Remote object store transport

pub mod http;
pub mod local;

use async_trait::async_trait;

use crate::errors::UploadError;

/// Destination for uploaded files
///
/// Implementations must be safe to call from many concurrent upload tasks.
/// Timeouts are the transport's concern and surface as
/// [`UploadError::Transport`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stream an opened local file to `key`
    async fn put_file(&self, key: &str, file: tokio::fs::File, len: u64)
        -> Result<(), UploadError>;

    /// Direct URL of `key` in the store, for reporting
    fn origin_url(&self, key: &str) -> String;
}
