//! Concurrent upload engine
//!
//! Every file is uploaded in its own task. Admission is gated by a semaphore
//! so that no more than the configured number of files are open and in
//! flight at once; over roughly ten thousand simultaneously open files the
//! OS starts refusing descriptors and sockets. Tasks never cancel each other:
//! the batch always settles completely before anyone looks at the outcomes.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::deploy::discovery::DiscoveredFile;
use crate::deploy::events::{DeployEvent, DeployObserver};
use crate::errors::{FailedFile, UploadError};
use crate::remote::ObjectStore;
use crate::utils::join_segments;

/// Default bound on simultaneously in-flight uploads
pub const DEFAULT_MAX_CONCURRENT_UPLOADS: usize = 150;

/// One file to transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransferTask {
    /// Absolute local path
    pub local_path: PathBuf,

    /// Object key in the remote store
    pub remote_key: String,

    /// Public URL the file will be served from
    pub public_url: String,
}

/// Build transfer tasks for discovered files
///
/// `remote_prefix` and `public_prefix` already include the project and
/// artifact segments; each file's relative path is appended to both.
pub fn plan_transfers(
    files: Vec<DiscoveredFile>,
    remote_prefix: &str,
    public_prefix: &str,
) -> Vec<FileTransferTask> {
    files
        .into_iter()
        .map(|file| FileTransferTask {
            remote_key: join_segments(remote_prefix, &[&file.relative_path]),
            public_url: join_segments(public_prefix, &[&file.relative_path]),
            local_path: file.path,
        })
        .collect()
}

/// Result of one transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded { public_url: String },
    Failed(FailedFile),
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded { .. })
    }
}

/// Uploads batches of files with bounded concurrency
pub struct UploadEngine {
    store: Arc<dyn ObjectStore>,
    max_concurrent: usize,
}

impl UploadEngine {
    /// Create an engine; the bound is clamped to `1..=Semaphore::MAX_PERMITS`
    pub fn new(store: Arc<dyn ObjectStore>, max_concurrent: usize) -> Self {
        Self {
            store,
            max_concurrent: max_concurrent.clamp(1, Semaphore::MAX_PERMITS),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Upload every task and return one outcome per task, in submission order
    ///
    /// Progress events are emitted in completion order.
    pub async fn upload_all(
        &self,
        tasks: Vec<FileTransferTask>,
        observer: Arc<dyn DeployObserver>,
    ) -> Vec<UploadOutcome> {
        let total = tasks.len();
        info!(
            "Uploading {} files with at most {} in flight",
            total, self.max_concurrent
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let progress = Arc::new(Progress::new(total, observer));
        let mut handles = Vec::with_capacity(total);

        for task in tasks {
            let sem = Arc::clone(&semaphore);
            let store = Arc::clone(&self.store);
            let progress = Arc::clone(&progress);
            let local_path = task.local_path.clone();

            let handle = tokio::spawn(async move {
                let outcome = match sem.acquire().await {
                    Ok(_permit) => match upload_one(store.as_ref(), &task).await {
                        Ok(()) => UploadOutcome::Uploaded {
                            public_url: task.public_url,
                        },
                        Err(error) => UploadOutcome::Failed(FailedFile {
                            path: task.local_path,
                            error,
                        }),
                    },
                    Err(e) => UploadOutcome::Failed(FailedFile {
                        path: task.local_path,
                        error: UploadError::Transport(format!("upload pool closed: {}", e)),
                    }),
                };
                progress.record(&outcome);
                outcome
            });
            handles.push((local_path, handle));
        }

        let mut outcomes = Vec::with_capacity(total);
        for (path, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!("Upload task for {} did not finish: {}", path.display(), e);
                    let outcome = UploadOutcome::Failed(FailedFile {
                        path,
                        error: UploadError::Transport(format!("upload task aborted: {}", e)),
                    });
                    progress.record(&outcome);
                    outcomes.push(outcome);
                }
            }
        }

        outcomes
    }
}

/// Open a local file and stream it to its remote key
pub async fn upload_one(
    store: &dyn ObjectStore,
    task: &FileTransferTask,
) -> Result<(), UploadError> {
    debug!("Uploading {} -> {}", task.local_path.display(), task.remote_key);

    let file = tokio::fs::File::open(&task.local_path)
        .await
        .map_err(|e| UploadError::FileRead(e.to_string()))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| UploadError::FileRead(e.to_string()))?
        .len();

    store.put_file(&task.remote_key, file, len).await
}

/// Completion counter shared by the upload tasks
///
/// The lock keeps the `completed` values delivered to the observer strictly
/// increasing.
struct Progress {
    total: usize,
    completed: Mutex<usize>,
    observer: Arc<dyn DeployObserver>,
}

impl Progress {
    fn new(total: usize, observer: Arc<dyn DeployObserver>) -> Self {
        Self {
            total,
            completed: Mutex::new(0),
            observer,
        }
    }

    fn record(&self, outcome: &UploadOutcome) {
        let mut completed = self.completed.lock().unwrap_or_else(|e| e.into_inner());
        *completed += 1;

        let event = match outcome {
            UploadOutcome::Uploaded { public_url } => DeployEvent::FileUploaded {
                completed: *completed,
                total: self.total,
                public_url: public_url.clone(),
            },
            UploadOutcome::Failed(failed) => DeployEvent::FileFailed {
                completed: *completed,
                total: self.total,
                path: failed.path.clone(),
                error: failed.error.clone(),
            },
        };
        self.observer.on_event(&event);
    }
}
