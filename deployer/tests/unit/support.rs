//! Shared test fixtures

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use gdeploy::errors::UploadError;
use gdeploy::remote::ObjectStore;

/// Object store stub that tracks concurrency and fails chosen keys
pub struct InstrumentedStore {
    delay: Duration,
    fail_suffixes: Vec<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    uploaded: Mutex<Vec<(String, Vec<u8>)>>,
    attempts: AtomicUsize,
}

impl InstrumentedStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail_suffixes: Vec::new(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            uploaded: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Reject every key ending with `suffix`
    pub fn failing(mut self, suffix: &str) -> Self {
        self.fail_suffixes.push(suffix.to_string());
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Keys stored so far, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .uploaded
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.uploaded
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, body)| body.clone())
    }
}

#[async_trait]
impl ObjectStore for InstrumentedStore {
    async fn put_file(
        &self,
        key: &str,
        mut file: tokio::fs::File,
        len: u64,
    ) -> Result<(), UploadError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        let mut body = Vec::new();
        let read = file.read_to_end(&mut body).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        read.map_err(|e| UploadError::FileRead(e.to_string()))?;
        assert_eq!(body.len() as u64, len);
        if self.fail_suffixes.iter().any(|s| key.ends_with(s.as_str())) {
            return Err(UploadError::Transport("503 Service Unavailable".to_string()));
        }
        self.uploaded.lock().unwrap().push((key.to_string(), body));
        Ok(())
    }

    fn origin_url(&self, key: &str) -> String {
        format!("memory://bucket/{}", key)
    }
}

/// Write `files` (relative path, contents) under `root`
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (relative, contents) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
}
