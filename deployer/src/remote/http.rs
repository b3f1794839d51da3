//! HTTP object store client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Body, Client};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error};
use url::Url;

use crate::errors::{DeployError, UploadError};
use crate::remote::ObjectStore;

/// HTTP object store options
#[derive(Debug, Clone)]
pub struct HttpStoreOptions {
    /// Store endpoint, e.g. `https://s3.us-east-1.amazonaws.com`
    pub endpoint: String,

    /// Bucket, addressed path-style under the endpoint
    pub bucket: String,

    /// Bearer token sent with every request
    pub token: Option<SecretString>,

    /// Per-request timeout
    pub timeout: Duration,
}

/// Object store reached with path-style `PUT <endpoint>/<bucket>/<key>`
pub struct HttpObjectStore {
    client: Client,
    endpoint: Url,
    bucket: String,
    token: Option<SecretString>,
}

impl HttpObjectStore {
    /// Create a new HTTP object store client
    pub fn new(options: HttpStoreOptions) -> Result<Self, DeployError> {
        let endpoint = Url::parse(&options.endpoint).map_err(|e| {
            DeployError::ConfigError(format!("Invalid endpoint {}: {}", options.endpoint, e))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(DeployError::ConfigError(format!(
                "Endpoint cannot hold object paths: {}",
                options.endpoint
            )));
        }

        let bucket = options.bucket.trim_matches('/').to_string();
        if bucket.is_empty() {
            return Err(DeployError::ConfigError("Bucket must not be empty".to_string()));
        }

        let client = Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            bucket,
            token: options.token,
        })
    }

    /// URL of an object, with every key segment percent-encoded
    pub fn object_url(&self, key: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&self.bucket)
                .extend(key.split('/').filter(|s| !s.is_empty()));
        }
        url
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put_file(
        &self,
        key: &str,
        file: tokio::fs::File,
        len: u64,
    ) -> Result<(), UploadError> {
        let url = self.object_url(key);
        debug!("PUT {}", url);

        let mut request = self
            .client
            .put(url)
            .header(header::CONTENT_LENGTH, len)
            .body(Body::from(file));

        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP PUT failed: {} - {}", status, body);
            return Err(UploadError::Transport(format!("{}: {}", status, body)));
        }

        Ok(())
    }

    fn origin_url(&self, key: &str) -> String {
        self.object_url(key).to_string()
    }
}
