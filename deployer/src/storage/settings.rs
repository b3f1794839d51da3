//! Settings file management

use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

use crate::deploy::request::{Environment, PublishType};
use crate::deploy::uploader::DEFAULT_MAX_CONCURRENT_UPLOADS;
use crate::errors::DeployError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Deployer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Write logs as JSON
    #[serde(default)]
    pub log_json: bool,

    /// Also write logs to files in this directory
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Deployment log file
    #[serde(default = "default_publish_log")]
    pub publish_log: PathBuf,

    /// Maximum simultaneously in-flight uploads
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,

    /// Per-request transport timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Remote root prefix per publish type
    #[serde(default)]
    pub publish_roots: PublishRoots,

    /// Staging target
    #[serde(default = "TargetSettings::staging")]
    pub staging: TargetSettings,

    /// Production target
    #[serde(default = "TargetSettings::production")]
    pub production: TargetSettings,
}

fn default_publish_log() -> PathBuf {
    PathBuf::from("config.json")
}

fn default_max_concurrent_uploads() -> usize {
    DEFAULT_MAX_CONCURRENT_UPLOADS
}

fn default_request_timeout() -> u64 {
    300
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            publish_log: default_publish_log(),
            max_concurrent_uploads: default_max_concurrent_uploads(),
            request_timeout_secs: default_request_timeout(),
            publish_roots: PublishRoots::default(),
            staging: TargetSettings::staging(),
            production: TargetSettings::production(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file; a missing file yields the defaults
    pub async fn load(file: &File) -> Result<Self, DeployError> {
        if !file.exists().await {
            debug!("No settings at {}, using defaults", file.path().display());
            return Ok(Self::default());
        }
        let settings: Settings = file.read_json().await?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that endpoints and URLs parse and bounds are sane
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.max_concurrent_uploads == 0 {
            return Err(DeployError::ConfigError(
                "max_concurrent_uploads must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_uploads > Semaphore::MAX_PERMITS {
            return Err(DeployError::ConfigError(format!(
                "max_concurrent_uploads must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(DeployError::ConfigError(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        for (env, target) in [
            (Environment::Staging, &self.staging),
            (Environment::Production, &self.production),
        ] {
            target.validate(env)?;
        }
        Ok(())
    }

    /// Target settings for an environment
    pub fn target(&self, environment: Environment) -> &TargetSettings {
        match environment {
            Environment::Staging => &self.staging,
            Environment::Production => &self.production,
        }
    }
}

/// Remote root prefixes, one per publish type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRoots {
    #[serde(default = "default_project_root")]
    pub project: String,

    #[serde(default = "default_tileset_root")]
    pub tileset: String,
}

fn default_project_root() -> String {
    "interactive-assets/graphics".to_string()
}

fn default_tileset_root() -> String {
    "tiles/docs".to_string()
}

impl Default for PublishRoots {
    fn default() -> Self {
        Self {
            project: default_project_root(),
            tileset: default_tileset_root(),
        }
    }
}

impl PublishRoots {
    /// Remote root for a publish type
    pub fn for_type(&self, publish_type: PublishType) -> &str {
        match publish_type {
            PublishType::Project => &self.project,
            PublishType::Tileset => &self.tileset,
        }
    }
}

/// Object store target for one environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSettings {
    /// Object store endpoint
    pub endpoint: String,

    /// Bucket name
    pub bucket: String,

    /// Environment variable holding the bearer token, if the store needs one
    #[serde(default)]
    pub token_env: Option<String>,

    /// Public base URL of published projects
    pub project_url: String,

    /// Public base URL of published tilesets
    pub tileset_url: String,
}

impl TargetSettings {
    pub fn staging() -> Self {
        Self {
            endpoint: "https://objects.staging.example.com".to_string(),
            bucket: "graphics-static-nonprod".to_string(),
            token_env: Some("GDEPLOY_STAGING_TOKEN".to_string()),
            project_url: "https://www-staging.example.com/interactive-assets/graphics/"
                .to_string(),
            tileset_url: "https://tiles.example.com/".to_string(),
        }
    }

    pub fn production() -> Self {
        Self {
            endpoint: "https://objects.example.com".to_string(),
            bucket: "graphics-static-prod".to_string(),
            token_env: Some("GDEPLOY_PRODUCTION_TOKEN".to_string()),
            project_url: "https://www.example.com/interactive-assets/graphics/".to_string(),
            tileset_url: "https://tiles.example.com/".to_string(),
        }
    }

    /// Public base URL for a publish type
    pub fn public_url(&self, publish_type: PublishType) -> &str {
        match publish_type {
            PublishType::Project => &self.project_url,
            PublishType::Tileset => &self.tileset_url,
        }
    }

    /// Bearer token read from the configured environment variable
    pub fn token(&self) -> Option<SecretString> {
        let name = self.token_env.as_deref()?;
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Some(SecretString::from(value)),
            _ => {
                warn!("{} is not set, uploading without a token", name);
                None
            }
        }
    }

    fn validate(&self, environment: Environment) -> Result<(), DeployError> {
        for (field, value) in [
            ("endpoint", &self.endpoint),
            ("project_url", &self.project_url),
            ("tileset_url", &self.tileset_url),
        ] {
            Url::parse(value).map_err(|e| {
                DeployError::ConfigError(format!(
                    "{}.{} is not a valid URL ({}): {}",
                    environment, field, value, e
                ))
            })?;
        }
        if self.bucket.trim_matches('/').is_empty() {
            return Err(DeployError::ConfigError(format!(
                "{}.bucket must not be empty",
                environment
            )));
        }
        Ok(())
    }
}
