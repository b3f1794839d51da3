//! Deployment request construction and validation

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DeployError;

/// Category of deployment, each with its own remote root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishType {
    #[default]
    Project,
    Tileset,
}

impl PublishType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishType::Project => "project",
            PublishType::Tileset => "tileset",
        }
    }

    /// Top-level key of this publish type in the deployment log
    pub fn log_key(&self) -> String {
        format!("published_{}", self.as_str())
    }
}

impl fmt::Display for PublishType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublishType {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "project" => Ok(PublishType::Project),
            "tileset" | "tiles" => Ok(PublishType::Tileset),
            _ => Err(DeployError::ConfigError(format!("Invalid publish type: {}", s))),
        }
    }
}

/// Target environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Staging,
    #[default]
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(DeployError::ConfigError(format!("Invalid environment: {}", s))),
        }
    }
}

/// Raw, unvalidated deployment parameters
#[derive(Debug, Clone, Default)]
pub struct DeploymentParams {
    /// Local directory holding the build output
    pub source_dir: PathBuf,

    /// Project identifier, one entry in the deployment log
    pub project: String,

    /// Sortable artifact identifier
    pub artifact_id: String,

    /// Publish type
    pub publish_type: PublishType,

    /// Target environment
    pub environment: Environment,

    /// Public base URL of the target environment
    pub public_base_url: String,

    /// Append files under the latest artifact at this sub-path
    pub append_path: Option<String>,
}

/// A validated deployment request
///
/// Constructed once through [`DeploymentRequest::new`] and never mutated
/// afterwards; append resolution derives a separate [`DeploymentTarget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    source_dir: PathBuf,
    project: String,
    artifact_id: String,
    publish_type: PublishType,
    environment: Environment,
    public_base_url: String,
    append_path: Option<String>,
}

impl DeploymentRequest {
    /// Validate parameters into a request
    ///
    /// Every missing required field is reported at once.
    pub fn new(params: DeploymentParams) -> Result<Self, DeployError> {
        let project = params.project.trim().to_string();
        let artifact_id = params.artifact_id.trim().trim_matches('/').to_string();
        let public_base_url = params.public_base_url.trim().to_string();

        let mut missing = Vec::new();
        if project.is_empty() {
            missing.push("a unique project name");
        }
        if params.source_dir.as_os_str().is_empty() {
            missing.push("a local path to copy");
        }
        if artifact_id.is_empty() {
            missing.push("an artifact identifier");
        }
        if public_base_url.is_empty() {
            missing.push("a public base URL");
        }
        if !missing.is_empty() {
            return Err(DeployError::ConfigError(format!(
                "You must provide {}",
                missing.join(", ")
            )));
        }

        let append_path = params
            .append_path
            .map(|p| validate_append_path(&p))
            .transpose()?;

        Ok(Self {
            source_dir: params.source_dir,
            project,
            artifact_id,
            publish_type: params.publish_type,
            environment: params.environment,
            public_base_url,
            append_path,
        })
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn publish_type(&self) -> PublishType {
        self.publish_type
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    pub fn append_path(&self) -> Option<&str> {
        self.append_path.as_deref()
    }

    pub fn is_append(&self) -> bool {
        self.append_path.is_some()
    }

    /// Target for a fresh publish: the request's own source and artifact
    pub fn new_artifact_target(&self) -> DeploymentTarget {
        DeploymentTarget {
            source_dir: self.source_dir.clone(),
            artifact_id: self.artifact_id.clone(),
            appended_to: None,
        }
    }
}

/// Normalise an append sub-path to `a/b/c` form
fn validate_append_path(raw: &str) -> Result<String, DeployError> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(DeployError::ConfigError(
            "Append path must not be empty".to_string(),
        ));
    }

    let mut parts = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(DeployError::ConfigError(format!(
                    "Append path must be relative and stay inside the artifact: {}",
                    raw
                )))
            }
        }
    }

    if parts.is_empty() {
        return Err(DeployError::ConfigError(
            "Append path must not be empty".to_string(),
        ));
    }
    Ok(parts.join("/"))
}

/// Where files are read from and which artifact they land in
///
/// For an append this nests under the latest published artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// Effective local source directory
    pub source_dir: PathBuf,

    /// Effective artifact identifier used in keys and URLs
    pub artifact_id: String,

    /// Latest artifact the files are appended to, if any
    pub appended_to: Option<String>,
}
