//! Deployment log file management
//!
//! The log is a JSON document keyed by `published_<type>`, each holding a map
//! of project identifier to the artifacts published for it, oldest first.
//! The same file usually carries unrelated project configuration, so every
//! other top-level key is kept as-is and written back in its original order.

use serde_json::{Map, Value};
use tracing::debug;

use crate::deploy::request::PublishType;
use crate::errors::DeployError;
use crate::filesys::file::File;
use crate::models::deployment::ArtifactRecord;

/// In-memory deployment log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentLog {
    doc: Map<String, Value>,
}

impl DeploymentLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from a parsed JSON document
    pub fn from_value(value: Value) -> Result<Self, DeployError> {
        match value {
            Value::Object(doc) => Ok(Self { doc }),
            Value::Null => Ok(Self::default()),
            other => Err(DeployError::LogFormat(format!(
                "expected a JSON object at the top level, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// The whole document
    pub fn as_value(&self) -> Value {
        Value::Object(self.doc.clone())
    }

    /// Artifacts published for a project, oldest first
    pub fn artifacts(
        &self,
        publish_type: PublishType,
        project: &str,
    ) -> Result<Vec<ArtifactRecord>, DeployError> {
        let key = publish_type.log_key();
        let Some(section) = self.doc.get(&key) else {
            return Ok(Vec::new());
        };
        let section = section.as_object().ok_or_else(|| {
            DeployError::LogFormat(format!("'{}' is not an object", key))
        })?;

        match section.get(project) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(list) => serde_json::from_value(list.clone()).map_err(|e| {
                DeployError::LogFormat(format!("'{}.{}': {}", key, project, e))
            }),
        }
    }

    /// Most recently published artifact for a project
    pub fn latest(
        &self,
        publish_type: PublishType,
        project: &str,
    ) -> Result<Option<ArtifactRecord>, DeployError> {
        Ok(self.artifacts(publish_type, project)?.pop())
    }

    /// Append a record to the project's list, creating the list if absent
    pub fn append_record(
        &mut self,
        publish_type: PublishType,
        project: &str,
        record: ArtifactRecord,
    ) -> Result<(), DeployError> {
        let key = publish_type.log_key();
        let section = self
            .doc
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if section.is_null() {
            *section = Value::Object(Map::new());
        }
        let section = section.as_object_mut().ok_or_else(|| {
            DeployError::LogFormat(format!("'{}' is not an object", key))
        })?;

        let list = section
            .entry(project.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if list.is_null() {
            *list = Value::Array(Vec::new());
        }
        let list = list.as_array_mut().ok_or_else(|| {
            DeployError::LogFormat(format!("'{}.{}' is not an array", key, project))
        })?;

        list.push(serde_json::to_value(record)?);
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Durable storage for the deployment log
#[derive(Debug, Clone)]
pub struct DeploymentLogStore {
    file: File,
}

impl DeploymentLogStore {
    /// Create a store backed by the given file
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// The backing file
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Load the log; a missing file is an empty log
    pub async fn load(&self) -> Result<DeploymentLog, DeployError> {
        if !self.file.exists().await {
            debug!(
                "Deployment log {} does not exist, starting empty",
                self.file.path().display()
            );
            return Ok(DeploymentLog::new());
        }

        let contents = self.file.read_string().await?;
        if contents.trim().is_empty() {
            return Ok(DeploymentLog::new());
        }
        let value: Value = serde_json::from_str(&contents)?;
        DeploymentLog::from_value(value)
    }

    /// Overwrite the file with the whole log, atomically
    pub async fn persist(&self, log: &DeploymentLog) -> Result<(), DeployError> {
        debug!("Writing deployment log to {}", self.file.path().display());
        self.file.write_json_atomic(&log.doc).await
    }
}
