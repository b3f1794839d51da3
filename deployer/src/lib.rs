//! gdeploy library
//!
//! Publishes directories of build output to an object store under versioned
//! paths, with bounded upload concurrency and a durable log of published
//! artifacts.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod remote;
pub mod storage;
pub mod utils;

pub use deploy::orchestrator::{Deployer, DeployerOptions};
pub use deploy::request::{DeploymentParams, DeploymentRequest, Environment, PublishType};
pub use errors::{DeployError, FailedFile, UploadError};
pub use models::deployment::{ArtifactRecord, DeploymentReport};
