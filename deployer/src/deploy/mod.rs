//! Deployment module

pub mod aggregate;
pub mod append;
pub mod console;
pub mod discovery;
pub mod events;
pub mod orchestrator;
pub mod request;
pub mod uploader;
