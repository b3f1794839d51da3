//! Local persistent state

pub mod publish_log;
pub mod settings;
