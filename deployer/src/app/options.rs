//! Command line options

use std::collections::HashMap;
use std::path::PathBuf;

use crate::deploy::request::{Environment, PublishType};
use crate::errors::DeployError;

/// Options for one deployer invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    /// Settings file
    pub config: PathBuf,

    /// Local directory to publish
    pub source: Option<PathBuf>,

    /// Project identifier; defaults to the current directory name
    pub project: Option<String>,

    /// Artifact identifier; defaults to a timestamp
    pub artifact: Option<String>,

    pub publish_type: PublishType,

    pub environment: Environment,

    /// Append under the latest artifact at this sub-path
    pub append: Option<String>,

    /// Mirror uploads into this local directory instead of the object store
    pub dry_run: Option<PathBuf>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            config: PathBuf::from("gdeploy.json"),
            source: None,
            project: None,
            artifact: None,
            publish_type: PublishType::Project,
            environment: Environment::Production,
            append: None,
            dry_run: None,
        }
    }
}

impl CliOptions {
    /// Build options from `--key=value` / `--flag` pairs
    pub fn from_args(args: &HashMap<String, String>) -> Result<Self, DeployError> {
        let mut options = Self::default();

        if let Some(config) = non_empty(args, "config") {
            options.config = PathBuf::from(config);
        }
        options.source = non_empty(args, "source").map(PathBuf::from);
        options.project = non_empty(args, "project").map(str::to_string);
        options.artifact = non_empty(args, "artifact").map(str::to_string);
        options.append = non_empty(args, "append").map(str::to_string);

        if let Some(publish_type) = non_empty(args, "type") {
            options.publish_type = publish_type.parse()?;
        }
        if let Some(environment) = non_empty(args, "env") {
            options.environment = environment.parse()?;
        }
        if is_flag_set(args, "staging") {
            options.environment = Environment::Staging;
        }

        if let Some(dry_run) = args.get("dry-run") {
            options.dry_run = Some(if dry_run == "true" {
                PathBuf::from("dry-run")
            } else {
                PathBuf::from(dry_run)
            });
        }

        Ok(options)
    }
}

/// Split raw arguments into a key/value map
///
/// `--key=value` maps `key` to `value`; a bare `--flag` maps to `"true"`.
pub fn parse_args<I>(args: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = String>,
{
    let mut cli_args = HashMap::new();
    for arg in args {
        if let Some((key, value)) = arg.split_once('=') {
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }
    cli_args
}

fn non_empty<'a>(args: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    args.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn is_flag_set(args: &HashMap<String, String>, key: &str) -> bool {
    matches!(args.get(key).map(String::as_str), Some("true") | Some("1") | Some("yes"))
}
