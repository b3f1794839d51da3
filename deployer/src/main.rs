//! gdeploy - Entry Point
//!
//! Publishes a directory of build output to the static object store under a
//! versioned path and records the published artifact.

use std::env;
use std::process::ExitCode;

use gdeploy::app::options::{parse_args, CliOptions};
use gdeploy::app::run::run;
use gdeploy::filesys::file::File;
use gdeploy::logs::{init_logging, LogOptions};
use gdeploy::storage::settings::Settings;
use gdeploy::utils::version_info;

use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli_args = parse_args(env::args().skip(1));

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{version}"),
            Err(e) => eprintln!("{e}"),
        }
        return ExitCode::SUCCESS;
    }

    let options = match CliOptions::from_args(&cli_args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Retrieve the settings file
    let settings = match Settings::load(&File::new(&options.config)).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file {}: {e}", options.config.display());
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        // Progress goes to the console observer; stdout logging only in JSON mode
        stdout: settings.log_json,
        log_dir: settings.log_dir.clone(),
        json_format: settings.log_json,
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    match run(options, settings).await {
        Ok(report) if report.success && report.log_error.is_none() => ExitCode::SUCCESS,
        Ok(report) if report.success => {
            if let Some(e) = &report.log_error {
                error!("Files published but the deployment log was not updated: {e}");
            }
            ExitCode::FAILURE
        }
        Ok(report) => {
            if let Err(e) = report.into_result() {
                error!("{e}");
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e:#}");
            eprintln!("Deployment aborted: {e:#}");
            ExitCode::FAILURE
        }
    }
}
