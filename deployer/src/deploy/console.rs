//! Colored console reporting

use colored::Colorize;

use crate::deploy::events::{DeployEvent, DeployObserver};
use crate::deploy::request::Environment;
use crate::models::deployment::DeploymentReport;

const SEP: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Observer that prints progress and the final summary to the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleObserver;

impl DeployObserver for ConsoleObserver {
    fn on_event(&self, event: &DeployEvent) {
        match event {
            DeployEvent::Started { appended_to, .. } => print_banner(appended_to.as_deref()),
            DeployEvent::Discovered { .. } => {}
            DeployEvent::FileUploaded {
                completed,
                total,
                public_url,
            } => println!("{}", format!("  [{completed}/{total}] {public_url}").green()),
            DeployEvent::FileFailed {
                completed,
                total,
                path,
                error,
            } => {
                eprintln!(
                    "{}",
                    format!("  [{completed}/{total}] {}", path.display()).red()
                );
                eprintln!("{}", format!("  ↳  {error}").red());
            }
            DeployEvent::Finished(report) => {
                if report.success {
                    print_success(report);
                } else {
                    print_failure(report);
                }
            }
        }
    }
}

fn print_banner(appended_to: Option<&str>) {
    println!();
    match appended_to {
        Some(latest) => {
            println!("{}", SEP.yellow());
            println!("{}", " APPENDING FILES".yellow());
            println!("{}", format!(" to {latest}").yellow());
            println!("{}", SEP.yellow());
        }
        None => {
            println!("{}", SEP.green());
            println!("{}", " UPLOADING FILES".green());
            println!("{}", SEP.green());
        }
    }
    println!();
}

fn print_success(report: &DeploymentReport) {
    println!();
    println!("{}", SEP.green());
    println!("{}", " PUBLISH SUCCESSFUL".green().bold());
    println!("{}", SEP.green());

    let published = format!(" * Published to {}", report.environment);
    match report.environment {
        Environment::Staging => println!("{}", published.yellow()),
        Environment::Production => println!("{}", published.cyan()),
    }
    println!(" * Files: {}/{}", report.succeeded, report.total());
    println!(" * Origin: {}", report.origin_url);
    let label = match report.environment {
        Environment::Staging => "Staging URL",
        Environment::Production => "Production URL",
    };
    println!("{}", format!(" * {label}: {}", report.public_url).green());
    if !report.log_updated && report.appended_to.is_some() {
        println!(" * Appended to an existing artifact, deployment log unchanged");
    }
    if let Some(e) = &report.log_error {
        println!(
            "{}",
            format!(" * Deployment log NOT updated: {e}. Record this artifact manually.").red()
        );
    }
    println!("{}", SEP.green());
    println!();
}

fn print_failure(report: &DeploymentReport) {
    eprintln!();
    eprintln!("{}", SEP.red());
    eprintln!(
        "{}",
        " DEPLOYER ERROR. YOUR PROJECT WAS NOT SUCCESSFULLY PUBLISHED"
            .red()
            .bold()
    );
    eprintln!("{}", SEP.red());
    eprintln!(
        " {} of {} files failed; {} uploaded files were left in place.",
        report.failed.len(),
        report.total(),
        report.succeeded
    );
    for failed in &report.failed {
        eprintln!("{}", format!("  * {failed}").red());
    }
    eprintln!(" Re-run the deployment to upload every file again.");
    eprintln!("{}", SEP.red());
    eprintln!();
}
