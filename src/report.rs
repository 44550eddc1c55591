use colored::Colorize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::changes::{ChangeStatus, FileChange};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to serialize changes: {0}")]
    Json(#[from] serde_json::Error),
}

/// Emit the reconciled change list: colored terminal summary by default,
/// JSON on stdout with --json, or a JSON file when an output path is given.
#[instrument(skip(changes), fields(files = changes.len()))]
pub fn output(changes: &[FileChange], json: bool, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        Some(path) => {
            debug!(path = %path.display(), "writing change list to file");
            fs::write(path, serde_json::to_string_pretty(changes)?)?;
            Ok(())
        }
        None if json => {
            println!("{}", serde_json::to_string_pretty(changes)?);
            Ok(())
        }
        None => {
            debug!("writing change list to terminal");
            print_terminal(changes);
            Ok(())
        }
    }
}

fn print_terminal(changes: &[FileChange]) {
    let additions: usize = changes.iter().map(|c| c.additions).sum();
    let deletions: usize = changes.iter().map(|c| c.deletions).sum();

    println!();
    println!(
        "{} changed file{} ({} {})",
        changes.len().to_string().bold(),
        if changes.len() == 1 { "" } else { "s" },
        format!("+{additions}").green(),
        format!("-{deletions}").red(),
    );
    println!();

    for change in changes {
        println!(
            "  {:<10} {:<50} {} {}",
            status_label(change.status),
            change.path,
            format!("+{}", change.additions).green(),
            format!("-{}", change.deletions).red(),
        );
    }
    println!();
}

fn status_label(status: ChangeStatus) -> colored::ColoredString {
    let label = format!("{status}");
    match status {
        ChangeStatus::Added => label.green(),
        ChangeStatus::Removed => label.red(),
        ChangeStatus::Renamed => label.yellow(),
        ChangeStatus::Modified => label.cyan(),
    }
}
