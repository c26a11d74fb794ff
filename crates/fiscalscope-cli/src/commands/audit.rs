//! Audit command - write the consolidated audit report.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use fiscalscope::FiscalScope;

use super::{load, CommandResult};

pub fn run(scope: &FiscalScope, file: PathBuf, output: Option<PathBuf>) -> CommandResult {
    let dataset = load(scope, &file, output.is_none())?;
    let report = scope.audit(&dataset)?;

    match output {
        Some(path) => {
            fs::write(&path, format!("{}\n", report))?;
            println!(
                "{} {}",
                "Saved to".green().bold(),
                path.display().to_string().white()
            );
        }
        None => println!("{}", report),
    }

    Ok(())
}
