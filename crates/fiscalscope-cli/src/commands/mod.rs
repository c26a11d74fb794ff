//! CLI command implementations.

pub mod analyze;
pub mod audit;
pub mod summary;
pub mod tool;
pub mod validate;

use std::path::Path;

use colored::Colorize;
use fiscalscope::{Dataset, FiscalScope, ScopeConfig};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Build the engine from an optional JSON configuration file.
pub fn build_scope(config: Option<&Path>) -> Result<FiscalScope, Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => ScopeConfig::load(path)?,
        None => ScopeConfig::default(),
    };
    Ok(FiscalScope::with_config(config))
}

/// Load a data file, announcing it on stderr unless output is JSON.
pub fn load(scope: &FiscalScope, file: &Path, quiet: bool) -> Result<Dataset, Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }
    let (dataset, source) = scope.load(file)?;
    if !quiet {
        eprintln!(
            "{} {} ({} rows, {} columns, {}, {})",
            "Loaded".cyan().bold(),
            source.file.white(),
            source.row_count,
            source.column_count,
            source.format,
            source.short_hash().dimmed()
        );
    }
    Ok(dataset)
}
