//! Analyze command - exploratory overview of a dataset.

use std::path::PathBuf;

use colored::Colorize;
use fiscalscope::analysis::ClusterReport;
use fiscalscope::FiscalScope;

use super::{load, CommandResult};

pub fn run(scope: &FiscalScope, file: PathBuf, json: bool, verbose: bool) -> CommandResult {
    let dataset = load(scope, &file, json)?;
    let result = scope.explore(&dataset);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let overview = &result.overview;
    let analysis = &result.analysis;

    println!(
        "{} rows, {} columns ({} numeric, {} non-numeric)",
        overview.n_rows.to_string().white().bold(),
        overview.n_cols.to_string().white().bold(),
        overview.numeric_columns.len(),
        overview.non_numeric_columns.len()
    );

    if verbose {
        println!();
        println!("{}", "Columns:".yellow().bold());
        for (name, description) in &overview.describe {
            let missing = overview
                .missing
                .iter()
                .find(|m| &m.column == name)
                .map(|m| m.fraction * 100.0)
                .unwrap_or(0.0);
            println!(
                "  {:28} {:>8} non-null {:>8} unique {:>6.1}% missing",
                name, description.count, description.unique, missing
            );
        }
    }

    println!();
    println!("{}", "Outliers (IQR):".yellow().bold());
    if analysis.outliers.is_empty() {
        println!("  {}", "none".green());
    }
    for report in &analysis.outliers {
        println!(
            "  {:28} {} rows ({:.2}%) outside [{:.2}, {:.2}]",
            report.column,
            report.count.to_string().red(),
            report.percentage,
            report.lower_bound,
            report.upper_bound
        );
    }

    println!();
    println!("{}", "Clusters:".yellow().bold());
    match &analysis.clusters {
        ClusterReport::Ok {
            k,
            silhouette,
            cluster_sizes,
        } => {
            let sizes: Vec<String> = cluster_sizes.iter().map(|(_, size)| size.to_string()).collect();
            println!("  k = {} (silhouette {:.3}), sizes {}", k, silhouette, sizes.join("/"));
        }
        other => println!("  {}", other.status().dimmed()),
    }

    println!();
    println!("{}", "Temporal trends:".yellow().bold());
    if analysis.temporal.insights.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for insight in &analysis.temporal.insights {
        println!("  {}", insight);
    }

    println!();
    println!("{}", "Relationships:".yellow().bold());
    for pair in &analysis.relationships.correlations {
        println!("  {:40} |rho| {:.2}", pair.variables, pair.correlation);
    }
    for driver in &analysis.relationships.categorical {
        println!(
            "  {} -> {} (mean spread {:.2})",
            driver.driver, driver.target, driver.mean_spread
        );
    }
    if analysis.relationships.correlations.is_empty() && analysis.relationships.categorical.is_empty() {
        println!("  {}", "none".dimmed());
    }

    Ok(())
}
