//! Example: Explore and audit an NF-e item export with FiscalScope.
//!
//! Usage:
//!   cargo run --example analyze -- <file_path>
//!
//! Example:
//!   cargo run --example analyze -- dados/itens_nfe.csv

use std::env;
use std::path::Path;

use fiscalscope::{FiscalScope, RuleOutcome};

fn main() -> fiscalscope::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example analyze -- <file_path>");
        eprintln!("\nExample:");
        eprintln!("  cargo run --example analyze -- dados/itens_nfe.csv");
        std::process::exit(1);
    }

    let file_path = &args[1];
    let path = Path::new(file_path);

    if !path.exists() {
        eprintln!("Error: File not found: {}", file_path);
        std::process::exit(1);
    }

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("FiscalScope: {}", file_path);
    println!("{}", separator);
    println!();

    let scope = FiscalScope::new();
    let (dataset, source) = scope.load(path)?;

    println!("## Source Metadata");
    println!("  File: {}", source.file);
    println!("  Format: {}", source.format);
    println!("  Rows: {}", source.row_count);
    println!("  Columns: {}", source.column_count);
    println!("  Hash: {}", source.hash);
    println!();

    let roles = scope.analyzer().classifier().classify(&dataset);
    println!("## Columns ({})", dataset.column_count());
    println!();
    for name in dataset.column_names() {
        println!("  {:28} {}", name, roles.role(name).label());
    }
    println!();

    let exploration = scope.explore(&dataset);
    println!("## Exploration");
    println!("  Outlier columns: {}", exploration.analysis.outliers.len());
    println!("  Clusters: {}", exploration.analysis.clusters.status());
    for insight in &exploration.analysis.temporal.insights {
        println!("  Trend: {}", insight);
    }
    println!();

    let report = scope.validate(&dataset)?;
    println!("## Rules ({} evaluated)", report.evaluations.len());
    println!();
    for evaluation in &report.evaluations {
        let status = match &evaluation.outcome {
            RuleOutcome::Passed => "ok".to_string(),
            RuleOutcome::Skipped { reason } => format!("skipped ({})", reason),
            RuleOutcome::Violations { details } => format!("{} rows", details.len()),
        };
        println!(
            "  {:24} {:6} {}",
            evaluation.identifier,
            evaluation.severity.label(),
            status
        );
    }
    println!();

    println!("## Suggestions ({} total)", report.suggestions.len());
    println!();
    for (i, suggestion) in report.suggestions.iter().enumerate() {
        println!(
            "  {}. [{}] {} (priority: {}, rows: {})",
            i + 1,
            suggestion.rule_id,
            suggestion.action.label(),
            suggestion.priority,
            suggestion.affected_rows
        );
        println!("     {}", suggestion.text);
        println!();
    }

    match scope.fiscal_overview(&dataset) {
        Ok(overview) => {
            println!("## Summary");
            println!("  Notes: {}", overview.total_notas);
            println!("  Items: {}", overview.total_itens);
            println!("  Note total: {:.2}", overview.valor_total_notas);
        }
        Err(e) => println!("## Summary unavailable: {}", e),
    }
    println!("  Recommendation: {}", report.summary.recommendation);
    println!();

    println!("{}", separator);

    Ok(())
}
