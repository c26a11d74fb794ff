//! Validate command - run the fiscal rules.

use std::path::PathBuf;

use colored::Colorize;
use fiscalscope::report::MarkdownTable;
use fiscalscope::{FiscalScope, RuleOutcome, Severity};

use super::{load, CommandResult};

fn colored_severity(severity: Severity) -> colored::ColoredString {
    let label = format!("{:5}", severity.label());
    match severity {
        Severity::Alta => label.red().bold(),
        Severity::Media => label.yellow(),
        Severity::Baixa => label.blue(),
    }
}

pub fn run(scope: &FiscalScope, file: PathBuf, rule: Option<String>, json: bool, verbose: bool) -> CommandResult {
    let dataset = load(scope, &file, json)?;
    let report = scope.validate(&dataset)?;

    if let Some(rule_id) = rule {
        let rule_id = rule_id.trim();
        let Some(evaluation) = report.evaluations.iter().find(|e| e.identifier == rule_id) else {
            let known: Vec<&str> = report.evaluations.iter().map(|e| e.identifier.as_str()).collect();
            return Err(format!("Unknown rule '{}'. Known rules: {}", rule_id, known.join(", ")).into());
        };

        if json {
            println!("{}", serde_json::to_string_pretty(evaluation)?);
            return Ok(());
        }

        println!(
            "{} [{}] {}",
            evaluation.title.white().bold(),
            colored_severity(evaluation.severity),
            evaluation.conclusion
        );
        match &evaluation.outcome {
            RuleOutcome::Passed => println!("{}", "No rows flagged.".green()),
            RuleOutcome::Skipped { reason } => println!("{} {}", "Skipped:".dimmed(), reason),
            RuleOutcome::Violations { details } => {
                let limit = scope.config().limits.detail_rows;
                println!("{} rows flagged (showing up to {}):", details.len().to_string().red(), limit);
                println!("{}", MarkdownTable::from_details(details, limit));
            }
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let summary = &report.summary;
    println!(
        "Ran {} rules: {} flagged, {} skipped, {} rows affected",
        summary.rules_run.to_string().white().bold(),
        summary.rules_flagged.to_string().red(),
        summary.rules_skipped.to_string().dimmed(),
        summary.total_occurrences.to_string().white().bold()
    );

    if !report.issues.is_empty() {
        println!();
        for issue in &report.issues {
            println!(
                "  {} {:24} {:>6}  {}",
                colored_severity(issue.severity),
                issue.id,
                issue.occurrences,
                issue.title
            );
        }
    }

    if verbose {
        let skipped: Vec<_> = report
            .evaluations
            .iter()
            .filter_map(|e| match &e.outcome {
                RuleOutcome::Skipped { reason } => Some((e.identifier.as_str(), reason.as_str())),
                _ => None,
            })
            .collect();
        if !skipped.is_empty() {
            println!();
            println!("{}", "Skipped rules:".yellow().bold());
            for (id, reason) in skipped {
                println!("  {:24} {}", id, reason.dimmed());
            }
        }
    }

    if !report.suggestions.is_empty() {
        println!();
        println!("{}", "Suggested corrections:".yellow().bold());
        for suggestion in &report.suggestions {
            println!(
                "  [{}] {}: {}",
                suggestion.priority,
                suggestion.rule_id.cyan(),
                suggestion.text
            );
        }
    }

    println!();
    if report.findings.is_empty() {
        println!("{}", summary.recommendation.green());
    } else {
        println!("{}", summary.recommendation);
        println!(
            "Run {} for the flagged rows",
            format!("fiscalscope validate {} --rule <ID>", file.display()).cyan().bold()
        );
    }

    Ok(())
}
