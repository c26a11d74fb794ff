//! Issue summaries, triage order and offender ranking.

use indexmap::IndexMap;
use serde::Serialize;

use crate::validation::{Severity, ValidationResult};

/// One row per finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueSummary {
    pub title: String,
    pub id: String,
    pub severity: Severity,
    /// Number of detail rows.
    pub occurrences: usize,
    pub description: String,
}

pub fn summarize_issues(results: &[ValidationResult]) -> Vec<IssueSummary> {
    results
        .iter()
        .map(|r| IssueSummary {
            title: r.title.clone(),
            id: r.identifier.clone(),
            severity: r.severity,
            occurrences: r.details.len(),
            description: r.conclusion.clone(),
        })
        .collect()
}

/// Triage order: most severe first, then most occurrences.
pub fn prioritize(mut summary: Vec<IssueSummary>) -> Vec<IssueSummary> {
    summary.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.occurrences.cmp(&a.occurrences))
    });
    summary
}

/// An entity implicated by one or more findings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffenderRow {
    pub value: String,
    pub occurrences: usize,
    /// Distinct titles of the rules that flagged this value.
    pub rules: Vec<String>,
}

/// Rank the values of `group_column` across every finding whose detail
/// table carries it.
///
/// Each detail row counts once; null values are dropped. Ties keep the
/// order in which values were first seen.
pub fn offenders_by(results: &[ValidationResult], group_column: &str) -> Vec<OffenderRow> {
    let mut counts: IndexMap<String, OffenderRow> = IndexMap::new();

    for result in results {
        let Some(values) = result.details.column(group_column) else {
            continue;
        };
        for value in values.filter(|v| !v.is_null()) {
            let key = value.to_text();
            let row = counts.entry(key.clone()).or_insert_with(|| OffenderRow {
                value: key,
                occurrences: 0,
                rules: Vec::new(),
            });
            row.occurrences += 1;
            if !row.rules.contains(&result.title) {
                row.rules.push(result.title.clone());
            }
        }
    }

    let mut ranked: Vec<OffenderRow> = counts.into_values().collect();
    ranked.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Cell;
    use crate::validation::DetailTable;

    fn finding(id: &str, severity: Severity, issuers: &[Option<&str>]) -> ValidationResult {
        let mut details = DetailTable::new(vec!["chave_acesso".into(), "razao_emitente".into()]);
        for issuer in issuers {
            details.push_row(vec![
                Cell::text("K"),
                issuer.map(Cell::text).unwrap_or(Cell::Null),
            ]);
        }
        ValidationResult {
            identifier: id.to_string(),
            title: format!("Regra {}", id),
            severity,
            conclusion: format!("{} conclusion", id),
            details,
        }
    }

    #[test]
    fn test_offenders_ranked_across_rules() {
        let results = vec![
            finding("a", Severity::Alta, &[Some("BETA SA"), Some("ACME LTDA")]),
            finding("b", Severity::Media, &[Some("ACME LTDA"), None]),
        ];
        let offenders = offenders_by(&results, "razao_emitente");
        assert_eq!(offenders.len(), 2);
        assert_eq!(offenders[0].value, "ACME LTDA");
        assert_eq!(offenders[0].occurrences, 2);
        assert_eq!(offenders[0].rules, vec!["Regra a", "Regra b"]);
        assert_eq!(offenders[1].value, "BETA SA");
        assert_eq!(offenders[1].occurrences, 1);
    }

    #[test]
    fn test_offenders_missing_column() {
        let results = vec![finding("a", Severity::Alta, &[Some("ACME")])];
        assert!(offenders_by(&results, "razao_destinatario").is_empty());
    }

    #[test]
    fn test_prioritize() {
        let results = vec![
            finding("m", Severity::Media, &[None; 9]),
            finding("a1", Severity::Alta, &[None; 2]),
            finding("a2", Severity::Alta, &[None; 5]),
        ];
        let summary = summarize_issues(&results);
        assert_eq!(summary[0].occurrences, 9);
        assert_eq!(summary[0].description, "m conclusion");

        let ordered: Vec<String> = prioritize(summary).into_iter().map(|s| s.id).collect();
        assert_eq!(ordered, vec!["a2", "a1", "m"]);
    }
}
