//! Rule findings and their supporting tables.

use serde::{Deserialize, Serialize};

use crate::input::Cell;

/// Severity level of a fiscal finding.
///
/// Ordered so that `Alta` is the greatest value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Minor issue.
    Baixa,
    /// Should be reviewed.
    Media,
    /// Likely tax or accounting impact.
    Alta,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Alta => "alta",
            Severity::Media => "media",
            Severity::Baixa => "baixa",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Table of offending rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl DetailTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; missing trailing cells are filled with nulls.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// A single cell.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Copy of the first `n` rows.
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

/// A rule that found violations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    /// Stable rule key, e.g. `cfop_destino`.
    pub identifier: String,
    pub title: String,
    pub severity: Severity,
    /// What the rule checks, in plain language.
    pub conclusion: String,
    pub details: DetailTable,
}

/// Outcome of evaluating one rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleOutcome {
    /// The rule ran and found nothing.
    Passed,
    /// The rule could not run on this dataset.
    Skipped { reason: String },
    /// The rule ran and flagged rows.
    Violations { details: DetailTable },
}

impl RuleOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            RuleOutcome::Passed => "passed",
            RuleOutcome::Skipped { .. } => "skipped",
            RuleOutcome::Violations { .. } => "violations",
        }
    }

    /// Wrap a detail table: empty means the rule passed.
    pub fn from_details(details: DetailTable) -> Self {
        if details.is_empty() {
            RuleOutcome::Passed
        } else {
            RuleOutcome::Violations { details }
        }
    }
}

/// A rule's identity together with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleEvaluation {
    pub identifier: String,
    pub title: String,
    pub severity: Severity,
    pub conclusion: String,
    pub outcome: RuleOutcome,
}

impl RuleEvaluation {
    /// The finding, when the rule flagged rows.
    pub fn into_result(self) -> Option<ValidationResult> {
        match self.outcome {
            RuleOutcome::Violations { details } => Some(ValidationResult {
                identifier: self.identifier,
                title: self.title,
                severity: self.severity,
                conclusion: self.conclusion,
                details,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Alta > Severity::Media);
        assert!(Severity::Media > Severity::Baixa);
        assert_eq!(serde_json::to_string(&Severity::Media).unwrap(), "\"media\"");
    }

    #[test]
    fn test_detail_table_access() {
        let mut table = DetailTable::new(vec!["chave_acesso".into(), "diferenca".into()]);
        table.push_row(vec![Cell::text("K1"), Cell::Number(2.5)]);
        table.push_row(vec![Cell::text("K2")]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "diferenca"), Some(&Cell::Number(2.5)));
        assert_eq!(table.get(1, "diferenca"), Some(&Cell::Null));
        assert_eq!(table.column("chave_acesso").unwrap().count(), 2);
        assert!(table.column("nada").is_none());
        assert_eq!(table.head(1).len(), 1);
    }

    #[test]
    fn test_outcome_from_details() {
        let empty = DetailTable::new(vec!["a".into()]);
        assert_eq!(RuleOutcome::from_details(empty), RuleOutcome::Passed);

        let mut table = DetailTable::new(vec!["a".into()]);
        table.push_row(vec![Cell::Number(1.0)]);
        let evaluation = RuleEvaluation {
            identifier: "x".into(),
            title: "X".into(),
            severity: Severity::Baixa,
            conclusion: String::new(),
            outcome: RuleOutcome::from_details(table),
        };
        assert_eq!(evaluation.into_result().unwrap().details.len(), 1);
    }
}
