//! Suggestion types for proposed corrections.

use serde::Serialize;

use crate::validation::Severity;

/// Kind of corrective action a suggestion asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionAction {
    /// Fix the export or integration that produced repeated rows.
    Deduplicate,
    /// Correct master data (CFOP setup, NCM, CNPJ registrations).
    UpdateRegistration,
    /// Recompute a monetary value and update the document.
    Recalculate,
    /// Escalate to the fiscal team for manual review.
    Review,
}

impl SuggestionAction {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            SuggestionAction::Deduplicate => "Remover duplicidade",
            SuggestionAction::UpdateRegistration => "Ajustar cadastro",
            SuggestionAction::Recalculate => "Recalcular valores",
            SuggestionAction::Review => "Revisão manual",
        }
    }
}

/// A proposed correction for one rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    /// Identifier of the rule this suggestion addresses.
    pub rule_id: String,

    pub action: SuggestionAction,

    /// Priority (1 = highest).
    pub priority: u8,

    /// Guidance shown to the user.
    pub text: String,

    /// Number of flagged rows, when known.
    pub affected_rows: usize,
}

impl Suggestion {
    pub fn new(rule_id: impl Into<String>, action: SuggestionAction, text: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            action,
            priority: 3,
            text: text.into(),
            affected_rows: 0,
        }
    }

    /// Derive the priority from a finding's severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.priority = match severity {
            Severity::Alta => 1,
            Severity::Media => 2,
            Severity::Baixa => 3,
        };
        self
    }

    pub fn with_affected_rows(mut self, rows: usize) -> Self {
        self.affected_rows = rows;
        self
    }
}
