//! Main FiscalScope struct and public API.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::analysis::{coerce_numeric, AdvancedAnalysis, ClusteringBackend, OverviewReport, StatisticalAnalyzer};
use crate::config::ScopeConfig;
use crate::error::Result;
use crate::input::{Dataset, Parser, SourceMetadata};
use crate::report::audit_report;
use crate::suggestion::{Suggestion, SuggestionEngine};
use crate::summary::{fiscal_overview, prioritize, summarize_issues, FiscalOverview, IssueSummary};
use crate::tools::ToolSession;
use crate::validation::{FiscalRule, FiscalRuleEngine, RuleEvaluation, RuleOutcome, Severity, ValidationResult};

/// Result of exploring a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplorationResult {
    pub overview: OverviewReport,
    pub analysis: AdvancedAnalysis,
}

/// Result of running the fiscal rules over a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Every rule, including the ones that passed or were skipped.
    pub evaluations: Vec<RuleEvaluation>,
    /// Rules that flagged rows.
    pub findings: Vec<ValidationResult>,
    /// Findings in triage order.
    pub issues: Vec<IssueSummary>,
    pub suggestions: Vec<Suggestion>,
    pub summary: ValidationSummary,
}

/// Counts over a validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub rules_run: usize,
    pub rules_flagged: usize,
    pub rules_skipped: usize,
    /// Detail rows over all findings.
    pub total_occurrences: usize,
    /// Flagged rules per severity label.
    pub by_severity: BTreeMap<String, usize>,
    pub recommendation: String,
}

/// The main entry point: loading, exploration, validation and tools.
pub struct FiscalScope {
    config: ScopeConfig,
    parser: Parser,
    analyzer: StatisticalAnalyzer,
    engine: FiscalRuleEngine,
}

impl FiscalScope {
    /// Create an instance with default configuration.
    pub fn new() -> Self {
        Self::with_config(ScopeConfig::default())
    }

    pub fn with_config(config: ScopeConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        let mut analyzer = StatisticalAnalyzer::new().with_iqr_multiplier(config.iqr_multiplier);
        if !config.clustering {
            analyzer = analyzer.without_clustering();
        }

        Self {
            config,
            parser,
            analyzer,
            engine: FiscalRuleEngine::new(),
        }
    }

    /// Use a custom clustering backend.
    pub fn with_clustering_backend(mut self, backend: impl ClusteringBackend + 'static) -> Self {
        self.analyzer = self.analyzer.with_clustering_backend(backend);
        self
    }

    /// Register an additional fiscal rule.
    pub fn with_rule(mut self, rule: impl FiscalRule + 'static) -> Self {
        self.engine = self.engine.with_rule(rule);
        self
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &StatisticalAnalyzer {
        &self.analyzer
    }

    /// Load a CSV/TSV/JSON file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(Dataset, SourceMetadata)> {
        self.parser.parse_file(path)
    }

    /// Overview plus the advanced analyses.
    pub fn explore(&self, dataset: &Dataset) -> ExplorationResult {
        let coerced;
        let dataset = if self.config.coerce_numeric {
            coerced = coerce_numeric(dataset.clone());
            &coerced
        } else {
            dataset
        };

        ExplorationResult {
            overview: self.analyzer.overview(dataset),
            analysis: self.analyzer.compute_advanced_analysis(dataset),
        }
    }

    /// Run the fiscal rules, then summarize, triage and suggest corrections.
    pub fn validate(&self, dataset: &Dataset) -> Result<ValidationReport> {
        let evaluations = self.engine.evaluate(dataset)?;
        let findings: Vec<ValidationResult> = evaluations
            .iter()
            .cloned()
            .filter_map(RuleEvaluation::into_result)
            .collect();

        let summary = summarize(&evaluations, &findings);
        info!(
            flagged = summary.rules_flagged,
            skipped = summary.rules_skipped,
            occurrences = summary.total_occurrences,
            "validation report ready"
        );

        Ok(ValidationReport {
            issues: prioritize(summarize_issues(&findings)),
            suggestions: SuggestionEngine::generate(&findings),
            summary,
            findings,
            evaluations,
        })
    }

    /// Plain-text audit report.
    pub fn audit(&self, dataset: &Dataset) -> Result<String> {
        let findings = self.engine.run(dataset)?;
        Ok(audit_report(&findings, self.config.limits.audit_offenders))
    }

    pub fn fiscal_overview(&self, dataset: &Dataset) -> Result<FiscalOverview> {
        fiscal_overview(dataset)
    }

    /// A tool session over `dataset`, sharing this instance's settings.
    pub fn session(&self, dataset: Dataset) -> ToolSession {
        ToolSession::new()
            .with_analyzer(self.analyzer.clone())
            .with_limits(self.config.limits)
            .with_dataset(dataset)
    }
}

impl Default for FiscalScope {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(evaluations: &[RuleEvaluation], findings: &[ValidationResult]) -> ValidationSummary {
    let mut by_severity = BTreeMap::new();
    for finding in findings {
        *by_severity.entry(finding.severity.label().to_string()).or_insert(0) += 1;
    }
    let high = findings.iter().filter(|f| f.severity == Severity::Alta).count();

    let recommendation = if findings.is_empty() {
        "Nenhuma inconsistência encontrada nas regras aplicadas.".to_string()
    } else if high > 0 {
        format!(
            "Trate primeiro as {} regra(s) de severidade alta antes da escrituração.",
            high
        )
    } else {
        "Revise os apontamentos de severidade média e atualize os cadastros.".to_string()
    };

    ValidationSummary {
        rules_run: evaluations.len(),
        rules_flagged: findings.len(),
        rules_skipped: evaluations
            .iter()
            .filter(|e| matches!(e.outcome, RuleOutcome::Skipped { .. }))
            .count(),
        total_occurrences: findings.iter().map(|f| f.details.len()).sum(),
        by_severity,
        recommendation,
    }
}
