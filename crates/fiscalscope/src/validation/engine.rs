//! Runs the fiscal rule battery over a dataset.

use tracing::{debug, info};

use super::result::{RuleEvaluation, RuleOutcome, ValidationResult};
use super::rules::{default_rules, FiscalRule};
use super::schema::FiscalSchema;
use crate::error::Result;
use crate::input::Dataset;

/// Validation engine that runs every registered rule.
pub struct FiscalRuleEngine {
    rules: Vec<Box<dyn FiscalRule>>,
}

impl FiscalRuleEngine {
    /// Create an engine with the default rule battery.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Create an engine with no rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register an additional rule, evaluated after the existing ones.
    pub fn with_rule(mut self, rule: impl FiscalRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn FiscalRule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Look up a rule by identifier.
    pub fn rule(&self, id: &str) -> Option<&dyn FiscalRule> {
        self.rules().find(|r| r.id() == id)
    }

    /// Evaluate every rule, including the ones that passed or were skipped.
    ///
    /// Fails before any rule runs when mandatory columns are missing.
    pub fn evaluate(&self, dataset: &Dataset) -> Result<Vec<RuleEvaluation>> {
        let schema = FiscalSchema::resolve(dataset)?;
        info!(
            rows = dataset.row_count(),
            rules = self.rules.len(),
            note_total = %schema.note_total,
            "running fiscal validations"
        );

        let evaluations = self
            .rules
            .iter()
            .map(|rule| {
                let outcome = rule.evaluate(dataset, &schema);
                match &outcome {
                    RuleOutcome::Violations { details } => {
                        debug!(rule = rule.id(), rows = details.len(), "rule flagged rows")
                    }
                    RuleOutcome::Skipped { reason } => debug!(rule = rule.id(), %reason, "rule skipped"),
                    RuleOutcome::Passed => debug!(rule = rule.id(), "rule passed"),
                }
                RuleEvaluation {
                    identifier: rule.id().to_string(),
                    title: rule.title().to_string(),
                    severity: rule.severity(),
                    conclusion: rule.conclusion().to_string(),
                    outcome,
                }
            })
            .collect();
        Ok(evaluations)
    }

    /// Findings of the rules that flagged rows, in registration order.
    pub fn run(&self, dataset: &Dataset) -> Result<Vec<ValidationResult>> {
        let results: Vec<ValidationResult> = self
            .evaluate(dataset)?
            .into_iter()
            .filter_map(RuleEvaluation::into_result)
            .collect();
        info!(findings = results.len(), "fiscal validations finished");
        Ok(results)
    }
}

impl Default for FiscalRuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FiscalRuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FiscalRuleEngine")
            .field("rules", &self.rules().map(|r| r.id()).collect::<Vec<_>>())
            .finish()
    }
}

/// Run the default rule battery.
pub fn run_core_validations(dataset: &Dataset) -> Result<Vec<ValidationResult>> {
    FiscalRuleEngine::new().run(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScopeError;
    use crate::input::Cell;
    use crate::validation::result::{DetailTable, Severity};

    fn items(totals: [f64; 2], note_total: f64) -> Dataset {
        Dataset::from_columns(vec![
            ("chave_acesso", vec![Cell::text("K1"), Cell::text("K1")]),
            ("numero", vec![Cell::Number(1.0), Cell::Number(1.0)]),
            ("numero_item", vec![Cell::Number(1.0), Cell::Number(2.0)]),
            ("cfop", vec![Cell::text("5102"), Cell::text("5102")]),
            ("ncm", vec![Cell::text("01012100"), Cell::text("0101")]),
            ("quantidade", vec![Cell::Number(1.0), Cell::Number(1.0)]),
            ("valor_unitario", vec![Cell::Number(totals[0]), Cell::Number(totals[1])]),
            ("valor_total_item", vec![Cell::Number(totals[0]), Cell::Number(totals[1])]),
            ("valor_nota_fiscal", vec![Cell::Number(note_total), Cell::Number(note_total)]),
        ])
        .unwrap()
    }

    struct AlwaysFlags;

    impl FiscalRule for AlwaysFlags {
        fn id(&self) -> &'static str {
            "always"
        }
        fn title(&self) -> &'static str {
            "Always"
        }
        fn severity(&self) -> Severity {
            Severity::Baixa
        }
        fn conclusion(&self) -> &'static str {
            "flags the first row"
        }
        fn evaluate(&self, _dataset: &Dataset, _schema: &FiscalSchema) -> RuleOutcome {
            let mut table = DetailTable::new(vec!["linha".into()]);
            table.push_row(vec![Cell::Number(0.0)]);
            RuleOutcome::from_details(table)
        }
    }

    #[test]
    fn test_run_reports_only_flagging_rules() {
        let results = run_core_validations(&items([10.0, 5.0], 15.0)).unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["ncm_invalido"]);
    }

    #[test]
    fn test_evaluate_keeps_skipped_rules() {
        let evaluations = FiscalRuleEngine::new().evaluate(&items([10.0, 5.0], 15.0)).unwrap();
        assert_eq!(evaluations.len(), 7);
        let cfop = evaluations.iter().find(|e| e.identifier == "cfop_destino").unwrap();
        assert_eq!(cfop.outcome.status(), "skipped");
        let item = evaluations.iter().find(|e| e.identifier == "valor_item_divergente").unwrap();
        assert_eq!(item.outcome, RuleOutcome::Passed);
    }

    #[test]
    fn test_missing_columns_fail_before_rules() {
        let dataset = items([10.0, 5.0], 15.0);
        let dataset = Dataset::from_columns(
            dataset
                .columns()
                .filter(|(name, _)| *name != "ncm")
                .map(|(name, cells)| (name.to_string(), cells.to_vec())),
        )
        .unwrap();

        match FiscalRuleEngine::new().run(&dataset) {
            Err(ScopeError::MissingColumns(missing)) => assert_eq!(missing, vec!["ncm".to_string()]),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_custom_rule_registration() {
        let engine = FiscalRuleEngine::empty().with_rule(AlwaysFlags);
        assert!(engine.rule("always").is_some());
        assert!(engine.rule("ncm_invalido").is_none());

        let results = engine.run(&items([10.0, 5.0], 15.0)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Baixa);
    }
}
