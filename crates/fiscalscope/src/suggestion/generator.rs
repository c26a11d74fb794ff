//! Rule-keyed correction guidance.

use tracing::debug;

use super::{Suggestion, SuggestionAction};
use crate::validation::ValidationResult;

/// Guidance for rules without a dedicated entry.
pub const DEFAULT_CORRECTION: &str = "Documente o caso para revisão manual da equipe fiscal.";

/// Ways to treat outliers, offered alongside an outlier report.
pub const OUTLIER_TREATMENTS: &[&str] = &[
    "Remoção dos outliers para análises sensíveis à média (use apenas se forem erros claros).",
    "Aplicar cap/floor (winsorização) para limitar o impacto dos extremos sem perdê-los totalmente.",
    "Transformações log/box-cox em variáveis assimétricas para reduzir o peso de valores altos.",
    "Investigar manualmente registros atípicos com contexto de negócio antes de decidir removê-los.",
];

const CORRECTIONS: &[(&str, SuggestionAction, &str)] = &[
    (
        "duplicate_items",
        SuggestionAction::Deduplicate,
        "Verifique se o ERP exportou o mesmo item mais de uma vez. Ajuste a integração para garantir unicidade por chave de acesso + número do item.",
    ),
    (
        "cfop_destino",
        SuggestionAction::UpdateRegistration,
        "Revise o cadastro do CFOP em função do destino da operação. Operações interestaduais devem usar CFOP iniciado em 6 e operações internas em 5.",
    ),
    (
        "ncm_invalido",
        SuggestionAction::UpdateRegistration,
        "Consulte a tabela TIPI/NCM vigente (portal da Receita) e corrija os códigos para oito dígitos.",
    ),
    (
        "cnpj_invalido",
        SuggestionAction::UpdateRegistration,
        "Ajuste os cadastros de emitentes/destinatários garantindo 14 dígitos numéricos (ou 11 para CPF).",
    ),
    (
        "valor_item_divergente",
        SuggestionAction::Recalculate,
        "Recalcule quantidade × valor unitário e atualize o valor total do item na nota ou no pedido de compra.",
    ),
    (
        "valor_nota_divergente",
        SuggestionAction::Recalculate,
        "Confirme se houve descontos/acréscimos na nota e alinhe o total com a soma de itens.",
    ),
    (
        "icms_incoerente",
        SuggestionAction::Recalculate,
        "Recalcule o ICMS usando base e alíquota corretas; atualize o XML ou parametrização fiscal.",
    ),
];

/// Generates correction suggestions without looking at the data.
pub struct SuggestionEngine;

impl SuggestionEngine {
    /// Guidance for a rule id; unknown ids get [`DEFAULT_CORRECTION`].
    pub fn for_rule(rule_id: &str) -> Suggestion {
        let rule_id = rule_id.trim();
        match CORRECTIONS.iter().find(|(id, _, _)| *id == rule_id) {
            Some((id, action, text)) => Suggestion::new(*id, *action, *text),
            None => {
                debug!(rule = rule_id, "no dedicated correction");
                Suggestion::new(rule_id, SuggestionAction::Review, DEFAULT_CORRECTION)
            }
        }
    }

    /// One suggestion per finding, highest priority first.
    pub fn generate(results: &[ValidationResult]) -> Vec<Suggestion> {
        let mut suggestions: Vec<Suggestion> = results
            .iter()
            .map(|r| {
                Self::for_rule(&r.identifier)
                    .with_severity(r.severity)
                    .with_affected_rows(r.details.len())
            })
            .collect();

        // Stable sort keeps rule order within a priority.
        suggestions.sort_by_key(|s| s.priority);
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Cell;
    use crate::validation::{DetailTable, Severity};

    fn finding(id: &str, severity: Severity, rows: usize) -> ValidationResult {
        let mut details = DetailTable::new(vec!["chave_acesso".into()]);
        for _ in 0..rows {
            details.push_row(vec![Cell::text("K")]);
        }
        ValidationResult {
            identifier: id.to_string(),
            title: id.to_string(),
            severity,
            conclusion: String::new(),
            details,
        }
    }

    #[test]
    fn test_every_core_rule_has_guidance() {
        for rule in crate::validation::default_rules() {
            let suggestion = SuggestionEngine::for_rule(rule.id());
            assert_ne!(suggestion.action, SuggestionAction::Review, "{}", rule.id());
        }
    }

    #[test]
    fn test_unknown_rule_falls_back() {
        let suggestion = SuggestionEngine::for_rule(" regra_x ");
        assert_eq!(suggestion.rule_id, "regra_x");
        assert_eq!(suggestion.text, DEFAULT_CORRECTION);
    }

    #[test]
    fn test_generate_orders_by_severity() {
        let results = vec![
            finding("ncm_invalido", Severity::Media, 3),
            finding("cfop_destino", Severity::Alta, 1),
        ];
        let suggestions = SuggestionEngine::generate(&results);
        assert_eq!(suggestions[0].rule_id, "cfop_destino");
        assert_eq!(suggestions[0].priority, 1);
        assert_eq!(suggestions[1].affected_rows, 3);
    }
}
