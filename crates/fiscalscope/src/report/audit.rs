//! Issue, offender and audit report rendering.

use super::MarkdownTable;
use crate::summary::{offenders_by, summarize_issues, IssueSummary, OffenderRow};
use crate::validation::{Severity, ValidationResult};

/// Capitalized priority label for a severity.
pub fn priority_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Alta => "Alta",
        Severity::Media => "Média",
        Severity::Baixa => "Baixa",
    }
}

/// One row per issue; `with_priority` appends a `prioridade` column.
pub fn issue_table(summary: &[IssueSummary], with_priority: bool) -> MarkdownTable {
    let mut headers = vec!["regra", "id", "severidade", "ocorrencias", "descricao"];
    if with_priority {
        headers.push("prioridade");
    }
    let mut table = MarkdownTable::new(headers);
    for issue in summary {
        let mut row = vec![
            issue.title.clone(),
            issue.id.clone(),
            issue.severity.label().to_string(),
            issue.occurrences.to_string(),
            issue.description.clone(),
        ];
        if with_priority {
            row.push(priority_label(issue.severity).to_string());
        }
        table.push_row(row);
    }
    table
}

/// The first `limit` offenders.
pub fn offender_table(group_column: &str, offenders: &[OffenderRow], limit: usize) -> MarkdownTable {
    let mut table = MarkdownTable::new([group_column, "ocorrencias", "regras"]);
    for offender in offenders.iter().take(limit) {
        table.push_row([
            offender.value.clone(),
            offender.occurrences.to_string(),
            offender.rules.join("; "),
        ]);
    }
    table
}

/// Consolidated audit report: scope, violated rules, repeat issuers and
/// most affected recipients.
pub fn audit_report(results: &[ValidationResult], offender_limit: usize) -> String {
    let mut blocks = vec![
        "RELATÓRIO DE AUDITORIA FISCAL".to_string(),
        "- Escopo: notas fiscais eletrônicas carregadas no módulo fiscal.".to_string(),
        "- Objetivo: sinalizar inconsistências críticas para correção antes da escrituração.".to_string(),
    ];

    let summary = summarize_issues(results);
    if summary.is_empty() {
        blocks.push("Nenhuma inconsistência relevante foi encontrada.".to_string());
    } else {
        blocks.push("Síntese das regras violadas:".to_string());
        blocks.push(issue_table(&summary, false).render());
    }

    let issuers = offenders_by(results, "razao_emitente");
    if !issuers.is_empty() {
        blocks.push("Emitentes com maior reincidência:".to_string());
        blocks.push(offender_table("razao_emitente", &issuers, offender_limit).render());
    }
    let recipients = offenders_by(results, "razao_destinatario");
    if !recipients.is_empty() {
        blocks.push("Destinatários mais impactados:".to_string());
        blocks.push(offender_table("razao_destinatario", &recipients, offender_limit).render());
    }

    blocks.push(
        "Recomenda-se repassar a lista para os responsáveis e atualizar cadastros/parametrizações fiscais."
            .to_string(),
    );
    blocks.join("\n\n")
}
