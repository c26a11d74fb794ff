//! Fiscal auditing tools.

use super::registry::{Domain, FunctionTool, ToolSession};
use crate::error::Result;
use crate::report::{audit_report, format_brl, issue_table, offender_table, MarkdownTable};
use crate::suggestion::SuggestionEngine;
use crate::summary::{extreme_note, offenders_by, prioritize, summarize_issues, Extreme};

pub(super) fn tools() -> Vec<FunctionTool> {
    vec![
        FunctionTool::new(
            "listar_inconsistencias",
            Domain::Fiscal,
            "Lista todas as inconsistências fiscais detectadas automaticamente (formato markdown).",
            list_issues,
        ),
        FunctionTool::new(
            "detalhar_regra",
            Domain::Fiscal,
            "Recebe o identificador de uma regra (ex.: 'cfop_destino') e retorna amostras das notas/vendas afetadas.",
            rule_details,
        ),
        FunctionTool::new(
            "sugerir_correcao",
            Domain::Fiscal,
            "Informa ações recomendadas para endereçar uma regra específica (use o mesmo identificador da regra).",
            suggest_correction,
        ),
        FunctionTool::new(
            "resumo_riscos",
            Domain::Fiscal,
            "Resumo das regras de auditoria violadas com severidade e quantidade de ocorrências.",
            risk_summary,
        ),
        FunctionTool::new(
            "maiores_agressores",
            Domain::Fiscal,
            "Mostra os emitentes e destinatários com maior número de apontamentos fiscais.",
            top_offenders,
        ),
        FunctionTool::new(
            "relatorio_auditoria",
            Domain::Fiscal,
            "Gera um relatório textual consolidado com as principais inconsistências e recomendações.",
            audit,
        ),
        FunctionTool::new(
            "nota_extrema",
            Domain::Fiscal,
            "Retorna a nota fiscal de maior (padrão) ou menor valor, considerando o valor total da nota quando disponível ou a soma de itens (quantidade × valor_unitario).",
            extreme_note_tool,
        ),
    ]
}

fn list_issues(session: &mut ToolSession, _input: &str) -> Result<String> {
    let results = session.validation_results()?;
    let summary = summarize_issues(&results);
    if summary.is_empty() {
        return Ok("Nenhuma inconsistência relevante foi encontrada nas validações automáticas.".to_string());
    }
    Ok(issue_table(&summary, false).render())
}

fn rule_details(session: &mut ToolSession, input: &str) -> Result<String> {
    let results = session.validation_results()?;
    let rule_id = input.trim();
    let Some(result) = results.iter().find(|r| r.identifier == rule_id) else {
        let available: Vec<&str> = results.iter().map(|r| r.identifier.as_str()).collect();
        let available = if available.is_empty() {
            "nenhuma".to_string()
        } else {
            available.join(", ")
        };
        return Ok(format!(
            "Regra '{}' não foi encontrada. Regras disponíveis: {}.",
            rule_id, available
        ));
    };

    if result.details.is_empty() {
        return Ok(format!("A regra {} não apresentou ocorrências.", result.title));
    }
    let limit = session.limits().detail_rows;
    Ok(format!(
        "{}\nResumo: {}\nOcorrências (máx. {} linhas):\n{}",
        result.title,
        result.conclusion,
        limit,
        MarkdownTable::from_details(&result.details, limit)
    ))
}

fn suggest_correction(session: &mut ToolSession, input: &str) -> Result<String> {
    let results = session.validation_results()?;
    let suggestion = SuggestionEngine::for_rule(input);
    match results.iter().find(|r| r.identifier == suggestion.rule_id) {
        Some(result) => Ok(format!("Para '{}': {}", result.title, suggestion.text)),
        None => Ok(suggestion.text),
    }
}

fn risk_summary(session: &mut ToolSession, _input: &str) -> Result<String> {
    let results = session.validation_results()?;
    let summary = summarize_issues(&results);
    if summary.is_empty() {
        return Ok("Sem riscos significativos identificados na auditoria automatizada.".to_string());
    }
    Ok(issue_table(&prioritize(summary), true).render())
}

fn top_offenders(session: &mut ToolSession, _input: &str) -> Result<String> {
    let results = session.validation_results()?;
    let limit = session.limits().top_offenders;

    let mut parts = Vec::new();
    let issuers = offenders_by(&results, "razao_emitente");
    if !issuers.is_empty() {
        parts.push(format!(
            "### Emitentes com mais apontamentos\n{}",
            offender_table("razao_emitente", &issuers, limit)
        ));
    }
    let recipients = offenders_by(&results, "razao_destinatario");
    if !recipients.is_empty() {
        parts.push(format!(
            "### Destinatários com mais apontamentos\n{}",
            offender_table("razao_destinatario", &recipients, limit)
        ));
    }

    if parts.is_empty() {
        return Ok("Não foi possível identificar recorrência por emitente/destinatário.".to_string());
    }
    Ok(parts.join("\n\n"))
}

fn audit(session: &mut ToolSession, _input: &str) -> Result<String> {
    let results = session.validation_results()?;
    Ok(audit_report(&results, session.limits().audit_offenders))
}

fn extreme_note_tool(session: &mut ToolSession, input: &str) -> Result<String> {
    let dataset = session.dataset()?;
    let extreme = Extreme::parse(input);

    let Some(note) = extreme_note(&dataset, extreme) else {
        return Ok("Não foi possível calcular o valor total das notas (verifique colunas 'valor_total_nota', 'valor_total_item' ou 'quantidade'/'valor_unitario').".to_string());
    };

    let mut parts = vec![format!("{} encontrada: {}", extreme.title(), format_brl(note.value))];
    if note.key_column == "chave_acesso" {
        parts.push(format!("Chave de acesso: {}", note.key));
    }
    match &note.numero {
        Some(numero) => parts.push(format!("Número: {}", numero)),
        None if note.key_column == "numero" => parts.push(format!("Número: {}", note.key)),
        None => {}
    }
    if let Some(emitente) = &note.emitente {
        parts.push(format!("Emitente: {}", emitente));
    }
    Ok(parts.join(" | "))
}
