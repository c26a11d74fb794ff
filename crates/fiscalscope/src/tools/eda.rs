//! Exploratory analysis tools.

use super::registry::{Domain, FunctionTool, ToolSession};
use crate::analysis::ClusterReport;
use crate::error::Result;
use crate::input::format_general;
use crate::report::MarkdownTable;
use crate::suggestion::OUTLIER_TREATMENTS;

pub(super) fn tools() -> Vec<FunctionTool> {
    vec![
        FunctionTool::new(
            "outlier_report",
            Domain::Eda,
            "Gera um relatório sobre valores atípicos (outliers) utilizando o critério de 1.5 IQR e sugere tratamentos.",
            outlier_report,
        ),
        FunctionTool::new(
            "cluster_report",
            Domain::Eda,
            "Avalia a existência de clusters usando K-Means e retorna o número de grupos sugerido.",
            cluster_report,
        ),
        FunctionTool::new(
            "temporal_report",
            Domain::Eda,
            "Identifica colunas temporais e descreve padrões de tendência em relação a variáveis numéricas.",
            temporal_report,
        ),
        FunctionTool::new(
            "frequency_report",
            Domain::Eda,
            "Lista valores mais e menos frequentes por coluna do dataset.",
            frequency_report,
        ),
        FunctionTool::new(
            "relationship_report",
            Domain::Eda,
            "Explora correlações numéricas e influência de variáveis categóricas em métricas numéricas.",
            relationship_report,
        ),
        FunctionTool::new(
            "overview_report",
            Domain::Eda,
            "Retorna um resumo geral do dataset carregado, com tipos, contagens e estatísticas centrais.",
            overview_report,
        ),
    ]
}

fn num(value: f64) -> String {
    format_general(value, 4)
}

fn outlier_report(session: &mut ToolSession, _input: &str) -> Result<String> {
    let dataset = session.dataset()?;
    let analyzer = session.analyzer();
    let numeric = analyzer.classifier().numeric_columns(&dataset);
    let reports = analyzer.detect_outliers(&dataset, &numeric);
    if reports.is_empty() {
        return Ok("Nenhum outlier relevante foi detectado usando o critério de 1.5 IQR.".to_string());
    }

    let mut table = MarkdownTable::new([
        "coluna",
        "quantidade",
        "percentual",
        "limite_inferior",
        "limite_superior",
        "impacto_media",
    ]);
    for report in &reports {
        table.push_row([
            report.column.clone(),
            report.count.to_string(),
            format!("{:.2}%", report.percentage),
            num(report.lower_bound),
            num(report.upper_bound),
            num(report.mean_shift),
        ]);
    }

    let mut lines = vec!["Outliers identificados por coluna:".to_string(), table.render()];
    lines.push("Sugestões de tratamento:".to_string());
    lines.extend(OUTLIER_TREATMENTS.iter().map(|tip| format!("- {}", tip)));
    Ok(lines.join("\n"))
}

fn cluster_report(session: &mut ToolSession, _input: &str) -> Result<String> {
    let dataset = session.dataset()?;
    let analyzer = session.analyzer();
    let numeric = analyzer.classifier().numeric_columns(&dataset);

    let text = match analyzer.detect_clusters(&dataset, &numeric) {
        ClusterReport::MissingDependency => {
            "Nenhum backend de clusterização disponível; habilite o recurso `clustering` para avaliar clusters."
                .to_string()
        }
        ClusterReport::NotEnoughFeatures => {
            "É necessário pelo menos duas colunas numéricas para avaliar clusters.".to_string()
        }
        ClusterReport::NotEnoughRows => {
            "Amostra insuficiente (<50 linhas) para clusterizar com confiabilidade.".to_string()
        }
        ClusterReport::ScalingFailed { error } => {
            format!("Não foi possível padronizar as colunas numéricas: {}", error)
        }
        ClusterReport::NoCluster => "Nenhuma estrutura de cluster consistente foi encontrada.".to_string(),
        ClusterReport::Ok {
            k,
            silhouette,
            cluster_sizes,
        } => {
            let sizes: Vec<String> = cluster_sizes
                .iter()
                .map(|(label, size)| format!("Cluster {}: {}", label, size))
                .collect();
            format!(
                "Clusterização sugeriu {} grupos (silhouette≈{}).\nDistribuição de tamanhos: {}",
                k,
                silhouette,
                sizes.join(", ")
            )
        }
    };
    Ok(text)
}

fn temporal_report(session: &mut ToolSession, _input: &str) -> Result<String> {
    let dataset = session.dataset()?;
    let analyzer = session.analyzer();
    let numeric = analyzer.classifier().numeric_columns(&dataset);
    let temporal = analyzer.detect_temporal_patterns(&dataset, &numeric);

    if temporal.columns.is_empty() {
        return Ok("Nenhuma coluna temporal relevante foi detectada.".to_string());
    }
    let mut lines = vec![format!(
        "Colunas temporais identificadas: {}",
        temporal.columns.join(", ")
    )];
    if temporal.insights.is_empty() {
        lines.push("Não foram encontradas tendências monotônicas fortes.".to_string());
    } else {
        lines.push("Principais tendências:".to_string());
        lines.extend(temporal.insights.iter().map(|i| format!("- {}", i)));
    }
    Ok(lines.join("\n"))
}

fn frequency_report(session: &mut ToolSession, _input: &str) -> Result<String> {
    let dataset = session.dataset()?;
    let rows = session.analyzer().identify_value_frequencies(&dataset);
    if rows.is_empty() {
        return Ok("Não há dados suficientes para calcular frequências.".to_string());
    }

    let mut table = MarkdownTable::new(["coluna", "mais_frequente", "freq_max", "menos_frequente", "freq_min"]);
    for row in rows {
        table.push_row([
            row.column,
            row.most_frequent,
            row.max_count.to_string(),
            row.least_frequent,
            row.min_count.to_string(),
        ]);
    }
    Ok(format!("Valores mais e menos frequentes por coluna:\n{}", table))
}

fn relationship_report(session: &mut ToolSession, _input: &str) -> Result<String> {
    let dataset = session.dataset()?;
    let analyzer = session.analyzer();
    let numeric = analyzer.classifier().numeric_columns(&dataset);
    let non_numeric = analyzer.classifier().non_numeric_columns(&dataset);
    let summary = analyzer.summarize_relationships(&dataset, &numeric, &non_numeric);

    let mut lines = Vec::new();
    if summary.correlations.is_empty() {
        lines.push("Nenhuma correlação numérica destacada (|rho| ≥ 0.2).".to_string());
    } else {
        lines.push("Correlações numéricas relevantes:".to_string());
        lines.extend(
            summary
                .correlations
                .iter()
                .map(|c| format!("- {} (|rho|≈{})", c.variables, c.correlation)),
        );
    }

    if summary.categorical.is_empty() {
        lines.push("Nenhuma categoria com impacto médio significativo detectado.".to_string());
    } else {
        lines.push("Influências de categóricas sobre numéricas:".to_string());
        lines.extend(summary.categorical.iter().map(|d| {
            format!(
                "- {} impacta {} (diferença média ≈ {})",
                d.driver, d.target, d.mean_spread
            )
        }));
    }
    Ok(lines.join("\n"))
}

fn overview_report(session: &mut ToolSession, _input: &str) -> Result<String> {
    let dataset = session.dataset()?;
    let analyzer = session.analyzer();
    let overview = analyzer.overview(&dataset);
    let roles = analyzer.classifier().classify(&dataset);

    let mut lines = vec![
        "Resumo do conjunto de dados:".to_string(),
        format!("- Linhas: {}", overview.n_rows),
        format!("- Colunas: {}", overview.n_cols),
        format!("- Numéricas: {}", overview.numeric_columns.len()),
        format!("- Não numéricas: {}", overview.non_numeric_columns.len()),
    ];

    let role_lines: Vec<String> = dataset
        .column_names()
        .map(|c| format!("  • {}: {}", c, roles.role(c).label()))
        .collect();
    lines.push(format!("Tipos por coluna:\n{}", role_lines.join("\n")));

    let mut stats = MarkdownTable::new(["coluna", "count", "mean", "std", "min", "25%", "50%", "75%", "max"]);
    for (column, description) in &overview.describe {
        let Some(s) = &description.numeric else {
            continue;
        };
        stats.push_row([
            column.clone(),
            s.count.to_string(),
            num(s.mean),
            s.std.map(num).unwrap_or_else(|| "-".to_string()),
            num(s.min),
            num(s.q1),
            num(s.median),
            num(s.q3),
            num(s.max),
        ]);
    }
    if stats.is_empty() {
        lines.push("Estatísticas principais indisponíveis.".to_string());
    } else {
        lines.push(format!("Estatísticas principais:\n{}", stats));
    }

    if !overview.missing.is_empty() {
        let missing: Vec<String> = overview
            .missing
            .iter()
            .map(|m| format!("  {}: {:.2}%", m.column, m.fraction * 100.0))
            .collect();
        lines.push(format!("Percentual de valores ausentes:\n{}", missing.join("\n")));
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Cell, Dataset};
    use crate::tools::ToolRegistry;

    fn invoke(session: &mut ToolSession, name: &str) -> String {
        ToolRegistry::new().invoke(session, name, "")
    }

    fn sales() -> Dataset {
        let n = 12;
        let mut values: Vec<Cell> = (1..=n).map(|v| Cell::Number(v as f64)).collect();
        values[11] = Cell::Number(500.0);
        Dataset::from_columns(vec![
            (
                "data",
                (1..=n).map(|d| Cell::text(format!("2024-03-{:02}", d))).collect::<Vec<_>>(),
            ),
            ("valor", values),
            ("uf", (1..=n).map(|i| Cell::text(if i % 2 == 0 { "SP" } else { "RJ" })).collect()),
        ])
        .unwrap()
    }

    #[test]
    fn test_outlier_report_lists_treatments() {
        let mut session = ToolSession::new().with_dataset(sales());
        let text = invoke(&mut session, "outlier_report");
        assert!(text.starts_with("Outliers identificados por coluna:"));
        assert!(text.contains("| valor"));
        assert!(text.ends_with(OUTLIER_TREATMENTS[3]));
    }

    #[test]
    fn test_cluster_report_needs_two_features() {
        let mut session = ToolSession::new().with_dataset(sales());
        assert_eq!(
            invoke(&mut session, "cluster_report"),
            "É necessário pelo menos duas colunas numéricas para avaliar clusters."
        );
    }

    #[test]
    fn test_temporal_report() {
        let mut session = ToolSession::new().with_dataset(sales());
        let text = invoke(&mut session, "temporal_report");
        assert!(text.starts_with("Colunas temporais identificadas: data"));
        assert!(text.contains("valor tem tendência crescente em relação a data"));
    }

    #[test]
    fn test_overview_report() {
        let mut session = ToolSession::new().with_dataset(sales());
        let text = invoke(&mut session, "overview_report");
        assert!(text.contains("- Linhas: 12"));
        assert!(text.contains("  • data: temporal"));
        assert!(text.contains("  • uf: categorical"));
        assert!(text.contains("Estatísticas principais:"));
    }

    #[test]
    fn test_frequency_and_relationships() {
        let mut session = ToolSession::new().with_dataset(sales());
        let text = invoke(&mut session, "frequency_report");
        assert!(text.starts_with("Valores mais e menos frequentes por coluna:"));
        assert!(text.contains("| uf"));

        let text = invoke(&mut session, "relationship_report");
        assert!(text.contains("Nenhuma correlação numérica destacada"));
        assert!(text.contains("impacta valor"));
    }
}
