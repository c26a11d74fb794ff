//! Fiscal KPIs and note-level lookups over an NF-e item table.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::analysis::stats::round_to;
use crate::error::{Result, ScopeError};
use crate::input::{Cell, CellKey, Dataset};
use crate::validation::NOTE_TOTAL_SYNONYMS;

/// Rows kept in each top-N ranking.
pub const TOP_GROUPS: usize = 10;

/// Sum of note totals for one `YYYY-MM` period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    pub competencia: String,
    pub valor: f64,
}

/// Sum of item totals for one group value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub value: String,
    pub total: f64,
}

/// Headline figures of a fiscal dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiscalOverview {
    pub total_notas: usize,
    pub total_itens: usize,
    pub total_emitentes: usize,
    pub total_destinatarios: usize,
    pub valor_total_itens: f64,
    pub valor_total_notas: f64,
    pub valor_medio_nota: f64,
    /// Ordered by period.
    pub timeline: Vec<MonthlyTotal>,
    pub top_cfop: Vec<GroupTotal>,
    pub top_ncm: Vec<GroupTotal>,
    pub top_emitentes: Vec<GroupTotal>,
    pub top_destinatarios: Vec<GroupTotal>,
}

fn note_total_column(dataset: &Dataset) -> Option<&'static str> {
    NOTE_TOTAL_SYNONYMS.iter().copied().find(|c| dataset.has_column(c))
}

fn distinct_non_null(dataset: &Dataset, column: &str) -> usize {
    dataset
        .column(column)
        .map(|cells| {
            cells
                .iter()
                .filter(|c| !c.is_null())
                .map(Cell::key)
                .collect::<HashSet<_>>()
                .len()
        })
        .unwrap_or(0)
}

/// Compute note/item counts, totals, the monthly timeline and top groups.
///
/// Notes are the distinct (access key, number, note total, issue date) rows.
/// Fails with [`ScopeError::MissingColumns`] when no note total column exists.
pub fn fiscal_overview(dataset: &Dataset) -> Result<FiscalOverview> {
    let note_col = note_total_column(dataset)
        .ok_or_else(|| ScopeError::MissingColumns(vec![NOTE_TOTAL_SYNONYMS[0].to_string()]))?;

    let mut note_cols = vec!["chave_acesso", "numero", note_col];
    if dataset.has_column("data_emissao") {
        note_cols.push("data_emissao");
    }

    // First row of every distinct note tuple.
    let mut seen: HashSet<Vec<CellKey>> = HashSet::new();
    let note_rows: Vec<usize> = (0..dataset.row_count())
        .filter(|&row| {
            let key: Vec<CellKey> = note_cols
                .iter()
                .map(|c| dataset.cell(row, c).map(Cell::key).unwrap_or(CellKey::Null))
                .collect();
            seen.insert(key)
        })
        .collect();

    let note_values: Vec<Option<f64>> = note_rows
        .iter()
        .map(|&row| dataset.cell(row, note_col).and_then(Cell::as_f64))
        .collect();

    let total_notas = {
        let keys: HashSet<CellKey> = note_rows
            .iter()
            .filter_map(|&row| dataset.cell(row, "chave_acesso"))
            .filter(|c| !c.is_null())
            .map(Cell::key)
            .collect();
        keys.len()
    };

    let valor_total_itens: f64 = dataset
        .numeric_values("valor_total_item")
        .map(|v| v.into_iter().flatten().sum())
        .unwrap_or(0.0);
    let valor_total_notas: f64 = note_values.iter().flatten().sum();

    let timeline = monthly_timeline(dataset, &note_rows, &note_values);
    debug!(notes = total_notas, months = timeline.len(), "fiscal overview computed");

    Ok(FiscalOverview {
        total_notas,
        total_itens: dataset.row_count(),
        total_emitentes: distinct_non_null(dataset, "cnpj_emitente"),
        total_destinatarios: distinct_non_null(dataset, "cnpj_destinatario"),
        valor_total_itens: round_to(valor_total_itens, 2),
        valor_total_notas: round_to(valor_total_notas, 2),
        valor_medio_nota: if total_notas > 0 {
            round_to(valor_total_notas / total_notas as f64, 2)
        } else {
            0.0
        },
        timeline,
        top_cfop: top_groups(dataset, "cfop", TOP_GROUPS),
        top_ncm: top_groups(dataset, "ncm", TOP_GROUPS),
        top_emitentes: top_groups(dataset, "razao_emitente", TOP_GROUPS),
        top_destinatarios: top_groups(dataset, "razao_destinatario", TOP_GROUPS),
    })
}

fn monthly_timeline(dataset: &Dataset, note_rows: &[usize], note_values: &[Option<f64>]) -> Vec<MonthlyTotal> {
    if !dataset.has_column("data_emissao") {
        return Vec::new();
    }

    let mut months: IndexMap<String, f64> = IndexMap::new();
    for (&row, value) in note_rows.iter().zip(note_values) {
        let (Some(value), Some(date)) = (
            value,
            dataset.cell(row, "data_emissao").and_then(Cell::as_datetime),
        ) else {
            continue;
        };
        *months.entry(date.format("%Y-%m").to_string()).or_insert(0.0) += value;
    }
    months.sort_keys();

    months
        .into_iter()
        .map(|(competencia, valor)| MonthlyTotal { competencia, valor })
        .collect()
}

/// Sum `valor_total_item` per value of `column`, largest first.
///
/// Without an item total column every row counts as 1.
fn top_groups(dataset: &Dataset, column: &str, limit: usize) -> Vec<GroupTotal> {
    let Some(cells) = dataset.column(column) else {
        return Vec::new();
    };
    let values = dataset.numeric_values("valor_total_item");

    let mut totals: IndexMap<CellKey, f64> = IndexMap::new();
    for (row, cell) in cells.iter().enumerate() {
        if cell.is_null() {
            continue;
        }
        let amount = match &values {
            Some(v) => v[row].unwrap_or(0.0),
            None => 1.0,
        };
        *totals.entry(cell.key()).or_insert(0.0) += amount;
    }

    // Key order first so equal totals come out in a fixed order.
    totals.sort_keys();
    let mut ranked: Vec<(CellKey, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .take(limit)
        .map(|(key, total)| GroupTotal {
            value: key.to_cell().to_text(),
            total,
        })
        .collect()
}

// =============================================================================
// EXTREME NOTE
// =============================================================================

/// Which end of the note value ranking to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Extreme {
    #[default]
    Maior,
    Menor,
}

impl Extreme {
    /// Parse a free-text request; anything that is not a "lowest" synonym
    /// means highest.
    pub fn parse(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "menor" | "min" | "minimo" | "mínimo" => Extreme::Menor,
            _ => Extreme::Maior,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Extreme::Maior => "Maior nota",
            Extreme::Menor => "Menor nota",
        }
    }
}

/// The note with the highest or lowest value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtremeNote {
    pub extreme: Extreme,
    /// `chave_acesso`, or `numero` when there is no access key column.
    pub key_column: String,
    pub key: String,
    pub value: f64,
    pub numero: Option<String>,
    pub emitente: Option<String>,
}

/// Find the note with the highest or lowest value.
///
/// The note value is the declared note total (maximum per key) when that
/// column exists, otherwise the sum of item totals, otherwise the sum of
/// quantity times unit price. `None` when no note value can be computed.
pub fn extreme_note(dataset: &Dataset, extreme: Extreme) -> Option<ExtremeNote> {
    let key_column = ["chave_acesso", "numero"]
        .into_iter()
        .find(|c| dataset.has_column(c))?;
    let keys = dataset.column(key_column)?;

    let mut totals: IndexMap<CellKey, f64> = IndexMap::new();
    if let Some(note_col) = note_total_column(dataset) {
        let values = dataset.numeric_values(note_col)?;
        for (key, value) in keys.iter().zip(values) {
            if let (false, Some(value)) = (key.is_null(), value) {
                let entry = totals.entry(key.key()).or_insert(value);
                *entry = entry.max(value);
            }
        }
    } else {
        let items: Vec<Option<f64>> = match dataset.numeric_values("valor_total_item") {
            Some(values) => values,
            None => {
                let quantity = dataset.numeric_values("quantidade")?;
                let price = dataset.numeric_values("valor_unitario")?;
                quantity
                    .into_iter()
                    .zip(price)
                    .map(|(q, p)| Some(q? * p?))
                    .collect()
            }
        };
        for (key, value) in keys.iter().zip(items) {
            if let (false, Some(value)) = (key.is_null(), value) {
                *totals.entry(key.key()).or_insert(0.0) += value;
            }
        }
    }

    totals.sort_keys();
    let (key, value) = totals.into_iter().reduce(|best, candidate| {
        let better = match extreme {
            Extreme::Maior => candidate.1 > best.1,
            Extreme::Menor => candidate.1 < best.1,
        };
        if better { candidate } else { best }
    })?;

    let first_for_key = |column: &str| -> Option<String> {
        let cells = dataset.column(column)?;
        keys.iter()
            .zip(cells)
            .find(|(k, c)| k.key() == key && !c.is_null())
            .map(|(_, c)| c.to_text())
    };

    Some(ExtremeNote {
        extreme,
        key_column: key_column.to_string(),
        numero: first_for_key("numero"),
        emitente: first_for_key("razao_emitente"),
        key: key.to_cell().to_text(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes() -> Dataset {
        Dataset::from_columns(vec![
            ("chave_acesso", ["K1", "K1", "K2", "K3"].into_iter().map(Cell::text).collect::<Vec<_>>()),
            ("numero", vec![Cell::Number(1.0), Cell::Number(1.0), Cell::Number(2.0), Cell::Number(3.0)]),
            ("cfop", ["5102", "5102", "6108", "5102"].into_iter().map(Cell::text).collect()),
            (
                "data_emissao",
                ["2024-01-05", "2024-01-05", "2024-02-10", "2024-01-20"]
                    .into_iter()
                    .map(Cell::text)
                    .collect(),
            ),
            ("valor_total_item", vec![Cell::Number(60.0), Cell::Number(40.0), Cell::Number(30.0), Cell::Number(500.0)]),
            ("valor_total_nota", vec![Cell::Number(100.0), Cell::Number(100.0), Cell::Number(30.0), Cell::Number(500.0)]),
            ("cnpj_emitente", ["111", "111", "222", "111"].into_iter().map(Cell::text).collect()),
            ("razao_emitente", ["ACME", "ACME", "BETA", "ACME"].into_iter().map(Cell::text).collect()),
        ])
        .unwrap()
    }

    #[test]
    fn test_fiscal_overview_kpis() {
        let overview = fiscal_overview(&notes()).unwrap();
        assert_eq!(overview.total_notas, 3);
        assert_eq!(overview.total_itens, 4);
        assert_eq!(overview.total_emitentes, 2);
        assert_eq!(overview.total_destinatarios, 0);
        assert_eq!(overview.valor_total_itens, 630.0);
        assert_eq!(overview.valor_total_notas, 630.0);
        assert_eq!(overview.valor_medio_nota, 210.0);

        assert_eq!(overview.timeline.len(), 2);
        assert_eq!(overview.timeline[0], MonthlyTotal { competencia: "2024-01".into(), valor: 600.0 });
        assert_eq!(overview.timeline[1].competencia, "2024-02");

        assert_eq!(overview.top_cfop[0], GroupTotal { value: "5102".into(), total: 600.0 });
        assert_eq!(overview.top_emitentes[0].value, "ACME");
        assert!(overview.top_destinatarios.is_empty());
    }

    #[test]
    fn test_fiscal_overview_requires_note_total() {
        let dataset = Dataset::from_columns(vec![("chave_acesso", vec![Cell::text("K1")])]).unwrap();
        assert!(matches!(fiscal_overview(&dataset), Err(ScopeError::MissingColumns(_))));
    }

    #[test]
    fn test_extreme_note_from_declared_total() {
        let dataset = notes();
        let highest = extreme_note(&dataset, Extreme::Maior).unwrap();
        assert_eq!(highest.key, "K3");
        assert_eq!(highest.value, 500.0);
        assert_eq!(highest.numero.as_deref(), Some("3"));
        assert_eq!(highest.emitente.as_deref(), Some("ACME"));

        let lowest = extreme_note(&dataset, Extreme::parse(" Mínimo ")).unwrap();
        assert_eq!(lowest.key, "K2");
        assert_eq!(lowest.emitente.as_deref(), Some("BETA"));
    }

    #[test]
    fn test_extreme_note_from_quantity_and_price() {
        let dataset = Dataset::from_columns(vec![
            ("numero", vec![Cell::Number(7.0), Cell::Number(7.0), Cell::Number(8.0)]),
            ("quantidade", vec![Cell::Number(2.0), Cell::Number(1.0), Cell::Number(1.0)]),
            ("valor_unitario", vec![Cell::Number(10.0), Cell::Number(5.0), Cell::Number(40.0)]),
        ])
        .unwrap();
        let lowest = extreme_note(&dataset, Extreme::Menor).unwrap();
        assert_eq!(lowest.key_column, "numero");
        assert_eq!(lowest.key, "7");
        assert_eq!(lowest.value, 25.0);
    }

    #[test]
    fn test_extreme_note_without_values() {
        let dataset = Dataset::from_columns(vec![("chave_acesso", vec![Cell::text("K1")])]).unwrap();
        assert_eq!(extreme_note(&dataset, Extreme::Maior), None);
    }
}
