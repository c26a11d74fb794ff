//! Mandatory fiscal columns, resolved once per validation run.

use serde::Serialize;

use crate::error::{Result, ScopeError};
use crate::input::Dataset;

/// Accepted names for the declared note total, in order of preference.
pub const NOTE_TOTAL_SYNONYMS: &[&str] = &["valor_total_nota", "valor_nota_fiscal"];

/// Columns every fiscal item table must have, besides the note total.
pub const MANDATORY_COLUMNS: &[&str] = &[
    "chave_acesso",
    "numero",
    "numero_item",
    "cfop",
    "ncm",
    "quantidade",
    "valor_unitario",
    "valor_total_item",
];

/// Optional context columns carried into detail tables when present.
pub const PARTY_COLUMNS: &[&str] = &["razao_emitente", "razao_destinatario"];

/// Canonical column names of a fiscal item table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiscalSchema {
    /// Column holding the declared note total.
    pub note_total: String,
}

impl FiscalSchema {
    /// Check the mandatory columns and pick the note total column.
    ///
    /// Fails with [`ScopeError::MissingColumns`] listing every absent column,
    /// sorted.
    pub fn resolve(dataset: &Dataset) -> Result<Self> {
        let mut missing: Vec<String> = MANDATORY_COLUMNS
            .iter()
            .filter(|c| !dataset.has_column(c))
            .map(|c| c.to_string())
            .collect();

        let note_total = NOTE_TOTAL_SYNONYMS
            .iter()
            .find(|c| dataset.has_column(c))
            .map(|c| c.to_string());
        if note_total.is_none() {
            missing.push(NOTE_TOTAL_SYNONYMS[0].to_string());
        }

        match note_total {
            Some(note_total) if missing.is_empty() => Ok(Self { note_total }),
            _ => {
                missing.sort();
                Err(ScopeError::MissingColumns(missing))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Cell;

    fn dataset(columns: &[&str]) -> Dataset {
        Dataset::from_columns(columns.iter().map(|c| (*c, vec![Cell::Null]))).unwrap()
    }

    #[test]
    fn test_resolve_with_fallback() {
        let mut columns = MANDATORY_COLUMNS.to_vec();
        columns.push("valor_nota_fiscal");
        let schema = FiscalSchema::resolve(&dataset(&columns)).unwrap();
        assert_eq!(schema.note_total, "valor_nota_fiscal");

        columns.push("valor_total_nota");
        let schema = FiscalSchema::resolve(&dataset(&columns)).unwrap();
        assert_eq!(schema.note_total, "valor_total_nota");
    }

    #[test]
    fn test_missing_columns_sorted() {
        let err = FiscalSchema::resolve(&dataset(&["numero", "chave_acesso"])).unwrap_err();
        match err {
            ScopeError::MissingColumns(missing) => {
                assert_eq!(missing.first().map(String::as_str), Some("cfop"));
                assert!(missing.contains(&"valor_total_nota".to_string()));
                let mut sorted = missing.clone();
                sorted.sort();
                assert_eq!(missing, sorted);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
