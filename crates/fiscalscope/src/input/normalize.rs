//! Column label normalization and the canonical fiscal schema.
//!
//! Labels coming from ERP exports, portal downloads and spreadsheets vary
//! wildly ("Chave de Acesso", "CHAVE_DE_ACESSO_NOTA", ...). Everything is
//! resolved here, once, so downstream code only sees canonical names.

use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use super::cell::Cell;
use super::dataset::Dataset;

/// Normalized label -> canonical column name.
const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("chave_de_acesso", "chave_acesso"),
    ("chave_de_acesso_item", "chave_acesso"),
    ("chave_de_acesso_nota", "chave_acesso"),
    ("modelo_nota", "modelo"),
    ("modelo_item", "modelo"),
    ("serie_nota", "serie"),
    ("serie_item", "serie"),
    ("numero_nota", "numero"),
    ("natureza_da_operacao_nota", "natureza_operacao"),
    ("natureza_da_operacao_item", "natureza_operacao"),
    ("data_emissao_nota", "data_emissao"),
    ("data_emissao_item", "data_emissao"),
    ("evento_mais_recente", "evento_recente"),
    ("data_hora_evento_mais_recente", "data_evento_recente"),
    ("cpf_cnpj_emitente", "cnpj_emitente"),
    ("cpf_cnpj_emitente_nota", "cnpj_emitente"),
    ("cpf_cnpj_emitente_item", "cnpj_emitente"),
    ("razao_social_emitente", "razao_emitente"),
    ("razao_social_emitente_nota", "razao_emitente"),
    ("razao_social_emitente_item", "razao_emitente"),
    ("inscricao_estadual_emitente_nota", "ie_emitente"),
    ("uf_emitente_nota", "uf_emitente"),
    ("municipio_emitente_nota", "municipio_emitente"),
    ("cnpj_destinatario_nota", "cnpj_destinatario"),
    ("cnpj_destinatario_item", "cnpj_destinatario"),
    ("nome_destinatario", "razao_destinatario"),
    ("nome_destinatario_nota", "razao_destinatario"),
    ("nome_destinatario_item", "razao_destinatario"),
    ("uf_destinatario_nota", "uf_destinatario"),
    ("uf_destinatario_item", "uf_destinatario"),
    ("indicador_ie_destinatario_nota", "indicador_ie"),
    ("indicador_ie_destinatario_item", "indicador_ie"),
    ("destino_da_operacao", "destino_operacao"),
    ("destino_da_operacao_nota", "destino_operacao"),
    ("destino_da_operacao_item", "destino_operacao"),
    ("consumidor_final_nota", "consumidor_final"),
    ("presenca_do_comprador_nota", "presenca_comprador"),
    ("valor_nota_fiscal", "valor_total_nota"),
    ("numero_produto", "numero_item"),
    ("descricao_do_produto_servico", "descricao_item"),
    ("codigo_ncm_sh", "ncm"),
    ("ncm_sh_tipo_de_produto", "descricao_ncm"),
    ("valor_total", "valor_total_item"),
    ("base_calculo_icms", "base_icms"),
    ("base_calculo_ipi", "base_ipi"),
];

/// Columns coerced to numbers; unparseable values become null.
pub const NUMERIC_COLUMNS: &[&str] = &[
    "serie",
    "valor_total_item",
    "valor_total_nota",
    "quantidade",
    "valor_unitario",
    "aliquota_icms",
    "valor_icms",
    "base_icms",
    "aliquota_ipi",
    "valor_ipi",
    "base_ipi",
];

/// Code columns kept as trimmed text.
pub const CODE_COLUMNS: &[&str] = &[
    "cfop",
    "ncm",
    "chave_acesso",
    "cnpj_emitente",
    "cnpj_destinatario",
];

/// Normalize a raw label: strip diacritics, lowercase, and collapse every run
/// of non-alphanumeric characters into a single `_`.
pub fn normalize_label(label: &str) -> String {
    let ascii: String = label
        .nfkd()
        .filter(|c| c.is_ascii())
        .collect::<String>()
        .to_lowercase();

    ascii
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Map a normalized label to its canonical column name.
pub fn canonical_name(normalized: &str) -> &str {
    COLUMN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(normalized)
}

/// Resolve labels into the canonical fiscal schema.
///
/// Renames columns, keeps the first occurrence on collisions, coerces
/// monetary/quantity columns to numbers, renders code columns as trimmed text
/// and adds an all-null `numero_item` when absent.
pub fn normalize_dataset(dataset: Dataset) -> Dataset {
    let renamed = dataset.rename_columns(|label| canonical_name(&normalize_label(label)).to_string());

    let mut columns: Vec<(String, Vec<Cell>)> = renamed
        .columns()
        .map(|(name, cells)| {
            let cells = if NUMERIC_COLUMNS.contains(&name) {
                cells.iter().map(|c| Cell::from(c.as_f64())).collect()
            } else if CODE_COLUMNS.contains(&name) {
                cells.iter().map(code_cell).collect()
            } else {
                cells.to_vec()
            };
            (name.to_string(), cells)
        })
        .collect();

    if !renamed.has_column("numero_item") {
        debug!("adding empty numero_item column");
        columns.push(("numero_item".to_string(), vec![Cell::Null; renamed.row_count()]));
    }

    let row_count = renamed.row_count();
    // Same lengths by construction; fall back to the renamed table otherwise.
    Dataset::from_columns(columns).unwrap_or_else(|_| {
        debug!(rows = row_count, "normalization produced ragged columns");
        renamed
    })
}

fn code_cell(cell: &Cell) -> Cell {
    if cell.is_null() {
        Cell::Null
    } else {
        Cell::Text(cell.to_text().trim().to_string())
    }
}
