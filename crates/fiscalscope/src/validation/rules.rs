//! The fiscal rule battery.
//!
//! Each rule is a [`FiscalRule`] object checking one cross-column
//! consistency property of an NF-e item table. Monetary checks tolerate a
//! difference of up to 1.00 after rounding to cents.

use std::collections::HashMap;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::result::{DetailTable, RuleOutcome, Severity};
use super::schema::{FiscalSchema, PARTY_COLUMNS};
use crate::analysis::stats::round_to;
use crate::input::{Cell, CellKey, Dataset};

/// Largest accepted absolute difference, in currency units.
pub const MONETARY_TOLERANCE: f64 = 1.0;

static NCM_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{8}$").unwrap());
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Trait for fiscal rules.
pub trait FiscalRule: Send + Sync {
    /// Stable identifier, e.g. `cfop_destino`.
    fn id(&self) -> &'static str;

    /// Human label.
    fn title(&self) -> &'static str;

    fn severity(&self) -> Severity;

    /// What the rule checks.
    fn conclusion(&self) -> &'static str;

    /// Run the rule over a dataset that satisfies `schema`.
    fn evaluate(&self, dataset: &Dataset, schema: &FiscalSchema) -> RuleOutcome;
}

// =============================================================================
// DETAIL TABLE CONSTRUCTION
// =============================================================================

/// A detail column, copied from the dataset or computed by the rule.
#[derive(Clone, Copy)]
enum Field<'a> {
    Source(&'a str),
    /// Copied only when the dataset has it.
    OptionalSource(&'a str),
    Computed(&'a str),
}

/// Builds a detail table from dataset rows plus computed values.
///
/// Issuer/recipient name columns are appended when the dataset has them.
struct DetailWriter<'a> {
    dataset: &'a Dataset,
    fields: Vec<Field<'a>>,
    table: DetailTable,
}

impl<'a> DetailWriter<'a> {
    fn new(dataset: &'a Dataset, fields: &[Field<'a>]) -> Self {
        let mut kept: Vec<Field<'a>> = fields
            .iter()
            .copied()
            .filter(|f| match f {
                Field::OptionalSource(name) => dataset.has_column(name),
                _ => true,
            })
            .collect();
        for party in PARTY_COLUMNS {
            if dataset.has_column(party) {
                kept.push(Field::OptionalSource(party));
            }
        }

        let columns = kept
            .iter()
            .map(|f| match f {
                Field::Source(n) | Field::OptionalSource(n) | Field::Computed(n) => n.to_string(),
            })
            .collect();

        Self {
            dataset,
            fields: kept,
            table: DetailTable::new(columns),
        }
    }

    /// Add the dataset row `row`, filling computed fields in order.
    fn push(&mut self, row: usize, computed: Vec<Cell>) {
        let mut computed = computed.into_iter();
        let cells = self
            .fields
            .iter()
            .map(|f| match f {
                Field::Source(n) | Field::OptionalSource(n) => {
                    self.dataset.cell(row, n).cloned().unwrap_or(Cell::Null)
                }
                Field::Computed(_) => computed.next().unwrap_or(Cell::Null),
            })
            .collect();
        self.table.push_row(cells);
    }

    fn finish(self) -> RuleOutcome {
        RuleOutcome::from_details(self.table)
    }
}

fn numbers(dataset: &Dataset, column: &str) -> Vec<Option<f64>> {
    dataset
        .numeric_values(column)
        .unwrap_or_else(|| vec![None; dataset.row_count()])
}

fn texts(dataset: &Dataset, column: &str) -> Vec<String> {
    dataset
        .column(column)
        .map(|cells| cells.iter().map(Cell::to_text).collect())
        .unwrap_or_else(|| vec![String::new(); dataset.row_count()])
}

// =============================================================================
// DUPLICATE ITEMS
// =============================================================================

/// Same (access key, item number) registered more than once.
pub struct DuplicateItemsRule;

impl FiscalRule for DuplicateItemsRule {
    fn id(&self) -> &'static str {
        "duplicate_items"
    }

    fn title(&self) -> &'static str {
        "Itens duplicados na nota"
    }

    fn severity(&self) -> Severity {
        Severity::Alta
    }

    fn conclusion(&self) -> &'static str {
        "Foram identificados itens com mesma chave de acesso e número de item cadastrados mais de uma vez."
    }

    fn evaluate(&self, dataset: &Dataset, _schema: &FiscalSchema) -> RuleOutcome {
        let (Some(keys), Some(items)) = (dataset.column("chave_acesso"), dataset.column("numero_item")) else {
            return RuleOutcome::Skipped {
                reason: "colunas chave_acesso/numero_item ausentes".to_string(),
            };
        };

        // Rows with a missing key part are never compared.
        let row_keys: Vec<Option<(CellKey, CellKey)>> = keys
            .iter()
            .zip(items)
            .map(|(k, i)| (!k.is_null() && !i.is_null()).then(|| (k.key(), i.key())))
            .collect();

        let mut counts: HashMap<&(CellKey, CellKey), usize> = HashMap::new();
        for key in row_keys.iter().flatten() {
            *counts.entry(key).or_insert(0) += 1;
        }

        let mut writer = DetailWriter::new(
            dataset,
            &[
                Field::Source("chave_acesso"),
                Field::Source("numero"),
                Field::Source("numero_item"),
                Field::OptionalSource("descricao_item"),
                Field::Source("valor_total_item"),
            ],
        );
        for (row, key) in row_keys.iter().enumerate() {
            if key.as_ref().is_some_and(|k| counts.get(k).copied().unwrap_or(0) > 1) {
                writer.push(row, Vec::new());
            }
        }
        writer.finish()
    }
}

// =============================================================================
// CFOP VS DESTINATION
// =============================================================================

/// Destination code -> expected first CFOP digit.
pub const CFOP_PREFIX_RULES: &[(char, char, &str)] = &[
    ('1', '5', "operação interna"),
    ('2', '6', "operação interestadual"),
    ('3', '7', "operação com exterior"),
];

/// Expected CFOP first digit for a destination code.
pub fn expected_cfop_prefix(destination: char) -> Option<char> {
    CFOP_PREFIX_RULES
        .iter()
        .find(|(dest, _, _)| *dest == destination)
        .map(|(_, prefix, _)| *prefix)
}

/// True when the CFOP does not belong to the family expected for the
/// destination. Unknown destinations never mismatch; a CFOP without digits
/// always does.
pub fn cfop_mismatch(cfop: &str, destination: &str) -> bool {
    let Some(expected) = destination
        .chars()
        .find(char::is_ascii_digit)
        .and_then(expected_cfop_prefix)
    else {
        return false;
    };

    let first = DIGIT_RUN
        .find(cfop)
        .and_then(|m| m.as_str().chars().next());
    first != Some(expected)
}

/// CFOP family must match the destination of the operation.
pub struct CfopDestinationRule;

impl FiscalRule for CfopDestinationRule {
    fn id(&self) -> &'static str {
        "cfop_destino"
    }

    fn title(&self) -> &'static str {
        "CFOP incompatível com o destino da operação"
    }

    fn severity(&self) -> Severity {
        Severity::Alta
    }

    fn conclusion(&self) -> &'static str {
        "Há documentos cujo CFOP não condiz com o destino informado (interno, interestadual ou exterior)."
    }

    fn evaluate(&self, dataset: &Dataset, _schema: &FiscalSchema) -> RuleOutcome {
        if !dataset.has_column("destino_operacao") {
            return RuleOutcome::Skipped {
                reason: "coluna destino_operacao ausente".to_string(),
            };
        }

        let cfops = texts(dataset, "cfop");
        let destinations = texts(dataset, "destino_operacao");

        let mut writer = DetailWriter::new(
            dataset,
            &[
                Field::Source("chave_acesso"),
                Field::Source("numero"),
                Field::Source("numero_item"),
                Field::Source("cfop"),
                Field::Source("destino_operacao"),
                Field::Computed("destino_esperado"),
                Field::Source("valor_total_item"),
            ],
        );
        for (row, (cfop, destination)) in cfops.iter().zip(&destinations).enumerate() {
            if cfop_mismatch(cfop, destination) {
                let expected = destination
                    .chars()
                    .find(char::is_ascii_digit)
                    .and_then(expected_cfop_prefix)
                    .map(|p| Cell::text(p.to_string()))
                    .unwrap_or(Cell::Null);
                writer.push(row, vec![expected]);
            }
        }
        writer.finish()
    }
}

// =============================================================================
// NCM
// =============================================================================

/// True when the NCM, minus a literal trailing `.0`, is exactly 8 digits.
pub fn is_valid_ncm(ncm: &str) -> bool {
    let code = ncm.strip_suffix(".0").unwrap_or(ncm);
    NCM_PATTERN.is_match(code)
}

/// NCM must be an 8-digit code.
pub struct NcmRule;

impl FiscalRule for NcmRule {
    fn id(&self) -> &'static str {
        "ncm_invalido"
    }

    fn title(&self) -> &'static str {
        "NCM inválido ou incompleto"
    }

    fn severity(&self) -> Severity {
        Severity::Media
    }

    fn conclusion(&self) -> &'static str {
        "Revise os códigos NCM abaixo; devem possuir oito dígitos e conter apenas números."
    }

    fn evaluate(&self, dataset: &Dataset, _schema: &FiscalSchema) -> RuleOutcome {
        let mut writer = DetailWriter::new(
            dataset,
            &[
                Field::Source("chave_acesso"),
                Field::Source("numero"),
                Field::Source("numero_item"),
                Field::Source("ncm"),
                Field::OptionalSource("descricao_item"),
            ],
        );
        for (row, ncm) in texts(dataset, "ncm").iter().enumerate() {
            if !is_valid_ncm(ncm) {
                writer.push(row, Vec::new());
            }
        }
        writer.finish()
    }
}

// =============================================================================
// CNPJ
// =============================================================================

pub const CNPJ_COLUMNS: &[&str] = &["cnpj_emitente", "cnpj_destinatario"];

/// Digits of a tax ID when it is present but not 14 digits long.
pub fn cnpj_digit_error(value: &str) -> Option<usize> {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    (digits > 0 && digits != 14).then_some(digits)
}

/// Issuer/recipient CNPJ must have 14 digits.
pub struct CnpjRule;

impl FiscalRule for CnpjRule {
    fn id(&self) -> &'static str {
        "cnpj_invalido"
    }

    fn title(&self) -> &'static str {
        "CNPJ emitente/destinatário inconsistente"
    }

    fn severity(&self) -> Severity {
        Severity::Media
    }

    fn conclusion(&self) -> &'static str {
        "CNPJs com quantidade de dígitos incorreta ou caracteres inválidos foram encontrados."
    }

    fn evaluate(&self, dataset: &Dataset, _schema: &FiscalSchema) -> RuleOutcome {
        let present: Vec<&str> = CNPJ_COLUMNS
            .iter()
            .copied()
            .filter(|c| dataset.has_column(c))
            .collect();
        if present.is_empty() {
            return RuleOutcome::Skipped {
                reason: "colunas de CNPJ ausentes".to_string(),
            };
        }

        let values: Vec<(&str, Vec<String>)> = present.iter().map(|c| (*c, texts(dataset, c))).collect();

        let mut writer = DetailWriter::new(
            dataset,
            &[
                Field::Source("chave_acesso"),
                Field::Source("numero"),
                Field::Computed("campo"),
                Field::Computed("valor_original"),
                Field::Computed("quantidade_digitos"),
                Field::Source("valor_total_item"),
            ],
        );
        for row in 0..dataset.row_count() {
            for (column, column_values) in &values {
                let value = &column_values[row];
                if let Some(digits) = cnpj_digit_error(value) {
                    writer.push(
                        row,
                        vec![
                            Cell::text(*column),
                            Cell::text(value.clone()),
                            Cell::from(digits as i64),
                        ],
                    );
                }
            }
        }
        writer.finish()
    }
}

// =============================================================================
// ITEM TOTAL
// =============================================================================

/// Item total must equal quantity times unit price.
pub struct ItemTotalRule;

impl FiscalRule for ItemTotalRule {
    fn id(&self) -> &'static str {
        "valor_item_divergente"
    }

    fn title(&self) -> &'static str {
        "Valor total do item difere da multiplicação"
    }

    fn severity(&self) -> Severity {
        Severity::Alta
    }

    fn conclusion(&self) -> &'static str {
        "Em alguns itens o valor total informado não corresponde à multiplicação de quantidade por valor unitário."
    }

    fn evaluate(&self, dataset: &Dataset, _schema: &FiscalSchema) -> RuleOutcome {
        let quantities = numbers(dataset, "quantidade");
        let prices = numbers(dataset, "valor_unitario");
        let totals = numbers(dataset, "valor_total_item");

        let mut writer = DetailWriter::new(
            dataset,
            &[
                Field::Source("chave_acesso"),
                Field::Source("numero"),
                Field::Source("numero_item"),
                Field::OptionalSource("descricao_item"),
                Field::Source("quantidade"),
                Field::Source("valor_unitario"),
                Field::Source("valor_total_item"),
                Field::Computed("esperado"),
                Field::Computed("diferenca"),
            ],
        );
        for row in 0..dataset.row_count() {
            let (Some(quantity), Some(price), Some(total)) = (quantities[row], prices[row], totals[row]) else {
                continue;
            };
            let expected = quantity * price;
            let difference = round_to(total - expected, 2);
            if difference.abs() > MONETARY_TOLERANCE {
                writer.push(row, vec![Cell::Number(round_to(expected, 2)), Cell::Number(difference)]);
            }
        }
        writer.finish()
    }
}

// =============================================================================
// NOTE TOTAL
// =============================================================================

/// Declared note total must equal the sum of its item totals.
pub struct NoteTotalRule;

impl FiscalRule for NoteTotalRule {
    fn id(&self) -> &'static str {
        "valor_nota_divergente"
    }

    fn title(&self) -> &'static str {
        "Valor total da nota difere da soma dos itens"
    }

    fn severity(&self) -> Severity {
        Severity::Alta
    }

    fn conclusion(&self) -> &'static str {
        "Notas fiscais com divergência entre o valor total informado e a soma dos itens foram encontradas."
    }

    fn evaluate(&self, dataset: &Dataset, schema: &FiscalSchema) -> RuleOutcome {
        let (Some(keys), Some(numbers_col)) = (dataset.column("chave_acesso"), dataset.column("numero")) else {
            return RuleOutcome::Skipped {
                reason: "colunas chave_acesso/numero ausentes".to_string(),
            };
        };
        let item_totals = numbers(dataset, "valor_total_item");
        let note_totals = numbers(dataset, &schema.note_total);

        // (key, number) -> (first row, sum of item totals), in first-seen order.
        let mut groups: IndexMap<(CellKey, CellKey), (usize, f64)> = IndexMap::new();
        for (row, (key, number)) in keys.iter().zip(numbers_col).enumerate() {
            let entry = groups.entry((key.key(), number.key())).or_insert((row, 0.0));
            if let Some(total) = item_totals[row] {
                entry.1 += total;
            }
        }

        let mut writer = DetailWriter::new(
            dataset,
            &[
                Field::Source("chave_acesso"),
                Field::Source("numero"),
                Field::Source(&schema.note_total),
                Field::Computed("soma_itens"),
                Field::Computed("diferenca"),
            ],
        );
        for (first_row, item_sum) in groups.values() {
            let Some(declared) = note_totals[*first_row] else {
                continue;
            };
            let difference = round_to(declared - item_sum, 2);
            if difference.abs() > MONETARY_TOLERANCE {
                writer.push(
                    *first_row,
                    vec![Cell::Number(round_to(*item_sum, 2)), Cell::Number(difference)],
                );
            }
        }
        writer.finish()
    }
}

// =============================================================================
// ICMS
// =============================================================================

pub const ICMS_COLUMNS: &[&str] = &["base_icms", "aliquota_icms", "valor_icms"];

/// ICMS value must equal base times rate.
pub struct IcmsRule;

impl FiscalRule for IcmsRule {
    fn id(&self) -> &'static str {
        "icms_incoerente"
    }

    fn title(&self) -> &'static str {
        "ICMS incoerente"
    }

    fn severity(&self) -> Severity {
        Severity::Media
    }

    fn conclusion(&self) -> &'static str {
        "Os itens listados apresentam divergência entre base, alíquota e valor de ICMS."
    }

    fn evaluate(&self, dataset: &Dataset, _schema: &FiscalSchema) -> RuleOutcome {
        let missing: Vec<&str> = ICMS_COLUMNS
            .iter()
            .copied()
            .filter(|c| !dataset.has_column(c))
            .collect();
        if !missing.is_empty() {
            debug!(missing = ?missing, "ICMS rule skipped");
            return RuleOutcome::Skipped {
                reason: format!("colunas ausentes: {}", missing.join(", ")),
            };
        }

        let bases = numbers(dataset, "base_icms");
        let rates = numbers(dataset, "aliquota_icms");
        let values = numbers(dataset, "valor_icms");

        let mut writer = DetailWriter::new(
            dataset,
            &[
                Field::Source("chave_acesso"),
                Field::Source("numero"),
                Field::Source("numero_item"),
                Field::OptionalSource("descricao_item"),
                Field::Source("base_icms"),
                Field::Source("aliquota_icms"),
                Field::Source("valor_icms"),
                Field::Computed("calculado"),
                Field::Computed("diferenca"),
            ],
        );
        for row in 0..dataset.row_count() {
            let (Some(base), Some(rate), Some(value)) = (bases[row], rates[row], values[row]) else {
                continue;
            };
            let computed = base * rate / 100.0;
            let difference = round_to(value - computed, 2);
            if difference.abs() > MONETARY_TOLERANCE {
                writer.push(row, vec![Cell::Number(round_to(computed, 2)), Cell::Number(difference)]);
            }
        }
        writer.finish()
    }
}

/// The default rule battery, in reporting order.
pub fn default_rules() -> Vec<Box<dyn FiscalRule>> {
    vec![
        Box::new(DuplicateItemsRule),
        Box::new(CfopDestinationRule),
        Box::new(NcmRule),
        Box::new(CnpjRule),
        Box::new(ItemTotalRule),
        Box::new(NoteTotalRule),
        Box::new(IcmsRule),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two-item table with every mandatory column and valid values.
    fn base_columns() -> Vec<(&'static str, Vec<Cell>)> {
        vec![
            ("chave_acesso", vec![Cell::text("K1"), Cell::text("K1")]),
            ("numero", vec![Cell::Number(10.0), Cell::Number(10.0)]),
            ("numero_item", vec![Cell::Number(1.0), Cell::Number(2.0)]),
            ("cfop", vec![Cell::text("5102"), Cell::text("5102")]),
            ("ncm", vec![Cell::text("01012100"), Cell::text("84713012")]),
            ("quantidade", vec![Cell::Number(2.0), Cell::Number(1.0)]),
            ("valor_unitario", vec![Cell::Number(10.0), Cell::Number(5.0)]),
            ("valor_total_item", vec![Cell::Number(20.0), Cell::Number(5.0)]),
            ("valor_total_nota", vec![Cell::Number(25.0), Cell::Number(25.0)]),
        ]
    }

    fn build(columns: Vec<(&'static str, Vec<Cell>)>) -> (Dataset, FiscalSchema) {
        let dataset = Dataset::from_columns(columns).unwrap();
        let schema = FiscalSchema::resolve(&dataset).unwrap();
        (dataset, schema)
    }

    fn replace(columns: &mut [(&'static str, Vec<Cell>)], name: &str, cells: Vec<Cell>) {
        if let Some(col) = columns.iter_mut().find(|(n, _)| *n == name) {
            col.1 = cells;
        }
    }

    fn details(outcome: RuleOutcome) -> DetailTable {
        match outcome {
            RuleOutcome::Violations { details } => details,
            other => panic!("expected violations, got {:?}", other),
        }
    }

    #[test]
    fn test_clean_table_passes_every_rule() {
        let (dataset, schema) = build(base_columns());
        for rule in default_rules() {
            let outcome = rule.evaluate(&dataset, &schema);
            assert!(
                !matches!(outcome, RuleOutcome::Violations { .. }),
                "{} flagged a clean table",
                rule.id()
            );
        }
    }

    #[test]
    fn test_item_total_tolerance_boundary() {
        let mut columns = base_columns();
        replace(&mut columns, "valor_total_item", vec![Cell::Number(21.0), Cell::Number(6.01)]);
        let (dataset, schema) = build(columns);

        let table = details(ItemTotalRule.evaluate(&dataset, &schema));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "numero_item"), Some(&Cell::Number(2.0)));
        assert_eq!(table.get(0, "esperado"), Some(&Cell::Number(5.0)));
        assert_eq!(table.get(0, "diferenca"), Some(&Cell::Number(1.01)));
    }

    #[test]
    fn test_item_total_uses_unrounded_product() {
        let single = |total: f64| {
            build(vec![
                ("chave_acesso", vec![Cell::text("K1")]),
                ("numero", vec![Cell::Number(10.0)]),
                ("numero_item", vec![Cell::Number(1.0)]),
                ("cfop", vec![Cell::text("5102")]),
                ("ncm", vec![Cell::text("01012100")]),
                ("quantidade", vec![Cell::Number(1.0)]),
                ("valor_unitario", vec![Cell::Number(0.125)]),
                ("valor_total_item", vec![Cell::Number(total)]),
                ("valor_total_nota", vec![Cell::Number(total)]),
            ])
        };

        let (dataset, schema) = single(1.135);
        let table = details(ItemTotalRule.evaluate(&dataset, &schema));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "diferenca"), Some(&Cell::Number(1.01)));

        let (dataset, schema) = single(1.125);
        assert_eq!(ItemTotalRule.evaluate(&dataset, &schema), RuleOutcome::Passed);
    }

    #[test]
    fn test_item_total_ignores_unparseable_rows() {
        let mut columns = base_columns();
        replace(&mut columns, "quantidade", vec![Cell::text("dois"), Cell::Number(1.0)]);
        replace(&mut columns, "valor_total_item", vec![Cell::Number(999.0), Cell::Number(5.0)]);
        let (dataset, schema) = build(columns);
        assert_eq!(ItemTotalRule.evaluate(&dataset, &schema), RuleOutcome::Passed);
    }

    #[test]
    fn test_cfop_mismatch() {
        assert!(!cfop_mismatch("5102", "1 - Operação interna"));
        assert!(cfop_mismatch("6108", "1"));
        assert!(!cfop_mismatch("6108", "2 - Interestadual"));
        assert!(!cfop_mismatch("5102", "9"));
        assert!(!cfop_mismatch("5102", ""));
        assert!(cfop_mismatch("", "3"));
    }

    #[test]
    fn test_cfop_rule_details() {
        let mut columns = base_columns();
        replace(&mut columns, "cfop", vec![Cell::text("5102"), Cell::text("6108")]);
        columns.push(("destino_operacao", vec![Cell::text("1"), Cell::text("1")]));
        columns.push(("razao_emitente", vec![Cell::text("ACME LTDA"), Cell::text("ACME LTDA")]));
        let (dataset, schema) = build(columns);

        let table = details(CfopDestinationRule.evaluate(&dataset, &schema));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "cfop"), Some(&Cell::text("6108")));
        assert_eq!(table.get(0, "destino_esperado"), Some(&Cell::text("5")));
        assert_eq!(table.get(0, "razao_emitente"), Some(&Cell::text("ACME LTDA")));
    }

    #[test]
    fn test_cfop_rule_skipped_without_destination() {
        let (dataset, schema) = build(base_columns());
        assert!(matches!(
            CfopDestinationRule.evaluate(&dataset, &schema),
            RuleOutcome::Skipped { .. }
        ));
    }

    #[test]
    fn test_ncm_validation() {
        assert!(is_valid_ncm("01012100"));
        assert!(is_valid_ncm("84713012.0"));
        assert!(!is_valid_ncm("8471301"));
        assert!(!is_valid_ncm("8471.30.12"));
        assert!(!is_valid_ncm("84713012x0"));
        assert!(!is_valid_ncm(""));
    }

    #[test]
    fn test_cnpj_digits() {
        assert_eq!(cnpj_digit_error("12.345.678/0001-95"), None);
        assert_eq!(cnpj_digit_error("123"), Some(3));
        assert_eq!(cnpj_digit_error(""), None);
        assert_eq!(cnpj_digit_error("isento"), None);
    }

    #[test]
    fn test_cnpj_rule_reports_each_field() {
        let mut columns = base_columns();
        columns.push(("cnpj_emitente", vec![Cell::text("123"), Cell::text("12345678000195")]));
        columns.push(("cnpj_destinatario", vec![Cell::text("9876"), Cell::Null]));
        let (dataset, schema) = build(columns);

        let table = details(CnpjRule.evaluate(&dataset, &schema));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "campo"), Some(&Cell::text("cnpj_emitente")));
        assert_eq!(table.get(1, "campo"), Some(&Cell::text("cnpj_destinatario")));
        assert_eq!(table.get(1, "quantidade_digitos"), Some(&Cell::Number(4.0)));
    }

    #[test]
    fn test_duplicate_items_skip_null_keys() {
        let mut columns = base_columns();
        replace(&mut columns, "numero_item", vec![Cell::Null, Cell::Null]);
        let (dataset, schema) = build(columns);
        assert_eq!(DuplicateItemsRule.evaluate(&dataset, &schema), RuleOutcome::Passed);

        let mut columns = base_columns();
        replace(&mut columns, "numero_item", vec![Cell::Number(1.0), Cell::Number(1.0)]);
        let (dataset, schema) = build(columns);
        assert_eq!(details(DuplicateItemsRule.evaluate(&dataset, &schema)).len(), 2);
    }

    #[test]
    fn test_note_total_divergence() {
        let mut columns = base_columns();
        replace(&mut columns, "valor_total_nota", vec![Cell::Number(30.0), Cell::Number(30.0)]);
        let (dataset, schema) = build(columns);

        let table = details(NoteTotalRule.evaluate(&dataset, &schema));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "soma_itens"), Some(&Cell::Number(25.0)));
        assert_eq!(table.get(0, "diferenca"), Some(&Cell::Number(5.0)));
    }

    #[test]
    fn test_icms_rule() {
        let mut columns = base_columns();
        columns.push(("base_icms", vec![Cell::Number(100.0), Cell::Number(100.0)]));
        columns.push(("aliquota_icms", vec![Cell::Number(18.0), Cell::Number(18.0)]));
        columns.push(("valor_icms", vec![Cell::Number(18.0), Cell::Number(12.0)]));
        let (dataset, schema) = build(columns);

        let table = details(IcmsRule.evaluate(&dataset, &schema));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "calculado"), Some(&Cell::Number(18.0)));
        assert_eq!(table.get(0, "diferenca"), Some(&Cell::Number(-6.0)));
    }

    #[test]
    fn test_icms_uses_unrounded_value() {
        let mut columns = base_columns();
        columns.push(("base_icms", vec![Cell::Number(1.0), Cell::Number(100.0)]));
        columns.push(("aliquota_icms", vec![Cell::Number(12.5), Cell::Number(18.0)]));
        columns.push(("valor_icms", vec![Cell::Number(1.135), Cell::Number(18.0)]));
        let (dataset, schema) = build(columns);

        let table = details(IcmsRule.evaluate(&dataset, &schema));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "diferenca"), Some(&Cell::Number(1.01)));
    }

    #[test]
    fn test_icms_skipped_without_columns() {
        let (dataset, schema) = build(base_columns());
        assert!(matches!(IcmsRule.evaluate(&dataset, &schema), RuleOutcome::Skipped { .. }));
    }
}
