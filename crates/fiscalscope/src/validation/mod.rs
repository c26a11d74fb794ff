//! Fiscal consistency rules for NF-e item tables.

mod engine;
mod result;
mod rules;
mod schema;

pub use engine::{run_core_validations, FiscalRuleEngine};
pub use result::{DetailTable, RuleEvaluation, RuleOutcome, Severity, ValidationResult};
pub use rules::{
    cfop_mismatch, cnpj_digit_error, default_rules, expected_cfop_prefix, is_valid_ncm,
    CfopDestinationRule, CnpjRule, DuplicateItemsRule, FiscalRule, IcmsRule, ItemTotalRule,
    NcmRule, NoteTotalRule, CFOP_PREFIX_RULES, CNPJ_COLUMNS, ICMS_COLUMNS, MONETARY_TOLERANCE,
};
pub use schema::{FiscalSchema, MANDATORY_COLUMNS, NOTE_TOTAL_SYNONYMS, PARTY_COLUMNS};
