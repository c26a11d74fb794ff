//! FiscalScope: exploratory analysis and NF-e auditing for tabular datasets.
//!
//! FiscalScope loads CSV/TSV/JSON exports, resolves the many column labels
//! used by ERP and portal downloads into one canonical fiscal schema, and
//! then runs two kinds of work over the table:
//!
//! - **Exploration**: column roles, descriptive statistics, outliers,
//!   clusters, temporal trends, frequencies and relationships.
//! - **Auditing**: a fixed catalogue of fiscal rules (duplicated items,
//!   CFOP vs. destination, NCM, CNPJ, item and note totals, ICMS) with
//!   summaries, offender rankings, correction suggestions and a text report.
//!
//! Both are also exposed as named tools that take free text and return
//! Portuguese text, for use by a conversational agent.
//!
//! # Example
//!
//! ```no_run
//! use fiscalscope::FiscalScope;
//!
//! let scope = FiscalScope::new();
//! let (dataset, _source) = scope.load("itens.csv").unwrap();
//! let report = scope.validate(&dataset).unwrap();
//!
//! for issue in &report.issues {
//!     println!("{} ({}): {}", issue.title, issue.severity, issue.occurrences);
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod input;
pub mod report;
pub mod schema;
pub mod suggestion;
pub mod summary;
pub mod tools;
pub mod validation;

mod scope;

pub use crate::scope::{ExplorationResult, FiscalScope, ValidationReport, ValidationSummary};
pub use analysis::{AdvancedAnalysis, OverviewReport, StatisticalAnalyzer};
pub use config::{ReportLimits, ScopeConfig};
pub use error::{Result, ScopeError};
pub use input::{Cell, Dataset, Parser, SourceMetadata};
pub use schema::{ColumnClassifier, ColumnRole};
pub use suggestion::{Suggestion, SuggestionEngine};
pub use tools::{Domain, Tool, ToolRegistry, ToolSession};
pub use validation::{FiscalRule, FiscalRuleEngine, RuleOutcome, Severity, ValidationResult};
