//! Text rendering for findings and analyses.

mod audit;
mod markdown;

pub use audit::{audit_report, issue_table, offender_table, priority_label};
pub use markdown::{format_brl, MarkdownTable};
