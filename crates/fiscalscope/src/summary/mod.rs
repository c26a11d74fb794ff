//! Aggregation of rule findings and fiscal dataset summaries.

mod fiscal;
mod issues;

pub use fiscal::{extreme_note, fiscal_overview, Extreme, ExtremeNote, FiscalOverview, GroupTotal, MonthlyTotal, TOP_GROUPS};
pub use issues::{offenders_by, prioritize, summarize_issues, IssueSummary, OffenderRow};
