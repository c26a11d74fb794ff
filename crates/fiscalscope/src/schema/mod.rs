//! Column roles, date parsing and per-column statistics.

mod classifier;
mod column;
mod dates;
mod types;

pub use classifier::{
    ColumnClassification, ColumnClassifier, CATEGORICAL_MAX_DISTINCT, CATEGORICAL_MIN_DISTINCT,
    TEMPORAL_MIN_PARSED_ROWS, TEMPORAL_MIN_SUCCESS_RATE,
};
pub(crate) use classifier::cardinality;
pub use column::{value_counts, ColumnDescription, NumericSummary, ValueCount};
pub use dates::{day_ordinal, parse_datetime};
pub use types::ColumnRole;
