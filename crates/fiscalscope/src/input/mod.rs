//! Input loading and the in-memory dataset.

mod cell;
mod dataset;
mod normalize;
mod parser;
mod source;

pub use cell::{format_general, format_number, Cell, CellKey};
pub(crate) use cell::parse_finite;
pub use dataset::{Dataset, SIGNATURE_SAMPLE_ROWS};
pub use normalize::{canonical_name, normalize_dataset, normalize_label, CODE_COLUMNS, NUMERIC_COLUMNS};
pub use parser::{Parser, ParserConfig};
pub use source::SourceMetadata;

pub(crate) use dataset::is_code_like;
