//! Correction guidance for fiscal findings and outlier treatment hints.
//!
//! Guidance is static and rule-keyed; nothing here inspects the data again.

mod generator;
mod suggestion;

pub use generator::{SuggestionEngine, DEFAULT_CORRECTION, OUTLIER_TREATMENTS};
pub use suggestion::{Suggestion, SuggestionAction};
