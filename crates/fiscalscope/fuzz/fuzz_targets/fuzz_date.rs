//! Fuzz target for date parsing and column classification.
//!
//! The date shape regex and the temporal classifier must not panic on
//! pathological strings.

#![no_main]

use fiscalscope::schema::parse_datetime;
use fiscalscope::{Cell, ColumnClassifier, Dataset};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    if let Ok(content) = std::str::from_utf8(data) {
        let _ = parse_datetime(content);

        let cells: Vec<Cell> = content.lines().map(Cell::text).collect();
        if cells.is_empty() {
            return;
        }
        if let Ok(dataset) = Dataset::from_columns(vec![("data", cells)]) {
            let _ = ColumnClassifier::new().classify(&dataset);
        }
    }
});
