//! Fuzz target for the delimited text parser.
//!
//! Loading arbitrary bytes must return a dataset or an error, never panic.
//! Normalization runs on whatever comes out.

#![no_main]

use fiscalscope::Parser;
use libfuzzer_sys::fuzz_target;
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    if let Ok(mut temp_file) = tempfile::NamedTempFile::with_suffix(".csv") {
        if temp_file.write_all(data).is_ok() {
            let _ = Parser::new().parse_file(temp_file.path());
        }
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = Parser::new().parse_str(text);
    }
});
