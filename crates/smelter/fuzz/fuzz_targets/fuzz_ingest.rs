//! Fuzz target for delimited file ingestion.
//!
//! Loading arbitrary bytes must either fail with an error or produce a
//! table whose columns are the normalized headers.

#![no_main]

use std::io::Write;

use libfuzzer_sys::fuzz_target;
use smelter::store::{Dataset, LoadOptions};

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let Ok(dir) = tempfile::TempDir::new() else {
        return;
    };
    let source = dir.path().join("upload.csv");
    let Ok(mut file) = std::fs::File::create(&source) else {
        return;
    };
    if file.write_all(data).is_err() {
        return;
    }
    drop(file);

    let dataset = Dataset::open(dir.path().join("fuzz.sqlite"));
    if let Ok(summary) = dataset.load(&source, &LoadOptions::default()) {
        let columns = dataset.columns().unwrap_or_default();
        assert_eq!(columns, summary.columns);
        let _ = dataset.preview(1, 50);
    }
});
