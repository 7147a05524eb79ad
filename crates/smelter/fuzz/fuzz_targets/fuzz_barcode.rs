//! Fuzz target for barcode normalization.
//!
//! Normalization must never panic, and its output is always empty or a
//! 13-digit code that normalizes to itself.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use smelter::checksum::{EAN13_LEN, normalize_barcode};

#[derive(Debug, Arbitrary)]
enum Cell<'a> {
    Text(&'a str),
    Integer(i64),
    Real(f64),
}

fuzz_target!(|cell: Cell<'_>| {
    let out = match cell {
        Cell::Text(s) => normalize_barcode(s),
        Cell::Integer(i) => normalize_barcode(i),
        Cell::Real(f) => normalize_barcode(f),
    };

    assert!(out.is_empty() || out.len() == EAN13_LEN);
    assert_eq!(normalize_barcode(out.as_str()), out);
});
