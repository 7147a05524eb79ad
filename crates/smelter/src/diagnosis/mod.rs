//! Read-only data quality diagnosis.
//!
//! Each diagnostic either names the columns that contain offending cells
//! (casing and null-like checks) or counts offending rows (format and range
//! checks). Diagnostics never modify the dataset, and columns absent from
//! the table are silently skipped.

mod checks;
mod engine;
mod report;
pub mod rules;

pub use checks::{
    BarcodeCheck, BrandCheck, Diagnostic, DimensionCheck, ManufacturerRefCheck, NcmCheck,
    NullNumericCheck, NullStringCheck, SearchRefCheck, UppercaseCheck, WeightCheck,
};
pub use engine::DiagnosticEngine;
pub use report::{DiagnosticReport, Finding};
pub use rules::RuleFamily;
