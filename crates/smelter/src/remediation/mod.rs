//! In-place remediation of diagnosed issues.

mod engine;
mod operations;

pub use engine::{BARCODE_FUNCTION, RemediationEngine};
pub use operations::{Remediation, RemediationResult};
