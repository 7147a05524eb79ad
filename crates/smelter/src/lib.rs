//! Smelter: data quality diagnosis and remediation for tabular product catalogs.
//!
//! Smelter loads an uploaded delimited file into a per-project store, checks
//! its columns against a contract, reports quality issues field by field,
//! fixes them in place and resolves duplicate records.
//!
//! # Core Principles
//!
//! - **Diagnose first**: diagnostics are read-only and run against a
//!   read-only connection
//! - **Idempotent fixes**: running a remediation twice reports zero affected
//!   rows the second time
//! - **First occurrence wins**: duplicate removal keeps the earliest row
//!
//! # Example
//!
//! ```no_run
//! use smelter::{ProjectId, Remediation, Smelter};
//!
//! let smelter = Smelter::new();
//! let project = ProjectId::new("catalog").unwrap();
//! smelter.ingest(&project, "upload.csv").unwrap();
//!
//! let report = smelter.diagnose(&project).unwrap();
//! println!("Issues: {}", report.total_issues());
//!
//! let fixed = smelter.remediate(&project, Remediation::Barcode).unwrap();
//! println!("Barcodes fixed: {}", fixed.rows_affected);
//! ```

pub mod checksum;
pub mod contract;
pub mod diagnosis;
pub mod duplicates;
pub mod error;
pub mod project;
pub mod remediation;
pub mod store;

mod smelter;

pub use crate::smelter::{Smelter, SmelterConfig};
pub use checksum::{compute_check_digit, normalize_barcode};
pub use contract::{ColumnAnalysis, ColumnContract};
pub use diagnosis::{DiagnosticEngine, DiagnosticReport, Finding, RuleFamily};
pub use duplicates::{DuplicateAnalysis, DuplicateGroup, DuplicateResolver};
pub use error::{Result, SmelterError};
pub use project::ProjectId;
pub use remediation::{Remediation, RemediationEngine, RemediationResult};
pub use store::{Dataset, LoadOptions, LoadSummary, Preview, QueryOutcome, QueryStatus};
