//! Runs diagnostics against a dataset.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::error::Result;
use crate::store::{AccessMode, Dataset, Session};

use super::checks::{
    BarcodeCheck, BrandCheck, Diagnostic, DimensionCheck, ManufacturerRefCheck, NcmCheck,
    NullNumericCheck, NullStringCheck, SearchRefCheck, UppercaseCheck, WeightCheck,
};
use super::report::{DiagnosticReport, Finding};
use super::rules::RuleFamily;

/// Read-only diagnosis of catalog data quality.
pub struct DiagnosticEngine {
    diagnostics: Vec<Box<dyn Diagnostic>>,
}

impl DiagnosticEngine {
    /// Create an engine with every catalog diagnostic.
    pub fn new() -> Self {
        Self {
            diagnostics: vec![
                Box::new(UppercaseCheck::default()),
                Box::new(NullStringCheck::default()),
                Box::new(NullNumericCheck::default()),
                Box::new(BrandCheck),
                Box::new(NcmCheck),
                Box::new(BarcodeCheck),
                Box::new(WeightCheck),
                Box::new(DimensionCheck),
                Box::new(SearchRefCheck),
                Box::new(ManufacturerRefCheck),
            ],
        }
    }

    /// Create an engine running only `diagnostics`.
    pub fn with_diagnostics(diagnostics: Vec<Box<dyn Diagnostic>>) -> Self {
        Self { diagnostics }
    }

    /// Run every configured diagnostic in one read-only session.
    pub fn diagnose(&self, dataset: &Dataset) -> Result<DiagnosticReport> {
        let session = dataset.session(AccessMode::ReadOnly)?;
        session.require_table()?;

        let mut report = DiagnosticReport::new();
        for diagnostic in &self.diagnostics {
            let finding = diagnostic.evaluate(&session)?;
            debug!(family = %diagnostic.family(), issues = finding.issue_count(), "diagnostic evaluated");
            report.record(diagnostic.family(), finding);
        }

        info!(
            total_issues = report.total_issues(),
            families = report.affected_families().len(),
            "diagnosis complete"
        );
        Ok(report)
    }

    /// Uppercase violations among `candidates`.
    pub fn uppercase_issues<I, S>(&self, dataset: &Dataset, candidates: I) -> Result<BTreeSet<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let check = UppercaseCheck::new(candidates.into_iter().map(Into::into).collect());
        Ok(run_one(dataset, &check)?.into_columns())
    }

    /// Null-like text cells among `candidates`.
    pub fn null_string_issues<I, S>(&self, dataset: &Dataset, candidates: I) -> Result<BTreeSet<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let check = NullStringCheck::new(candidates.into_iter().map(Into::into).collect());
        Ok(run_one(dataset, &check)?.into_columns())
    }

    /// Null-like numeric cells among `candidates`.
    pub fn null_numeric_issues<I, S>(&self, dataset: &Dataset, candidates: I) -> Result<BTreeSet<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let check = NullNumericCheck::new(candidates.into_iter().map(Into::into).collect());
        Ok(run_one(dataset, &check)?.into_columns())
    }

    pub fn brand_issues(&self, dataset: &Dataset) -> Result<usize> {
        Ok(run_one(dataset, &BrandCheck)?.into_rows())
    }

    pub fn ncm_issues(&self, dataset: &Dataset) -> Result<usize> {
        Ok(run_one(dataset, &NcmCheck)?.into_rows())
    }

    pub fn barcode_issues(&self, dataset: &Dataset) -> Result<usize> {
        Ok(run_one(dataset, &BarcodeCheck)?.into_rows())
    }

    pub fn weight_issues(&self, dataset: &Dataset) -> Result<usize> {
        Ok(run_one(dataset, &WeightCheck)?.into_rows())
    }

    pub fn dimension_issues(&self, dataset: &Dataset) -> Result<usize> {
        Ok(run_one(dataset, &DimensionCheck)?.into_rows())
    }

    pub fn search_ref_issues(&self, dataset: &Dataset) -> Result<usize> {
        Ok(run_one(dataset, &SearchRefCheck)?.into_rows())
    }

    pub fn manufacturer_ref_issues(&self, dataset: &Dataset) -> Result<usize> {
        Ok(run_one(dataset, &ManufacturerRefCheck)?.into_rows())
    }

    /// Run the catalog diagnostic for a single family.
    pub fn evaluate(&self, dataset: &Dataset, family: RuleFamily) -> Result<Finding> {
        let check: Box<dyn Diagnostic> = match family {
            RuleFamily::Uppercase => Box::new(UppercaseCheck::default()),
            RuleFamily::NullString => Box::new(NullStringCheck::default()),
            RuleFamily::NullNumeric => Box::new(NullNumericCheck::default()),
            RuleFamily::Brand => Box::new(BrandCheck),
            RuleFamily::Ncm => Box::new(NcmCheck),
            RuleFamily::Barcode => Box::new(BarcodeCheck),
            RuleFamily::Weight => Box::new(WeightCheck),
            RuleFamily::Dimension => Box::new(DimensionCheck),
            RuleFamily::SearchRef => Box::new(SearchRefCheck),
            RuleFamily::ManufacturerRef => Box::new(ManufacturerRefCheck),
        };
        run_one(dataset, check.as_ref())
    }
}

impl Default for DiagnosticEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn run_one(dataset: &Dataset, diagnostic: &dyn Diagnostic) -> Result<Finding> {
    let session: Session = dataset.session(AccessMode::ReadOnly)?;
    session.require_table()?;
    diagnostic.evaluate(&session)
}
