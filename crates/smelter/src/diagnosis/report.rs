//! Diagnostic findings and the combined report.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::rules::RuleFamily;

/// Result of one diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Finding {
    /// Columns containing at least one offending cell.
    Columns(BTreeSet<String>),
    /// Number of offending rows.
    Rows(usize),
}

impl Finding {
    /// Issue count contributed to a report total.
    pub fn issue_count(&self) -> usize {
        match self {
            Finding::Columns(columns) => columns.len(),
            Finding::Rows(rows) => *rows,
        }
    }

    pub fn into_columns(self) -> BTreeSet<String> {
        match self {
            Finding::Columns(columns) => columns,
            Finding::Rows(_) => BTreeSet::new(),
        }
    }

    pub fn into_rows(self) -> usize {
        match self {
            Finding::Columns(_) => 0,
            Finding::Rows(rows) => rows,
        }
    }
}

/// Findings of a full diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub uppercase_issues: BTreeSet<String>,
    pub null_string_issues: BTreeSet<String>,
    pub null_numeric_issues: BTreeSet<String>,
    pub brand_issues: usize,
    pub ncm_issues: usize,
    pub barcode_issues: usize,
    pub weight_issues: usize,
    pub dimension_issues: usize,
    pub search_ref_issues: usize,
    pub manufacturer_ref_issues: usize,
}

impl DiagnosticReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the finding of one diagnostic.
    pub fn record(&mut self, family: RuleFamily, finding: Finding) {
        match family {
            RuleFamily::Uppercase => self.uppercase_issues = finding.into_columns(),
            RuleFamily::NullString => self.null_string_issues = finding.into_columns(),
            RuleFamily::NullNumeric => self.null_numeric_issues = finding.into_columns(),
            RuleFamily::Brand => self.brand_issues = finding.into_rows(),
            RuleFamily::Ncm => self.ncm_issues = finding.into_rows(),
            RuleFamily::Barcode => self.barcode_issues = finding.into_rows(),
            RuleFamily::Weight => self.weight_issues = finding.into_rows(),
            RuleFamily::Dimension => self.dimension_issues = finding.into_rows(),
            RuleFamily::SearchRef => self.search_ref_issues = finding.into_rows(),
            RuleFamily::ManufacturerRef => self.manufacturer_ref_issues = finding.into_rows(),
        }
    }

    pub fn finding(&self, family: RuleFamily) -> Finding {
        match family {
            RuleFamily::Uppercase => Finding::Columns(self.uppercase_issues.clone()),
            RuleFamily::NullString => Finding::Columns(self.null_string_issues.clone()),
            RuleFamily::NullNumeric => Finding::Columns(self.null_numeric_issues.clone()),
            RuleFamily::Brand => Finding::Rows(self.brand_issues),
            RuleFamily::Ncm => Finding::Rows(self.ncm_issues),
            RuleFamily::Barcode => Finding::Rows(self.barcode_issues),
            RuleFamily::Weight => Finding::Rows(self.weight_issues),
            RuleFamily::Dimension => Finding::Rows(self.dimension_issues),
            RuleFamily::SearchRef => Finding::Rows(self.search_ref_issues),
            RuleFamily::ManufacturerRef => Finding::Rows(self.manufacturer_ref_issues),
        }
    }

    /// Offending columns plus offending rows across every family.
    pub fn total_issues(&self) -> usize {
        RuleFamily::ALL
            .iter()
            .map(|family| self.finding(*family).issue_count())
            .sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_issues() == 0
    }

    /// Families with at least one issue.
    pub fn affected_families(&self) -> Vec<RuleFamily> {
        RuleFamily::ALL
            .into_iter()
            .filter(|family| self.finding(*family).issue_count() > 0)
            .collect()
    }
}
