//! Individual diagnostics, each evaluated against an open session.

use std::collections::BTreeSet;

use crate::contract::{
    BRAND_COLUMNS, BARCODE_COLUMNS, DIMENSION_COLUMNS, GROSS_WEIGHT, MANUFACTURER_REF,
    NCM_COLUMNS, NET_WEIGHT, NUMERIC_CHECK_COLUMNS, SEARCH_REF, STRING_CHECK_COLUMNS, column_set,
};
use crate::error::Result;
use crate::store::{Expr, Ident, Session};

use super::report::Finding;
use super::rules::{self, RuleFamily};

/// Trait for diagnostics.
pub trait Diagnostic {
    fn family(&self) -> RuleFamily;

    /// Evaluate against the session's table. Absent columns are skipped.
    fn evaluate(&self, session: &Session) -> Result<Finding>;
}

/// Names of candidate columns for which `predicate` holds on some row.
fn offending_columns(
    session: &Session,
    candidates: &BTreeSet<String>,
    predicate: fn(&Ident) -> Expr,
) -> Result<BTreeSet<String>> {
    let mut offending = BTreeSet::new();
    for column in session.present_columns(candidates)? {
        if session.count(&predicate(&column))? > 0 {
            offending.insert(column.name().to_string());
        }
    }
    Ok(offending)
}

/// Rows on which `predicate` holds for any present column.
fn offending_rows(
    session: &Session,
    candidates: &[&str],
    predicate: fn(&Ident) -> Expr,
) -> Result<usize> {
    let present = session.present_columns(candidates)?;
    if present.is_empty() {
        return Ok(0);
    }
    session.count(&Expr::any(present.iter().map(predicate)))
}

/// Text columns with a non-empty value that is not upper case.
pub struct UppercaseCheck {
    candidates: BTreeSet<String>,
}

impl UppercaseCheck {
    pub fn new(candidates: BTreeSet<String>) -> Self {
        Self { candidates }
    }
}

impl Default for UppercaseCheck {
    fn default() -> Self {
        Self::new(column_set(STRING_CHECK_COLUMNS))
    }
}

impl Diagnostic for UppercaseCheck {
    fn family(&self) -> RuleFamily {
        RuleFamily::Uppercase
    }

    fn evaluate(&self, session: &Session) -> Result<Finding> {
        offending_columns(session, &self.candidates, rules::not_uppercase).map(Finding::Columns)
    }
}

/// Text columns holding NULL, empty or `nan` cells.
pub struct NullStringCheck {
    candidates: BTreeSet<String>,
}

impl NullStringCheck {
    pub fn new(candidates: BTreeSet<String>) -> Self {
        Self { candidates }
    }
}

impl Default for NullStringCheck {
    fn default() -> Self {
        Self::new(column_set(STRING_CHECK_COLUMNS))
    }
}

impl Diagnostic for NullStringCheck {
    fn family(&self) -> RuleFamily {
        RuleFamily::NullString
    }

    fn evaluate(&self, session: &Session) -> Result<Finding> {
        offending_columns(session, &self.candidates, rules::null_like).map(Finding::Columns)
    }
}

/// Numeric columns holding NULL, empty or `nan` cells.
pub struct NullNumericCheck {
    candidates: BTreeSet<String>,
}

impl NullNumericCheck {
    pub fn new(candidates: BTreeSet<String>) -> Self {
        Self { candidates }
    }
}

impl Default for NullNumericCheck {
    fn default() -> Self {
        Self::new(column_set(NUMERIC_CHECK_COLUMNS))
    }
}

impl Diagnostic for NullNumericCheck {
    fn family(&self) -> RuleFamily {
        RuleFamily::NullNumeric
    }

    fn evaluate(&self, session: &Session) -> Result<Finding> {
        offending_columns(session, &self.candidates, rules::null_like).map(Finding::Columns)
    }
}

pub struct BrandCheck;

impl Diagnostic for BrandCheck {
    fn family(&self) -> RuleFamily {
        RuleFamily::Brand
    }

    fn evaluate(&self, session: &Session) -> Result<Finding> {
        offending_rows(session, BRAND_COLUMNS, rules::brand_violation).map(Finding::Rows)
    }
}

pub struct NcmCheck;

impl Diagnostic for NcmCheck {
    fn family(&self) -> RuleFamily {
        RuleFamily::Ncm
    }

    fn evaluate(&self, session: &Session) -> Result<Finding> {
        offending_rows(session, NCM_COLUMNS, rules::ncm_violation).map(Finding::Rows)
    }
}

pub struct BarcodeCheck;

impl Diagnostic for BarcodeCheck {
    fn family(&self) -> RuleFamily {
        RuleFamily::Barcode
    }

    fn evaluate(&self, session: &Session) -> Result<Finding> {
        offending_rows(session, BARCODE_COLUMNS, rules::barcode_violation).map(Finding::Rows)
    }
}

/// Requires both weight columns; reports zero otherwise.
pub struct WeightCheck;

impl Diagnostic for WeightCheck {
    fn family(&self) -> RuleFamily {
        RuleFamily::Weight
    }

    fn evaluate(&self, session: &Session) -> Result<Finding> {
        let present = session.present_columns([GROSS_WEIGHT, NET_WEIGHT])?;
        let gross = present.iter().find(|c| c.name() == GROSS_WEIGHT);
        let net = present.iter().find(|c| c.name() == NET_WEIGHT);

        match (gross, net) {
            (Some(gross), Some(net)) => session
                .count(&rules::weight_violation(gross, net))
                .map(Finding::Rows),
            _ => Ok(Finding::Rows(0)),
        }
    }
}

pub struct DimensionCheck;

impl Diagnostic for DimensionCheck {
    fn family(&self) -> RuleFamily {
        RuleFamily::Dimension
    }

    fn evaluate(&self, session: &Session) -> Result<Finding> {
        let present = session.present_columns(DIMENSION_COLUMNS)?;
        if present.is_empty() {
            return Ok(Finding::Rows(0));
        }
        session
            .count(&rules::dimension_violation(&present))
            .map(Finding::Rows)
    }
}

pub struct SearchRefCheck;

impl Diagnostic for SearchRefCheck {
    fn family(&self) -> RuleFamily {
        RuleFamily::SearchRef
    }

    fn evaluate(&self, session: &Session) -> Result<Finding> {
        offending_rows(session, &[SEARCH_REF], rules::search_ref_violation).map(Finding::Rows)
    }
}

pub struct ManufacturerRefCheck;

impl Diagnostic for ManufacturerRefCheck {
    fn family(&self) -> RuleFamily {
        RuleFamily::ManufacturerRef
    }

    fn evaluate(&self, session: &Session) -> Result<Finding> {
        offending_rows(session, &[MANUFACTURER_REF], rules::manufacturer_ref_violation)
            .map(Finding::Rows)
    }
}
