//! Applies remediation operations to a dataset.

use tracing::{debug, info, warn};

use crate::checksum::normalize_barcode_text;
use crate::diagnosis::rules;
use crate::error::Result;
use crate::store::{
    AccessMode, ColumnKind, Dataset, Expr, Ident, Promotion, Session, TextFunction,
};

use super::operations::{Remediation, RemediationResult};

/// SQL name the barcode normalizer is registered under.
pub const BARCODE_FUNCTION: &str = "normalize_barcode";

/// Engine for in-place fixes.
///
/// Each call runs in one write transaction: it either completes or leaves
/// the dataset as it was. Every fix is idempotent, so a second run reports
/// zero affected rows.
pub struct RemediationEngine {
    barcode_normalizer: TextFunction,
}

impl RemediationEngine {
    pub fn new() -> Self {
        Self {
            barcode_normalizer: TextFunction::new(BARCODE_FUNCTION, normalize_barcode_text),
        }
    }

    /// Replace the barcode normalizer.
    pub fn with_barcode_normalizer<F>(mut self, normalizer: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.barcode_normalizer = TextFunction::new(BARCODE_FUNCTION, normalizer);
        self
    }

    /// Apply `remediation` to its default columns.
    pub fn apply(&self, dataset: &Dataset, remediation: Remediation) -> Result<RemediationResult> {
        self.apply_to(dataset, remediation, remediation.default_columns())
    }

    /// Apply `remediation` to those of `columns` present in the dataset.
    pub fn apply_to<I, S>(
        &self,
        dataset: &Dataset,
        remediation: Remediation,
        columns: I,
    ) -> Result<RemediationResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let candidates: Vec<String> = columns
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect();

        let mut session = dataset.session(AccessMode::ReadWrite)?;
        session.require_table()?;
        if remediation == Remediation::Barcode {
            session.register_function(&self.barcode_normalizer)?;
        }

        let result = session.atomically(|s| match remediation {
            Remediation::NullStrings => fill_null_strings(s, &candidates),
            Remediation::Uppercase => uppercase(s, &candidates),
            Remediation::NullNumerics => fill_null_numerics(s, &candidates),
            Remediation::Barcode => rewrite(s, &candidates, |c| {
                Expr::call(BARCODE_FUNCTION, [Expr::column(c)])
            }),
            Remediation::Ncm => rewrite(s, &candidates, |c| {
                Expr::call(
                    "regexp_replace",
                    [Expr::column(c), Expr::text("[^0-9]"), Expr::text("")],
                )
            }),
            Remediation::Codes => rewrite(s, &candidates, |c| {
                let upper = Expr::call("unicode_upper", [Expr::column(c)]);
                Expr::call(
                    "regexp_replace",
                    [Expr::call("trim", [upper]), Expr::text("[^A-Z0-9]"), Expr::text("")],
                )
            }),
            Remediation::NegativeWeights => absolute_weights(s, &candidates),
        })?;

        info!(
            remediation = %remediation,
            columns = result.columns_affected.len(),
            rows = result.rows_affected,
            "remediation applied"
        );
        Ok(result)
    }

    pub fn fix_null_strings<I, S>(&self, dataset: &Dataset, candidates: I) -> Result<RemediationResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.apply_to(dataset, Remediation::NullStrings, candidates)
    }

    pub fn fix_uppercase<I, S>(&self, dataset: &Dataset, candidates: I) -> Result<RemediationResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.apply_to(dataset, Remediation::Uppercase, candidates)
    }

    pub fn fix_null_numerics<I, S>(&self, dataset: &Dataset, candidates: I) -> Result<RemediationResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.apply_to(dataset, Remediation::NullNumerics, candidates)
    }

    pub fn fix_barcode(&self, dataset: &Dataset) -> Result<RemediationResult> {
        self.apply(dataset, Remediation::Barcode)
    }

    pub fn fix_ncm(&self, dataset: &Dataset) -> Result<RemediationResult> {
        self.apply(dataset, Remediation::Ncm)
    }

    pub fn fix_codes(&self, dataset: &Dataset) -> Result<RemediationResult> {
        self.apply(dataset, Remediation::Codes)
    }

    pub fn fix_negative_weights(&self, dataset: &Dataset) -> Result<RemediationResult> {
        self.apply(dataset, Remediation::NegativeWeights)
    }
}

impl Default for RemediationEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn fill_null_strings(session: &mut Session, candidates: &[String]) -> Result<RemediationResult> {
    let mut result = RemediationResult::new();
    for column in session.present_columns(candidates)? {
        let filter = rules::null_or_nan(&column);
        let rows = session.count(&filter)?;
        session.update(&column, &Expr::text(""), &filter)?;
        result.record(column.name(), rows);
    }
    Ok(result)
}

fn uppercase(session: &mut Session, candidates: &[String]) -> Result<RemediationResult> {
    let mut result = RemediationResult::new();
    for column in session.present_columns(candidates)? {
        let filter = rules::not_uppercase(&column);
        let rows = session.count(&filter)?;
        session.update(
            &column,
            &Expr::call("unicode_upper", [Expr::column(&column)]),
            &filter,
        )?;
        result.record(column.name(), rows);
    }
    Ok(result)
}

fn fill_null_numerics(session: &mut Session, candidates: &[String]) -> Result<RemediationResult> {
    let mut result = RemediationResult::new();
    for column in session.present_columns(candidates)? {
        let rows = session.count(&rules::null_like(&column))?;

        match session.column_kind(&column)? {
            ColumnKind::Numeric => {
                session.update(&column, &Expr::integer(0), &rules::null_like(&column))?;
            }
            ColumnKind::Text => match session.promote_to_real(&column)? {
                Promotion::Promoted(numeric) => {
                    let ident = numeric.ident();
                    session.update(ident, &Expr::integer(0), &Expr::column(ident).is_null())?;
                }
                Promotion::Unchanged(text) => {
                    // Keep the column textual and fill with the text "0".
                    let ident = text.ident();
                    session.update(ident, &Expr::text("0"), &rules::null_like(ident))?;
                }
            },
        }

        result.record(column.name(), rows);
    }
    Ok(result)
}

/// Replace non-blank cells that differ from `fixed(column)`.
fn rewrite(
    session: &mut Session,
    candidates: &[String],
    fixed: impl Fn(&Ident) -> Expr,
) -> Result<RemediationResult> {
    let mut result = RemediationResult::new();
    for column in session.present_columns(candidates)? {
        let value = fixed(&column);
        let filter = rules::not_blank(&column).and(Expr::column(&column).differs_from(value.clone()));
        let rows = session.count(&filter)?;
        session.update(&column, &value, &filter)?;
        debug!(column = column.name(), rows, "column rewritten");
        result.record(column.name(), rows);
    }
    Ok(result)
}

fn absolute_weights(session: &mut Session, candidates: &[String]) -> Result<RemediationResult> {
    let mut result = RemediationResult::new();
    for column in session.present_columns(candidates)? {
        let numeric = match session.column_kind(&column)? {
            ColumnKind::Numeric => column,
            ColumnKind::Text => match session.promote_to_real(&column)? {
                Promotion::Promoted(numeric) => numeric.ident().clone(),
                Promotion::Unchanged(text) => {
                    warn!(column = text.ident().name(), "non-numeric weights, column skipped");
                    continue;
                }
            },
        };

        let value = Expr::call("try_real", [Expr::column(&numeric)]);
        let filter = value.clone().less_than(Expr::integer(0));
        let rows = session.count(&filter)?;
        session.update(&numeric, &Expr::call("abs", [value]), &filter)?;
        result.record(numeric.name(), rows);
    }
    Ok(result)
}
