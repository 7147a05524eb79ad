//! Violation predicates for each diagnostic family.
//!
//! Every function returns a SQL condition that holds for an offending row.
//! Numeric comparisons go through `try_real`, so a cell that does not parse
//! as a number never satisfies them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::{Expr, Ident};

/// Accepted brand characters.
pub const BRAND_PATTERN: &str = "^[A-Za-z0-9 .-]+$";
/// Accepted search reference characters.
pub const SEARCH_REF_PATTERN: &str = "^[A-Za-z0-9]+$";
/// Characters a manufacturer reference may not contain.
pub const MANUFACTURER_REF_FORBIDDEN: &str = "[@#%&]";

/// Digits in a tariff classification code.
pub const NCM_DIGITS: i64 = 8;
/// Barcode lengths accepted as-is.
pub const BARCODE_LENGTHS: &[i64] = &[8, 12, 13];
/// Largest plausible dimension.
pub const MAX_DIMENSION: i64 = 1000;

/// Minimum length of a brand or reference code.
const MIN_BRAND_LEN: i64 = 2;
const MIN_REF_LEN: i64 = 3;

/// The kinds of problems a diagnosis looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleFamily {
    Uppercase,
    NullString,
    NullNumeric,
    Brand,
    Ncm,
    Barcode,
    Weight,
    Dimension,
    SearchRef,
    ManufacturerRef,
}

impl RuleFamily {
    pub const ALL: [RuleFamily; 10] = [
        RuleFamily::Uppercase,
        RuleFamily::NullString,
        RuleFamily::NullNumeric,
        RuleFamily::Brand,
        RuleFamily::Ncm,
        RuleFamily::Barcode,
        RuleFamily::Weight,
        RuleFamily::Dimension,
        RuleFamily::SearchRef,
        RuleFamily::ManufacturerRef,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RuleFamily::Uppercase => "uppercase",
            RuleFamily::NullString => "null_string",
            RuleFamily::NullNumeric => "null_numeric",
            RuleFamily::Brand => "brand",
            RuleFamily::Ncm => "ncm",
            RuleFamily::Barcode => "barcode",
            RuleFamily::Weight => "weight",
            RuleFamily::Dimension => "dimension",
            RuleFamily::SearchRef => "search_ref",
            RuleFamily::ManufacturerRef => "manufacturer_ref",
        }
    }

    /// Whether the family reports offending columns rather than a row count.
    pub fn reports_columns(&self) -> bool {
        matches!(
            self,
            RuleFamily::Uppercase | RuleFamily::NullString | RuleFamily::NullNumeric
        )
    }
}

impl fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn col(column: &Ident) -> Expr {
    Expr::column(column)
}

fn length(column: &Ident) -> Expr {
    Expr::call("length", [col(column)])
}

fn real(column: &Ident) -> Expr {
    Expr::call("try_real", [col(column)])
}

/// Present and not the empty string.
pub fn not_blank(column: &Ident) -> Expr {
    col(column)
        .is_not_null()
        .and(col(column).differs_from(Expr::text("")))
}

/// NULL, empty, or the text `nan` in any case.
pub fn null_like(column: &Ident) -> Expr {
    col(column)
        .is_null()
        .or(Expr::call("lower", [col(column)]).equals(Expr::text("nan")))
        .or(col(column).equals(Expr::text("")))
}

/// NULL or `nan`, the cells the null-string fix rewrites to empty.
pub fn null_or_nan(column: &Ident) -> Expr {
    col(column)
        .is_null()
        .or(Expr::call("lower", [col(column)]).equals(Expr::text("nan")))
}

pub fn not_uppercase(column: &Ident) -> Expr {
    not_blank(column).and(col(column).differs_from(Expr::call("unicode_upper", [col(column)])))
}

/// Too short, missing, outside the brand alphabet, or purely numeric.
pub fn brand_violation(column: &Ident) -> Expr {
    length(column)
        .less_than(Expr::integer(MIN_BRAND_LEN))
        .or(col(column).is_null())
        .or(col(column).matches(BRAND_PATTERN).not())
        .or(col(column).matches("^[0-9]+$"))
}

/// Not eight digits once dots are removed, or containing letters or dashes.
pub fn ncm_violation(column: &Ident) -> Expr {
    let without_dots = Expr::call("replace", [col(column), Expr::text("."), Expr::text("")]);
    not_blank(column).and(
        Expr::call("length", [without_dots])
            .differs_from(Expr::integer(NCM_DIGITS))
            .or(col(column).matches("[A-Za-z]"))
            .or(Expr::call("instr", [col(column), Expr::text("-")]).greater_than(Expr::integer(0))),
    )
}

/// Wrong length or containing non-digits.
pub fn barcode_violation(column: &Ident) -> Expr {
    not_blank(column).and(
        length(column)
            .not_in(BARCODE_LENGTHS)
            .or(col(column).matches("[^0-9]")),
    )
}

/// Gross below net, either negative, or both zero.
pub fn weight_violation(gross: &Ident, net: &Ident) -> Expr {
    real(gross)
        .less_than(real(net))
        .or(real(gross).less_than(Expr::integer(0)))
        .or(real(net).less_than(Expr::integer(0)))
        .or(real(gross)
            .equals(Expr::integer(0))
            .and(real(net).equals(Expr::integer(0))))
}

/// Any dimension non-positive or above [`MAX_DIMENSION`].
pub fn dimension_violation(columns: &[Ident]) -> Expr {
    Expr::any(columns.iter().map(|column| {
        real(column)
            .at_most(Expr::integer(0))
            .or(real(column).greater_than(Expr::integer(MAX_DIMENSION)))
    }))
}

/// Too short, or containing anything but ASCII letters and digits.
pub fn search_ref_violation(column: &Ident) -> Expr {
    not_blank(column).and(
        length(column)
            .less_than(Expr::integer(MIN_REF_LEN))
            .or(col(column).matches(SEARCH_REF_PATTERN).not()),
    )
}

/// Too short, containing a space, or containing one of `@#%&`.
pub fn manufacturer_ref_violation(column: &Ident) -> Expr {
    not_blank(column).and(
        length(column)
            .less_than(Expr::integer(MIN_REF_LEN))
            .or(Expr::call("instr", [col(column), Expr::text(" ")]).greater_than(Expr::integer(0)))
            .or(col(column).matches(MANUFACTURER_REF_FORBIDDEN)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_labels_round_trip_through_serde() {
        for family in RuleFamily::ALL {
            let json = serde_json::to_string(&family).unwrap();
            assert_eq!(json, format!("\"{}\"", family.label()));
        }
    }

    #[test]
    fn test_column_families() {
        assert!(RuleFamily::Uppercase.reports_columns());
        assert!(!RuleFamily::Brand.reports_columns());
    }

    #[test]
    fn test_dimension_predicate_without_columns_never_holds() {
        assert_eq!(dimension_violation(&[]).sql(), "0");
    }

    #[test]
    fn test_predicates_quote_columns() {
        let column = Ident::new("search_ref").unwrap();
        let sql = search_ref_violation(&column).sql().to_string();
        assert!(sql.contains("\"search_ref\""));
        assert!(sql.contains("REGEXP '^[A-Za-z0-9]+$'"));
    }
}
