//! Remediation operations and their results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::contract::{
    BARCODE_COLUMNS, CODE_REF_COLUMNS, NCM_COLUMNS, NUMERIC_CHECK_COLUMNS, STRING_CHECK_COLUMNS,
    WEIGHT_COLUMNS,
};
use crate::diagnosis::RuleFamily;
use crate::error::SmelterError;

/// A fix that can be applied to a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remediation {
    /// Replace NULL and `nan` text cells with the empty string.
    NullStrings,
    /// Upper-case text cells.
    Uppercase,
    /// Fill null-like numeric cells with zero, promoting the column when possible.
    NullNumerics,
    /// Normalize barcodes to EAN-13.
    Barcode,
    /// Strip non-digits from tariff codes.
    Ncm,
    /// Upper-case reference codes and strip non-alphanumerics.
    Codes,
    /// Replace negative weights with their absolute value.
    NegativeWeights,
}

impl Remediation {
    pub const ALL: [Remediation; 7] = [
        Remediation::NullStrings,
        Remediation::Uppercase,
        Remediation::NullNumerics,
        Remediation::Barcode,
        Remediation::Ncm,
        Remediation::Codes,
        Remediation::NegativeWeights,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Remediation::NullStrings => "null-strings",
            Remediation::Uppercase => "uppercase",
            Remediation::NullNumerics => "null-numerics",
            Remediation::Barcode => "barcode",
            Remediation::Ncm => "ncm",
            Remediation::Codes => "codes",
            Remediation::NegativeWeights => "negative-weights",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Remediation::NullStrings => "Replace null and 'nan' text with empty strings",
            Remediation::Uppercase => "Convert text columns to upper case",
            Remediation::NullNumerics => "Fill missing numbers with zero",
            Remediation::Barcode => "Normalize barcodes to EAN-13",
            Remediation::Ncm => "Keep only the digits of NCM codes",
            Remediation::Codes => "Upper-case reference codes and strip symbols",
            Remediation::NegativeWeights => "Make negative weights positive",
        }
    }

    /// The diagnostic family this fix addresses.
    pub fn family(&self) -> RuleFamily {
        match self {
            Remediation::NullStrings => RuleFamily::NullString,
            Remediation::Uppercase => RuleFamily::Uppercase,
            Remediation::NullNumerics => RuleFamily::NullNumeric,
            Remediation::Barcode => RuleFamily::Barcode,
            Remediation::Ncm => RuleFamily::Ncm,
            Remediation::Codes => RuleFamily::SearchRef,
            Remediation::NegativeWeights => RuleFamily::Weight,
        }
    }

    /// Columns the fix operates on by default.
    pub fn default_columns(&self) -> &'static [&'static str] {
        match self {
            Remediation::NullStrings | Remediation::Uppercase => STRING_CHECK_COLUMNS,
            Remediation::NullNumerics => NUMERIC_CHECK_COLUMNS,
            Remediation::Barcode => BARCODE_COLUMNS,
            Remediation::Ncm => NCM_COLUMNS,
            Remediation::Codes => CODE_REF_COLUMNS,
            Remediation::NegativeWeights => WEIGHT_COLUMNS,
        }
    }

    /// Whether the caller may choose which columns the fix touches.
    pub fn accepts_columns(&self) -> bool {
        matches!(
            self,
            Remediation::NullStrings | Remediation::Uppercase | Remediation::NullNumerics
        )
    }
}

impl fmt::Display for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Remediation {
    type Err = SmelterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Remediation::ALL
            .into_iter()
            .find(|r| r.name() == normalized)
            .ok_or_else(|| {
                SmelterError::InvalidArgument(format!("unknown remediation '{}'", s))
            })
    }
}

/// What a remediation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationResult {
    /// Columns the fix processed, in processing order.
    pub columns_affected: Vec<String>,
    /// Rows that matched a violating predicate before the fix.
    pub rows_affected: usize,
}

impl RemediationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, column: &str, rows: usize) {
        self.columns_affected.push(column.to_string());
        self.rows_affected += rows;
    }

    /// True when nothing needed fixing.
    pub fn is_noop(&self) -> bool {
        self.rows_affected == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("null-strings".parse::<Remediation>().unwrap(), Remediation::NullStrings);
        assert_eq!("NEGATIVE_WEIGHTS".parse::<Remediation>().unwrap(), Remediation::NegativeWeights);
        assert!("bogus".parse::<Remediation>().is_err());
    }

    #[test]
    fn test_names_round_trip() {
        for remediation in Remediation::ALL {
            assert_eq!(remediation.name().parse::<Remediation>().unwrap(), remediation);
        }
    }

    #[test]
    fn test_result_accumulates() {
        let mut result = RemediationResult::new();
        assert!(result.is_noop());
        result.record("brand", 2);
        result.record("name", 0);
        assert_eq!(result.columns_affected, vec!["brand", "name"]);
        assert_eq!(result.rows_affected, 2);
    }
}
