//! Required/optional column sets and classification of found columns.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SmelterError};

use super::catalog::{OPTIONAL_COLUMNS, REQUIRED_COLUMNS, column_set};

/// Classification of a dataset's columns against a [`ColumnContract`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAnalysis {
    /// Required columns absent from the dataset.
    pub missing: Vec<String>,
    /// Dataset columns the contract does not recognize.
    pub extra: Vec<String>,
    /// Dataset columns the contract recognizes.
    pub present: Vec<String>,
    /// The contract's required columns.
    pub required: Vec<String>,
    /// The contract's optional columns.
    pub optional: Vec<String>,
}

impl ColumnAnalysis {
    /// True when no required column is missing.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// The set of column names a dataset is expected to carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnContract {
    required: BTreeSet<String>,
    optional: BTreeSet<String>,
}

impl ColumnContract {
    /// Build a contract, rejecting names listed as both required and optional.
    pub fn new<R, O>(required: R, optional: O) -> Result<Self>
    where
        R: IntoIterator,
        R::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        let required: BTreeSet<String> = required.into_iter().map(Into::into).collect();
        let optional: BTreeSet<String> = optional.into_iter().map(Into::into).collect();

        let overlap: Vec<&str> = required.intersection(&optional).map(|s| s.as_str()).collect();
        if !overlap.is_empty() {
            return Err(SmelterError::Conflict(format!(
                "columns both required and optional: {}",
                overlap.join(", ")
            )));
        }

        Ok(Self { required, optional })
    }

    /// The product catalog contract.
    pub fn catalog() -> Self {
        Self {
            required: column_set(REQUIRED_COLUMNS),
            optional: column_set(OPTIONAL_COLUMNS),
        }
    }

    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    pub fn optional(&self) -> &BTreeSet<String> {
        &self.optional
    }

    /// Union of required and optional columns.
    pub fn valid(&self) -> BTreeSet<String> {
        self.required.union(&self.optional).cloned().collect()
    }

    /// True if `name` is recognized by the contract.
    pub fn is_valid(&self, name: &str) -> bool {
        self.required.contains(name) || self.optional.contains(name)
    }

    /// A column may only be renamed to a name the contract recognizes.
    pub fn is_allowed_rename_target(&self, name: &str) -> bool {
        self.is_valid(name)
    }

    /// Split `found` into missing, extra and present columns.
    pub fn classify<I, S>(&self, found: I) -> ColumnAnalysis
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let found: BTreeSet<String> = found.into_iter().map(|s| s.as_ref().to_string()).collect();

        let missing = self.required.difference(&found).cloned().collect();
        let (present, extra): (Vec<String>, Vec<String>) =
            found.into_iter().partition(|name| self.is_valid(name));

        ColumnAnalysis {
            missing,
            extra,
            present,
            required: self.required.iter().cloned().collect(),
            optional: self.optional.iter().cloned().collect(),
        }
    }
}

impl Default for ColumnContract {
    fn default() -> Self {
        Self::catalog()
    }
}
