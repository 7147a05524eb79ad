//! SQL building from validated identifiers.
//!
//! Statements are assembled from [`Ident`]s taken from the column contract or
//! from schema introspection, plus string literals that are compiled into the
//! crate. Caller-supplied text is never interpolated here; values that come
//! from the data are bound as parameters instead.

use std::fmt;

use crate::error::{Result, SmelterError};

/// Name of the implicit row-order column.
///
/// `rowid` itself can be shadowed by an uploaded column of that name.
pub(crate) const ROW_ORDER: &str = "_rowid_";

const MAX_TABLE_NAME_LEN: usize = 64;

/// A column identifier, rendered double-quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(SmelterError::InvalidIdentifier(
                "column name cannot be empty".to_string(),
            ));
        }
        if name.contains('\0') {
            return Err(SmelterError::InvalidIdentifier(format!(
                "column name '{}' contains a NUL byte",
                name.escape_default()
            )));
        }
        Ok(Self(name))
    }

    /// The unquoted name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0.replace('"', "\"\""))
    }
}

/// A table name: an ASCII letter or underscore followed by letters, digits
/// or underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// The table every upload is loaded into.
    pub const DEFAULT: &'static str = "raw_data";

    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid_start || !valid_rest || name.len() > MAX_TABLE_NAME_LEN {
            return Err(SmelterError::InvalidIdentifier(format!(
                "'{}' is not a valid table name",
                name
            )));
        }
        Ok(Self(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Scratch table used while rebuilding this one.
    pub(crate) fn staging(&self) -> TableName {
        TableName(format!("{}__staging", self.0))
    }
}

impl Default for TableName {
    fn default() -> Self {
        TableName(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

/// Quote a string literal.
pub(crate) fn literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// A boolean or scalar SQL expression.
#[derive(Debug, Clone)]
pub struct Expr(String);

impl Expr {
    pub fn column(column: &Ident) -> Self {
        Expr(column.to_string())
    }

    pub fn text(value: &'static str) -> Self {
        Expr(literal(value))
    }

    pub fn integer(value: i64) -> Self {
        Expr(value.to_string())
    }

    pub fn null() -> Self {
        Expr("NULL".to_string())
    }

    /// Call a SQL function by its (compiled-in) name.
    pub fn call<I>(function: &'static str, args: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        let args: Vec<String> = args.into_iter().map(|e| e.0).collect();
        Expr(format!("{}({})", function, args.join(", ")))
    }

    pub fn is_null(self) -> Self {
        Expr(format!("({} IS NULL)", self.0))
    }

    pub fn is_not_null(self) -> Self {
        Expr(format!("({} IS NOT NULL)", self.0))
    }

    pub fn equals(self, other: Expr) -> Self {
        Expr(format!("({} = {})", self.0, other.0))
    }

    pub fn differs_from(self, other: Expr) -> Self {
        Expr(format!("({} <> {})", self.0, other.0))
    }

    pub fn less_than(self, other: Expr) -> Self {
        Expr(format!("({} < {})", self.0, other.0))
    }

    pub fn at_most(self, other: Expr) -> Self {
        Expr(format!("({} <= {})", self.0, other.0))
    }

    pub fn greater_than(self, other: Expr) -> Self {
        Expr(format!("({} > {})", self.0, other.0))
    }

    /// Full-syntax regular expression match, via the registered `regexp`.
    pub fn matches(self, pattern: &'static str) -> Self {
        Expr(format!("({} REGEXP {})", self.0, literal(pattern)))
    }

    pub fn not_in(self, values: &[i64]) -> Self {
        let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        Expr(format!("({} NOT IN ({}))", self.0, values.join(", ")))
    }

    pub fn and(self, other: Expr) -> Self {
        Expr(format!("({} AND {})", self.0, other.0))
    }

    pub fn or(self, other: Expr) -> Self {
        Expr(format!("({} OR {})", self.0, other.0))
    }

    pub fn not(self) -> Self {
        Expr(format!("(NOT {})", self.0))
    }

    /// Disjunction of all expressions; false when empty.
    pub fn any<I>(exprs: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        exprs
            .into_iter()
            .reduce(Expr::or)
            .unwrap_or_else(|| Expr("0".to_string()))
    }

    /// Conjunction of all expressions; true when empty.
    pub fn all<I>(exprs: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        exprs
            .into_iter()
            .reduce(Expr::and)
            .unwrap_or_else(|| Expr("1".to_string()))
    }

    pub fn sql(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn count_where(table: &TableName, filter: &Expr) -> String {
    format!("SELECT COUNT(*) FROM {} WHERE {}", table, filter)
}

pub(crate) fn update_where(table: &TableName, column: &Ident, value: &Expr, filter: &Expr) -> String {
    format!("UPDATE {} SET {} = {} WHERE {}", table, column, value, filter)
}

pub(crate) fn select_all(table: &TableName) -> String {
    format!("SELECT * FROM {} ORDER BY {}", table, ROW_ORDER)
}
