//! Project stores: one SQLite file per project holding the uploaded table.
//!
//! This module handles:
//! - Loading delimited files into a table ([`Dataset::load`])
//! - Paging, ad-hoc SQL, column renames and export
//! - SQL building from validated identifiers ([`Ident`], [`Expr`])
//! - Scalar functions the diagnostic predicates rely on
//! - In-place numeric promotion of text columns ([`Session::promote_to_real`])

mod dataset;
mod functions;
mod ingest;
mod query;
mod session;

pub use dataset::{Dataset, Preview, QueryKind, QueryOutcome, QueryStatus, Record};
pub(crate) use dataset::{json_value, read_records};
pub use functions::{TextFn, TextFunction};
pub(crate) use functions::value_text;
pub use ingest::{LoadOptions, LoadSummary, detect_delimiter, format_name, normalize_headers};
pub use query::{Expr, Ident, TableName};
pub(crate) use query::ROW_ORDER;
pub use session::{
    AccessMode, ColumnInfo, ColumnKind, NumericColumn, Promotion, Session, TextColumn,
};
