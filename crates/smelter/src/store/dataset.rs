//! The dataset handle: one table inside one project store.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rusqlite::types::ValueRef;
use rusqlite::{Params, Statement, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, SmelterError};

use super::functions::TextFunction;
use super::ingest::{self, LoadOptions, LoadSummary, SourceFile};
use super::query::{Ident, ROW_ORDER, TableName};
use super::session::{AccessMode, Session};

/// One row, keyed by column name in schema order.
pub type Record = IndexMap<String, serde_json::Value>;

/// Handle to a table in a store file.
///
/// Creating a handle does no I/O. Each operation opens its own session, so
/// handles are cheap to clone and share.
#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
    table: TableName,
    functions: Vec<TextFunction>,
}

impl Dataset {
    /// Handle to the default table of the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: TableName::default(),
            functions: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: TableName) -> Self {
        self.table = table;
        self
    }

    /// Register `function` on every session this handle opens.
    pub fn with_function(mut self, function: TextFunction) -> Self {
        self.functions.push(function);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Whether the store file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn session(&self, mode: AccessMode) -> Result<Session> {
        Session::open(&self.path, &self.table, mode, &self.functions)
    }

    /// Replace the table with the contents of a delimited file.
    ///
    /// The store file is created if needed. The source is deleted only after
    /// the load has committed, and only if `options.delete_source` is set.
    pub fn load(&self, source: impl AsRef<Path>, options: &LoadOptions) -> Result<LoadSummary> {
        let source = SourceFile::read(source.as_ref())?;
        let mut session = self.session(AccessMode::Create)?;
        let mut summary = ingest::load_into(&mut session, &source, options)?;
        drop(session);

        if options.delete_source {
            fs::remove_file(source.path()).map_err(|e| SmelterError::io(source.path(), e))?;
            summary.source_deleted = true;
            debug!(path = %source.path().display(), "source file removed");
        }
        Ok(summary)
    }

    /// Column names in schema order.
    pub fn columns(&self) -> Result<Vec<String>> {
        self.session(AccessMode::ReadOnly)?.columns()
    }

    pub fn row_count(&self) -> Result<usize> {
        let session = self.session(AccessMode::ReadOnly)?;
        session.require_table()?;
        session.row_count()
    }

    /// One page of rows in insertion order. Pages start at 1.
    pub fn preview(&self, page: usize, limit: usize) -> Result<Preview> {
        let session = self.session(AccessMode::ReadOnly)?;
        session.require_table()?;
        let total_rows = session.row_count()?;
        let offset = page.saturating_sub(1).saturating_mul(limit);

        let mut stmt = session.connection().prepare(&format!(
            "SELECT * FROM {} ORDER BY {} LIMIT ?1 OFFSET ?2",
            session.table(),
            ROW_ORDER
        ))?;
        let limit_param = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset_param = i64::try_from(offset).unwrap_or(i64::MAX);
        let (columns, rows) = read_records(&mut stmt, params![limit_param, offset_param])?;

        Ok(Preview {
            total_rows,
            page,
            page_size: limit,
            columns,
            rows,
        })
    }

    /// Run arbitrary SQL against the store.
    ///
    /// Failures are captured in the returned outcome rather than raised.
    pub fn run_ad_hoc(&self, sql: &str) -> QueryOutcome {
        match self.try_ad_hoc(sql) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "ad-hoc query failed");
                QueryOutcome::failed(err.to_string())
            }
        }
    }

    fn try_ad_hoc(&self, sql: &str) -> Result<QueryOutcome> {
        match QueryKind::classify(sql) {
            QueryKind::Rows => {
                let session = self.session(AccessMode::ReadOnly)?;
                let rows = match catalog_query(sql) {
                    Some(CatalogQuery::Tables) => {
                        let mut stmt = session.connection().prepare(
                            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                        )?;
                        read_records(&mut stmt, [])?.1
                    }
                    Some(CatalogQuery::Describe(table)) => {
                        let mut stmt = session.connection().prepare(
                            "SELECT name AS column_name, type AS column_type, \"notnull\" AS not_null \
                             FROM pragma_table_info(?1) ORDER BY cid",
                        )?;
                        read_records(&mut stmt, params![table])?.1
                    }
                    None => {
                        let mut stmt = session.connection().prepare(sql)?;
                        read_records(&mut stmt, [])?.1
                    }
                };
                Ok(QueryOutcome::rows(rows))
            }
            QueryKind::Statement => {
                let session = self.session(AccessMode::ReadWrite)?;
                session.connection().execute_batch(sql)?;
                info!("ad-hoc statement executed");
                Ok(QueryOutcome::executed())
            }
        }
    }

    /// Rename a column. Fails if `old` is absent or `new` already exists.
    pub fn rename_column(&self, old: &str, new: &str) -> Result<()> {
        let old = Ident::new(old)?;
        let new = Ident::new(new)?;
        let session = self.session(AccessMode::ReadWrite)?;
        session.require_table()?;
        session.connection().execute(
            &format!(
                "ALTER TABLE {} RENAME COLUMN {} TO {}",
                session.table(),
                old,
                new
            ),
            [],
        )?;
        info!(from = old.name(), to = new.name(), "column renamed");
        Ok(())
    }

    /// Write the table as a delimited file with a header row.
    pub fn export(&self, destination: impl AsRef<Path>, delimiter: u8) -> Result<usize> {
        let session = self.session(AccessMode::ReadOnly)?;
        ingest::write_delimited(&session, destination.as_ref(), delimiter)
    }
}

/// A page of rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preview {
    pub total_rows: usize,
    pub page: usize,
    pub page_size: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

/// Whether SQL is expected to return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Rows,
    Statement,
}

impl QueryKind {
    /// `select`, `show` and `describe` return rows; anything else is executed.
    pub fn classify(sql: &str) -> Self {
        let lowered = sql.trim_start().to_lowercase();
        if ["select", "show", "describe"]
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
        {
            QueryKind::Rows
        } else {
            QueryKind::Statement
        }
    }
}

enum CatalogQuery<'a> {
    Tables,
    Describe(&'a str),
}

/// Recognize `SHOW TABLES` and `DESCRIBE <table>`.
fn catalog_query(sql: &str) -> Option<CatalogQuery<'_>> {
    let trimmed = sql.trim().trim_end_matches(';').trim_end();
    let words: Vec<&str> = trimmed.split_whitespace().collect();

    match words.as_slice() {
        [show, tables]
            if show.eq_ignore_ascii_case("show") && tables.eq_ignore_ascii_case("tables") =>
        {
            Some(CatalogQuery::Tables)
        }
        [describe, table] if describe.eq_ignore_ascii_case("describe") => {
            Some(CatalogQuery::Describe(table.trim_matches('"')))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Success,
    Error,
}

/// Result of an ad-hoc query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub status: QueryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Record>>,
    /// 0 for row-returning queries, -1 when the store does not report a count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryOutcome {
    fn rows(data: Vec<Record>) -> Self {
        Self {
            status: QueryStatus::Success,
            data: Some(data),
            rows_affected: Some(0),
            error: None,
        }
    }

    fn executed() -> Self {
        Self {
            status: QueryStatus::Success,
            data: None,
            rows_affected: Some(-1),
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            status: QueryStatus::Error,
            data: None,
            rows_affected: None,
            error: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }
}

/// Convert a stored value to JSON.
pub(crate) fn json_value(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Run `stmt` and collect its column names and rows.
pub(crate) fn read_records<P: Params>(
    stmt: &mut Statement<'_>,
    params: P,
) -> Result<(Vec<String>, Vec<Record>)> {
    let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let mut rows = stmt.query(params)?;
    let mut records = Vec::new();

    while let Some(row) = rows.next()? {
        let mut record = Record::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            record.insert(name.clone(), json_value(row.get_ref(i)?));
        }
        records.push(record);
    }

    Ok((columns, records))
}
