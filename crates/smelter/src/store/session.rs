//! A connection to one project store, scoped to one table.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SmelterError};

use super::functions::{self, TextFunction};
use super::query::{Expr, Ident, ROW_ORDER, TableName, count_where, update_where};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How a session opens its store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
    /// Read-write, creating the file if it does not exist.
    Create,
}

/// Whether a column holds text or numbers, from its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Numeric,
}

impl ColumnKind {
    /// Classify a declared column type using SQLite's affinity rules.
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        if upper.contains("INT") {
            ColumnKind::Numeric
        } else if upper.contains("CHAR")
            || upper.contains("CLOB")
            || upper.contains("TEXT")
            || upper.contains("BLOB")
            || upper.trim().is_empty()
        {
            ColumnKind::Text
        } else {
            ColumnKind::Numeric
        }
    }
}

/// Name and declared type of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
}

impl ColumnInfo {
    pub fn kind(&self) -> ColumnKind {
        ColumnKind::from_declared(&self.declared_type)
    }
}

/// A column whose values are all real numbers or NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericColumn(Ident);

impl NumericColumn {
    pub fn ident(&self) -> &Ident {
        &self.0
    }
}

/// A column that still holds text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextColumn(Ident);

impl TextColumn {
    pub fn ident(&self) -> &Ident {
        &self.0
    }
}

/// Outcome of [`Session::promote_to_real`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Promotion {
    Promoted(NumericColumn),
    /// Some value did not parse as a number; the column is untouched.
    Unchanged(TextColumn),
}

impl Promotion {
    pub fn is_promoted(&self) -> bool {
        matches!(self, Promotion::Promoted(_))
    }

    pub fn ident(&self) -> &Ident {
        match self {
            Promotion::Promoted(column) => column.ident(),
            Promotion::Unchanged(column) => column.ident(),
        }
    }
}

/// An open store connection with the crate's scalar functions registered.
pub struct Session {
    conn: Connection,
    table: TableName,
}

impl Session {
    pub(crate) fn open(
        path: &Path,
        table: &TableName,
        mode: AccessMode,
        extra_functions: &[TextFunction],
    ) -> Result<Self> {
        if mode != AccessMode::Create && !path.exists() {
            return Err(SmelterError::NotFound(format!(
                "no dataset store at '{}'",
                path.display()
            )));
        }

        let flags = match mode {
            AccessMode::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
            AccessMode::ReadWrite => OpenFlags::SQLITE_OPEN_READ_WRITE,
            AccessMode::Create => OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        } | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        debug!(path = %path.display(), ?mode, "opening store");
        let conn = Connection::open_with_flags(path, flags)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        functions::register_builtins(&conn)?;
        for function in extra_functions {
            functions::register_text_function(&conn, function)?;
        }

        Ok(Self {
            conn,
            table: table.clone(),
        })
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Register an additional text function on this connection.
    pub fn register_function(&self, function: &TextFunction) -> Result<()> {
        functions::register_text_function(&self.conn, function)?;
        Ok(())
    }

    pub fn table_exists(&self) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![self.table.name()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Fail with `NotFound` unless the session's table exists.
    pub fn require_table(&self) -> Result<()> {
        if self.table_exists()? {
            Ok(())
        } else {
            Err(SmelterError::NotFound(format!(
                "table '{}' does not exist",
                self.table.name()
            )))
        }
    }

    /// Columns of the table, in schema order.
    pub fn column_infos(&self) -> Result<Vec<ColumnInfo>> {
        self.require_table()?;
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let infos = stmt
            .query_map(params![self.table.name()], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    declared_type: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(infos)
    }

    pub fn columns(&self) -> Result<Vec<String>> {
        Ok(self.column_infos()?.into_iter().map(|info| info.name).collect())
    }

    /// The candidates that exist in the table, in schema order.
    pub fn present_columns<I, S>(&self, candidates: I) -> Result<Vec<Ident>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let candidates: Vec<S> = candidates.into_iter().collect();
        self.columns()?
            .into_iter()
            .filter(|name| candidates.iter().any(|c| c.as_ref() == name))
            .map(Ident::new)
            .collect()
    }

    pub fn column_kind(&self, column: &Ident) -> Result<ColumnKind> {
        self.column_infos()?
            .into_iter()
            .find(|info| info.name == column.name())
            .map(|info| info.kind())
            .ok_or_else(|| {
                SmelterError::NotFound(format!("column '{}' does not exist", column.name()))
            })
    }

    pub fn row_count(&self) -> Result<usize> {
        self.count(&Expr::all(Vec::new()))
    }

    /// Number of rows matching `filter`.
    pub fn count(&self, filter: &Expr) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row(&count_where(&self.table, filter), [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// Set `column` to `value` on rows matching `filter`; returns rows changed.
    pub fn update(&self, column: &Ident, value: &Expr, filter: &Expr) -> Result<usize> {
        let changed = self
            .conn
            .execute(&update_where(&self.table, column, value, filter), [])?;
        Ok(changed)
    }

    /// Run `work` inside a single write transaction.
    pub fn atomically<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> Result<T>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match work(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Convert `column` to a REAL column.
    ///
    /// Empty and `nan` cells become NULL first. If any remaining value does
    /// not parse as a number, nothing changes and the column is returned as
    /// [`Promotion::Unchanged`]. Row order is preserved.
    pub fn promote_to_real(&mut self, column: &Ident) -> Result<Promotion> {
        let infos = self.column_infos()?;
        if !infos.iter().any(|info| info.name == column.name()) {
            return Err(SmelterError::NotFound(format!(
                "column '{}' does not exist",
                column.name()
            )));
        }

        let table = self.table.clone();
        let staging = table.staging();
        let col = Expr::column(column);
        let blank_or_nan = Expr::call("lower", [col.clone()])
            .equals(Expr::text("nan"))
            .or(col.clone().equals(Expr::text("")));
        let unparseable = col
            .clone()
            .is_not_null()
            .and(Expr::call("try_real", [col.clone()]).is_null());

        let mut definitions = Vec::with_capacity(infos.len());
        let mut selections = Vec::with_capacity(infos.len());
        for info in &infos {
            let ident = Ident::new(info.name.as_str())?;
            if info.name == column.name() {
                definitions.push(format!("{} REAL", ident));
                selections.push(format!("try_real({})", ident));
            } else {
                definitions.push(format!("{} {}", ident, info.declared_type));
                selections.push(ident.to_string());
            }
        }

        let savepoint = self.conn.savepoint()?;
        savepoint.execute(&update_where(&table, column, &Expr::null(), &blank_or_nan), [])?;

        let blockers: i64 =
            savepoint.query_row(&count_where(&table, &unparseable), [], |row| row.get(0))?;
        if blockers > 0 {
            warn!(
                column = column.name(),
                non_numeric = blockers,
                "column kept as text"
            );
            // Dropping the savepoint rolls back the NULL-ing above.
            drop(savepoint);
            return Ok(Promotion::Unchanged(TextColumn(column.clone())));
        }

        savepoint.execute_batch(&format!(
            "DROP TABLE IF EXISTS {staging};
             CREATE TABLE {staging} ({defs});
             INSERT INTO {staging} SELECT {sels} FROM {table} ORDER BY {order};
             DROP TABLE {table};
             ALTER TABLE {staging} RENAME TO {table};",
            staging = staging,
            table = table,
            defs = definitions.join(", "),
            sels = selections.join(", "),
            order = ROW_ORDER,
        ))?;
        savepoint.commit()?;

        debug!(column = column.name(), "column promoted to REAL");
        Ok(Promotion::Promoted(NumericColumn(column.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session_with(dir: &TempDir, rows: &[(&str, Option<&str>)]) -> Session {
        let path = dir.path().join("store.sqlite");
        let session =
            Session::open(&path, &TableName::default(), AccessMode::Create, &[]).unwrap();
        session
            .connection()
            .execute_batch("CREATE TABLE raw_data (\"name\" TEXT, \"weight\" TEXT)")
            .unwrap();
        for (name, weight) in rows {
            session
                .connection()
                .execute("INSERT INTO raw_data VALUES (?1, ?2)", params![name, weight])
                .unwrap();
        }
        session
    }

    #[test]
    fn test_missing_store_is_not_found() {
        let dir = TempDir::new().unwrap();
        let result = Session::open(
            &dir.path().join("absent.sqlite"),
            &TableName::default(),
            AccessMode::ReadOnly,
            &[],
        );
        assert!(matches!(result, Err(SmelterError::NotFound(_))));
    }

    #[test]
    fn test_column_introspection() {
        let dir = TempDir::new().unwrap();
        let session = session_with(&dir, &[("a", Some("1"))]);

        assert_eq!(session.columns().unwrap(), vec!["name", "weight"]);
        let weight = Ident::new("weight").unwrap();
        assert_eq!(session.column_kind(&weight).unwrap(), ColumnKind::Text);

        let present = session.present_columns(["weight", "height"]).unwrap();
        assert_eq!(present, vec![weight]);
    }

    #[test]
    fn test_declared_type_kinds() {
        assert_eq!(ColumnKind::from_declared("TEXT"), ColumnKind::Text);
        assert_eq!(ColumnKind::from_declared("VARCHAR(20)"), ColumnKind::Text);
        assert_eq!(ColumnKind::from_declared(""), ColumnKind::Text);
        assert_eq!(ColumnKind::from_declared("REAL"), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_declared("BIGINT"), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_declared("DECIMAL(10,2)"), ColumnKind::Numeric);
    }

    #[test]
    fn test_promote_numeric_column() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with(
            &dir,
            &[("a", Some("1.5")), ("b", Some("")), ("c", Some("nan")), ("d", None)],
        );
        let weight = Ident::new("weight").unwrap();

        let promotion = session.promote_to_real(&weight).unwrap();
        assert!(promotion.is_promoted());
        assert_eq!(session.column_kind(&weight).unwrap(), ColumnKind::Numeric);

        let values: Vec<(String, Option<f64>)> = session
            .connection()
            .prepare("SELECT name, weight FROM raw_data ORDER BY _rowid_")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(
            values,
            vec![
                ("a".to_string(), Some(1.5)),
                ("b".to_string(), None),
                ("c".to_string(), None),
                ("d".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_promote_keeps_text_column_untouched() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with(&dir, &[("a", Some("heavy")), ("b", Some(""))]);
        let weight = Ident::new("weight").unwrap();

        let promotion = session.promote_to_real(&weight).unwrap();
        assert!(!promotion.is_promoted());
        assert_eq!(session.column_kind(&weight).unwrap(), ColumnKind::Text);

        // The blank cell survives because the attempt was rolled back.
        let blanks = session
            .count(&Expr::column(&weight).equals(Expr::text("")))
            .unwrap();
        assert_eq!(blanks, 1);
    }

    #[test]
    fn test_atomically_rolls_back_on_error() {
        let dir = TempDir::new().unwrap();
        let mut session = session_with(&dir, &[("a", Some("1"))]);
        let name = Ident::new("name").unwrap();

        let result: Result<()> = session.atomically(|s| {
            s.update(&name, &Expr::text("changed"), &Expr::all(Vec::new()))?;
            Err(SmelterError::Conflict("abort".to_string()))
        });
        assert!(result.is_err());

        let changed = session
            .count(&Expr::column(&name).equals(Expr::text("changed")))
            .unwrap();
        assert_eq!(changed, 0);
    }
}
