//! Duplicate detection and removal on the `(search_ref, brand)` key.
//!
//! Rows where either key column is NULL or empty are never considered
//! duplicates. Within a group the earliest inserted row is the one kept.
//! A table lacking either key column has no duplicates.

use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::{BRAND, SEARCH_REF};
use crate::diagnosis::rules::not_blank;
use crate::error::Result;
use crate::remediation::RemediationResult;
use crate::store::{
    AccessMode, Dataset, Expr, Ident, ROW_ORDER, Record, Session, read_records, value_text,
};

/// Rows sharing one duplicate key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub search_ref: String,
    pub brand: String,
    pub count: usize,
    /// Member rows in insertion order.
    pub rows: Vec<Record>,
}

impl DuplicateGroup {
    /// Rows that would be removed from this group.
    pub fn excess(&self) -> usize {
        self.count.saturating_sub(1)
    }
}

/// Duplicate groups, largest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateAnalysis {
    /// Rows that removal would delete.
    pub total_duplicates: usize,
    pub duplicate_groups: usize,
    pub duplicates: Vec<DuplicateGroup>,
}

/// Finds and removes rows repeating a `(search_ref, brand)` key.
#[derive(Debug, Clone, Default)]
pub struct DuplicateResolver;

struct KeyColumns {
    search_ref: Ident,
    brand: Ident,
}

impl KeyColumns {
    /// The key columns, or `None` when either is absent from the table.
    fn resolve(session: &Session) -> Result<Option<Self>> {
        let present = session.present_columns([SEARCH_REF, BRAND])?;
        let find = |name: &str| present.iter().find(|c| c.name() == name).cloned();
        Ok(find(SEARCH_REF)
            .zip(find(BRAND))
            .map(|(search_ref, brand)| Self { search_ref, brand }))
    }

    fn keyed(&self) -> Expr {
        not_blank(&self.search_ref).and(not_blank(&self.brand))
    }
}

impl DuplicateResolver {
    pub fn new() -> Self {
        Self
    }

    /// List every key shared by more than one row.
    pub fn analyze(&self, dataset: &Dataset) -> Result<DuplicateAnalysis> {
        let session = dataset.session(AccessMode::ReadOnly)?;
        session.require_table()?;
        let Some(keys) = KeyColumns::resolve(&session)? else {
            debug!("duplicate key columns absent");
            return Ok(DuplicateAnalysis::default());
        };
        let table = session.table();

        let mut groups_stmt = session.connection().prepare(&format!(
            "SELECT {sr}, {br}, COUNT(*) AS n FROM {table} WHERE {keyed} \
             GROUP BY {sr}, {br} HAVING COUNT(*) > 1 ORDER BY n DESC, {sr}, {br}",
            sr = keys.search_ref,
            br = keys.brand,
            keyed = keys.keyed(),
        ))?;
        let mut keyed_groups = Vec::new();
        let mut rows = groups_stmt.query([])?;
        while let Some(row) = rows.next()? {
            let search_ref = value_text(row.get_ref(0)?).unwrap_or_default().into_owned();
            let brand = value_text(row.get_ref(1)?).unwrap_or_default().into_owned();
            let count: i64 = row.get(2)?;
            keyed_groups.push((search_ref, brand, usize::try_from(count).unwrap_or(0)));
        }
        drop(rows);

        let mut members_stmt = session.connection().prepare(&format!(
            "SELECT * FROM {table} WHERE {sr} = ?1 AND {br} = ?2 ORDER BY {order}",
            sr = keys.search_ref,
            br = keys.brand,
            order = ROW_ORDER,
        ))?;

        let mut analysis = DuplicateAnalysis::default();
        for (search_ref, brand, count) in keyed_groups {
            let (_, members) = read_records(&mut members_stmt, params![search_ref, brand])?;
            let group = DuplicateGroup {
                search_ref,
                brand,
                count,
                rows: members,
            };
            analysis.total_duplicates += group.excess();
            analysis.duplicates.push(group);
        }
        analysis.duplicate_groups = analysis.duplicates.len();

        Ok(analysis)
    }

    /// Delete all but the earliest row of every duplicate group.
    pub fn remove(&self, dataset: &Dataset) -> Result<RemediationResult> {
        let mut session = dataset.session(AccessMode::ReadWrite)?;
        session.require_table()?;
        let Some(keys) = KeyColumns::resolve(&session)? else {
            debug!("duplicate key columns absent");
            return Ok(RemediationResult::new());
        };

        let deleted = session.atomically(|s| {
            let sql = format!(
                "DELETE FROM {table} WHERE {keyed} AND {order} NOT IN \
                 (SELECT MIN({order}) FROM {table} WHERE {keyed} GROUP BY {sr}, {br})",
                table = s.table(),
                keyed = keys.keyed(),
                order = ROW_ORDER,
                sr = keys.search_ref,
                br = keys.brand,
            );
            Ok(s.connection().execute(&sql, [])?)
        })?;

        info!(rows = deleted, "duplicates removed");
        Ok(RemediationResult {
            columns_affected: vec![
                keys.search_ref.name().to_string(),
                keys.brand.name().to_string(),
            ],
            rows_affected: deleted,
        })
    }
}
