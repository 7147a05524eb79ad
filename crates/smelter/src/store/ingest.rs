//! Delimited file ingestion and export.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::params_from_iter;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Result, SmelterError};

use super::functions::value_text;
use super::query::{Ident, select_all};
use super::session::Session;

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Ingestion options.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Quote character.
    pub quote: u8,
    /// Remove the source file once the load has committed.
    pub delete_source: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
            delete_source: true,
        }
    }
}

impl LoadOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn keep_source(mut self) -> Self {
        self.delete_source = false;
        self
    }
}

/// What a load produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Table the rows were loaded into.
    pub table: String,
    /// File name of the source, without path.
    pub file: String,
    /// SHA-256 hash of the source contents.
    pub hash: String,
    pub size_bytes: u64,
    /// Detected or configured format (csv, tsv, ...).
    pub format: String,
    /// Column names as stored, after de-duplication.
    pub columns: Vec<String>,
    pub row_count: usize,
    /// Whether the source file was removed after loading.
    pub source_deleted: bool,
    pub loaded_at: DateTime<Utc>,
}

/// Source file contents and fingerprint.
pub(crate) struct SourceFile {
    path: PathBuf,
    contents: Vec<u8>,
    hash: String,
}

impl SourceFile {
    pub(crate) fn read(path: &Path) -> Result<Self> {
        let contents = fs::read(path).map_err(|e| SmelterError::io(path, e))?;
        if contents.iter().all(u8::is_ascii_whitespace) {
            return Err(SmelterError::EmptyData(format!("'{}' is empty", path.display())));
        }

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        Ok(Self {
            path: path.to_path_buf(),
            contents,
            hash,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Replace the session's table with the contents of `source`.
///
/// All columns are stored as TEXT and empty fields as NULL. The drop, create
/// and inserts share one transaction, so a failed load leaves any previous
/// table in place.
pub(crate) fn load_into(
    session: &mut Session,
    source: &SourceFile,
    options: &LoadOptions,
) -> Result<LoadSummary> {
    let delimiter = match options.delimiter {
        Some(d) => d,
        None => detect_delimiter(&source.contents)?,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .quote(options.quote)
        .has_headers(true)
        .flexible(true)
        .from_reader(source.contents.as_slice());

    let headers = normalize_headers(reader.headers()?.iter());
    if headers.is_empty() {
        return Err(SmelterError::EmptyData("No columns found".to_string()));
    }
    let idents = headers
        .iter()
        .map(|h| Ident::new(h.as_str()))
        .collect::<Result<Vec<_>>>()?;

    let table = session.table().clone();
    let definitions: Vec<String> = idents.iter().map(|i| format!("{} TEXT", i)).collect();
    let placeholders: Vec<String> = (1..=idents.len()).map(|i| format!("?{}", i)).collect();

    let tx = session.connection_mut().transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({});",
        definitions.join(", ")
    ))?;

    let mut row_count = 0;
    {
        let mut insert = tx.prepare(&format!(
            "INSERT INTO {table} VALUES ({})",
            placeholders.join(", ")
        ))?;

        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            if record.len() > headers.len() {
                return Err(SmelterError::Parse {
                    row: row_idx + 1,
                    message: format!(
                        "expected at most {} fields, found {}",
                        headers.len(),
                        record.len()
                    ),
                });
            }

            let mut values: Vec<Option<&str>> = record
                .iter()
                .map(|field| if field.is_empty() { None } else { Some(field) })
                .collect();
            values.resize(headers.len(), None);

            insert.execute(params_from_iter(values.iter()))?;
            row_count += 1;
        }
    }
    tx.commit()?;

    info!(
        table = table.name(),
        rows = row_count,
        columns = headers.len(),
        "dataset loaded"
    );

    Ok(LoadSummary {
        table: table.name().to_string(),
        file: source.file_name(),
        hash: source.hash.clone(),
        size_bytes: source.contents.len() as u64,
        format: format_name(delimiter).to_string(),
        columns: headers,
        row_count,
        source_deleted: false,
        loaded_at: Utc::now(),
    })
}

/// Write the session's table to `destination` with a header row.
///
/// NULL cells are written as empty fields. Returns the number of data rows.
pub(crate) fn write_delimited(session: &Session, destination: &Path, delimiter: u8) -> Result<usize> {
    session.require_table()?;

    let file = File::create(destination).map_err(|e| SmelterError::io(destination, e))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(file);

    let mut stmt = session
        .connection()
        .prepare(&select_all(session.table()))?;
    let column_count = stmt.column_count();
    let header: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    writer.write_record(&header)?;

    let mut rows = stmt.query([])?;
    let mut written = 0;
    while let Some(row) = rows.next()? {
        let mut record = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let text = value_text(row.get_ref(i)?).unwrap_or_default();
            record.push(text.into_owned());
        }
        writer.write_record(&record)?;
        written += 1;
    }

    writer
        .flush()
        .map_err(|e| SmelterError::io(destination, e))?;
    debug!(path = %destination.display(), rows = written, "dataset exported");
    Ok(written)
}

/// Names SQLite resolves to the implicit row id, compared case-insensitively.
const RESERVED_COLUMNS: [&str; 3] = ["rowid", "_rowid_", "oid"];

/// Make header names usable as distinct column names.
///
/// Names are trimmed, blanks become `column<N>` (1-based position) and
/// repeats and row id aliases get a `_<n>` suffix. Comparison is
/// case-insensitive, matching how the store resolves column names.
pub fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = RESERVED_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut headers = Vec::new();

    for (idx, name) in raw.into_iter().enumerate() {
        let trimmed = name.as_ref().trim();
        let base = if trimmed.is_empty() {
            format!("column{}", idx + 1)
        } else {
            trimmed.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while !seen.insert(candidate.to_lowercase()) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        headers.push(candidate);
    }

    headers
}

/// Format label for a delimiter.
pub fn format_name(delimiter: u8) -> &'static str {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
}

/// Detect the delimiter by analyzing the first few lines.
pub fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(SmelterError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let variance: f64 = if counts.len() > 1 {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64
        } else {
            0.0
        };

        // Consistent counts win; tabs break ties since they rarely occur in values.
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_semicolon_with_decimal_commas() {
        let data = b"name;weight\nbolt;1,5\nnut;0,25";
        assert_eq!(detect_delimiter(data).unwrap(), b';');
    }

    #[test]
    fn test_detect_delimiter_ignores_quoted() {
        let data = b"name\tnote\n\"a,b,c\"\tx\n\"d,e\"\ty";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_detect_delimiter_empty() {
        assert!(matches!(
            detect_delimiter(b"\n  \n"),
            Err(SmelterError::EmptyData(_))
        ));
    }

    #[test]
    fn test_normalize_headers() {
        let headers = normalize_headers([" brand ", "", "Brand", "brand", "ncm"]);
        assert_eq!(headers, vec!["brand", "column2", "Brand_1", "brand_2", "ncm"]);
    }

    #[test]
    fn test_normalize_headers_suffixes_row_id_aliases() {
        let headers = normalize_headers(["_rowid_", "ROWID", "oid", "brand"]);
        assert_eq!(headers, vec!["_rowid__1", "ROWID_1", "oid_1", "brand"]);
    }

    #[test]
    fn test_format_names() {
        assert_eq!(format_name(b','), "csv");
        assert_eq!(format_name(b'\t'), "tsv");
        assert_eq!(format_name(b'#'), "delimited");
    }
}
