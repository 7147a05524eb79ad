//! Main Smelter struct and public API.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::contract::{ColumnAnalysis, ColumnContract};
use crate::diagnosis::{DiagnosticEngine, DiagnosticReport};
use crate::duplicates::{DuplicateAnalysis, DuplicateResolver};
use crate::error::{Result, SmelterError};
use crate::project::ProjectId;
use crate::remediation::{Remediation, RemediationEngine, RemediationResult};
use crate::store::{Dataset, LoadOptions, LoadSummary, Preview, QueryOutcome, TableName};

/// Store file extension.
const STORE_EXTENSION: &str = "sqlite";

/// Configuration for Smelter.
#[derive(Debug, Clone)]
pub struct SmelterConfig {
    /// Directory holding one store file per project.
    pub data_dir: PathBuf,
    /// Table uploads are loaded into.
    pub table: TableName,
    /// Ingest delimiter (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Delimiter for exported files.
    pub export_delimiter: u8,
    /// Largest page a preview may request.
    pub max_page_size: usize,
    /// Columns datasets are expected to carry.
    pub contract: ColumnContract,
}

impl Default for SmelterConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("temp_data"),
            table: TableName::default(),
            delimiter: None,
            export_delimiter: b',',
            max_page_size: 1000,
            contract: ColumnContract::catalog(),
        }
    }
}

impl SmelterConfig {
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_table(mut self, table: TableName) -> Self {
        self.table = table;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_export_delimiter(mut self, delimiter: u8) -> Self {
        self.export_delimiter = delimiter;
        self
    }

    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    pub fn with_contract(mut self, contract: ColumnContract) -> Self {
        self.contract = contract;
        self
    }
}

/// Entry point: resolves projects to datasets and runs every operation.
pub struct Smelter {
    config: SmelterConfig,
    diagnostics: DiagnosticEngine,
    remediation: RemediationEngine,
    duplicates: DuplicateResolver,
}

impl Smelter {
    /// Create a new Smelter instance with default configuration.
    pub fn new() -> Self {
        Self::with_config(SmelterConfig::default())
    }

    /// Create a Smelter instance with custom configuration.
    pub fn with_config(config: SmelterConfig) -> Self {
        Self {
            config,
            diagnostics: DiagnosticEngine::new(),
            remediation: RemediationEngine::new(),
            duplicates: DuplicateResolver::new(),
        }
    }

    /// Replace the barcode normalizer used by [`Remediation::Barcode`].
    pub fn with_barcode_normalizer<F>(mut self, normalizer: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.remediation = self.remediation.with_barcode_normalizer(normalizer);
        self
    }

    pub fn config(&self) -> &SmelterConfig {
        &self.config
    }

    /// Path of a project's store file.
    pub fn store_path(&self, project: &ProjectId) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.{}", project, STORE_EXTENSION))
    }

    /// Where [`Smelter::export`] writes when no destination is given.
    pub fn default_export_path(&self, project: &ProjectId) -> PathBuf {
        self.config.data_dir.join(format!("{}_export.csv", project))
    }

    /// Dataset handle for a project. Does no I/O.
    pub fn dataset(&self, project: &ProjectId) -> Dataset {
        Dataset::open(self.store_path(project)).with_table(self.config.table.clone())
    }

    /// Load a delimited file into a project, replacing any previous data.
    ///
    /// The source file is deleted once the load has committed.
    pub fn ingest(&self, project: &ProjectId, source: impl AsRef<Path>) -> Result<LoadSummary> {
        self.ingest_with(project, source, &self.load_options())
    }

    /// [`Smelter::ingest`] with explicit load options.
    pub fn ingest_with(
        &self,
        project: &ProjectId,
        source: impl AsRef<Path>,
        options: &LoadOptions,
    ) -> Result<LoadSummary> {
        fs::create_dir_all(&self.config.data_dir)
            .map_err(|e| SmelterError::io(&self.config.data_dir, e))?;
        let summary = self.dataset(project).load(source, options)?;
        info!(project = %project, rows = summary.row_count, "project ingested");
        Ok(summary)
    }

    /// Ingest into a freshly generated project.
    pub fn ingest_new(&self, source: impl AsRef<Path>) -> Result<(ProjectId, LoadSummary)> {
        let project = ProjectId::generate();
        let summary = self.ingest(&project, source)?;
        Ok((project, summary))
    }

    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            delimiter: self.config.delimiter,
            ..LoadOptions::default()
        }
    }

    /// One page of rows. `page` starts at 1; `limit` is bounded by
    /// `max_page_size`.
    pub fn preview(&self, project: &ProjectId, page: usize, limit: usize) -> Result<Preview> {
        if page < 1 {
            return Err(SmelterError::InvalidArgument(
                "page must be at least 1".to_string(),
            ));
        }
        if limit < 1 || limit > self.config.max_page_size {
            return Err(SmelterError::InvalidArgument(format!(
                "limit must be between 1 and {}",
                self.config.max_page_size
            )));
        }
        self.dataset(project).preview(page, limit)
    }

    /// Run ad-hoc SQL. Failures come back inside the outcome.
    pub fn run_query(&self, project: &ProjectId, sql: &str) -> QueryOutcome {
        self.dataset(project).run_ad_hoc(sql)
    }

    /// Classify the project's columns against the contract.
    pub fn analyze_columns(&self, project: &ProjectId) -> Result<ColumnAnalysis> {
        let columns = self.dataset(project).columns()?;
        Ok(self.config.contract.classify(columns))
    }

    /// Rename a column to a name the contract recognizes.
    pub fn rename_column(&self, project: &ProjectId, old: &str, new: &str) -> Result<()> {
        if !self.config.contract.is_allowed_rename_target(new) {
            return Err(SmelterError::Conflict(format!(
                "'{}' is not a recognized column name",
                new
            )));
        }

        let dataset = self.dataset(project);
        let columns = dataset.columns()?;
        if !columns.iter().any(|c| c == old) {
            return Err(SmelterError::NotFound(format!(
                "column '{}' does not exist",
                old
            )));
        }
        if columns.iter().any(|c| c != old && c.eq_ignore_ascii_case(new)) {
            return Err(SmelterError::Conflict(format!(
                "column '{}' already exists",
                new
            )));
        }

        dataset.rename_column(old, new)
    }

    /// Run every diagnostic.
    pub fn diagnose(&self, project: &ProjectId) -> Result<DiagnosticReport> {
        self.diagnostics.diagnose(&self.dataset(project))
    }

    /// Apply a remediation to its default columns.
    pub fn remediate(&self, project: &ProjectId, remediation: Remediation) -> Result<RemediationResult> {
        self.remediation.apply(&self.dataset(project), remediation)
    }

    /// Apply a remediation to a caller-chosen subset of its columns.
    ///
    /// Only the string and numeric hygiene fixes take a column selection, and
    /// every selected column must belong to the fix's default group.
    pub fn remediate_columns<S: AsRef<str>>(
        &self,
        project: &ProjectId,
        remediation: Remediation,
        columns: &[S],
    ) -> Result<RemediationResult> {
        if !remediation.accepts_columns() {
            return Err(SmelterError::InvalidArgument(format!(
                "'{}' does not take a column selection",
                remediation
            )));
        }

        let allowed = remediation.default_columns();
        if let Some(column) = columns
            .iter()
            .map(AsRef::as_ref)
            .find(|c| !allowed.contains(c))
        {
            return Err(SmelterError::Conflict(format!(
                "column '{}' is not covered by '{}'",
                column, remediation
            )));
        }

        self.remediation
            .apply_to(&self.dataset(project), remediation, columns)
    }

    pub fn analyze_duplicates(&self, project: &ProjectId) -> Result<DuplicateAnalysis> {
        self.duplicates.analyze(&self.dataset(project))
    }

    pub fn remove_duplicates(&self, project: &ProjectId) -> Result<RemediationResult> {
        self.duplicates.remove(&self.dataset(project))
    }

    /// Export the project's table; returns the path written.
    pub fn export(&self, project: &ProjectId, destination: Option<&Path>) -> Result<PathBuf> {
        let path = destination
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_export_path(project));
        let rows = self
            .dataset(project)
            .export(&path, self.config.export_delimiter)?;
        info!(project = %project, rows, path = %path.display(), "project exported");
        Ok(path)
    }

    /// Remove the project's store and default export file.
    ///
    /// Returns whether anything was removed.
    pub fn delete_project(&self, project: &ProjectId) -> Result<bool> {
        let mut removed = false;
        for path in [self.store_path(project), self.default_export_path(project)] {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| SmelterError::io(&path, e))?;
                removed = true;
            }
        }
        if removed {
            info!(project = %project, "project deleted");
        }
        Ok(removed)
    }
}

impl Default for Smelter {
    fn default() -> Self {
        Self::new()
    }
}
