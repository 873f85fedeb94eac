//! Record store: the in-memory table of reviewable site records.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SitevetError};
use crate::geo::Coordinates;

/// Fixed name of the status column in the durable form.
pub const STATUS_COLUMN: &str = "Validation_Status";

/// Latitude column name in the source dataset.
pub const LAT_COLUMN: &str = "Latitude";

/// Longitude column name in the source dataset.
pub const LON_COLUMN: &str = "Longitude";

/// Image URL column name in the source dataset.
pub const IMAGE_COLUMN: &str = "Url_Image";

/// Stable identity of a record: its row position at load time.
///
/// Ids are never reused; deleting is not an operation of this store, and a
/// reload creates a fresh table with fresh ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RecordId(pub usize);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review decision recorded for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// Not yet reviewed.
    Unreviewed,
    /// Confirmed as a valid site.
    Accepted,
    /// Marked as not a valid site.
    Rejected,
}

impl ValidationStatus {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ValidationStatus::Unreviewed => "Unreviewed",
            ValidationStatus::Accepted => "Accepted",
            ValidationStatus::Rejected => "Rejected",
        }
    }

    /// Parse a status cell. Anything unrecognized is Unreviewed.
    fn from_cell(value: &str) -> Self {
        match value.trim() {
            "Accepted" => ValidationStatus::Accepted,
            "Rejected" => ValidationStatus::Rejected,
            _ => ValidationStatus::Unreviewed,
        }
    }

    /// The cell value written to the durable form.
    ///
    /// Unreviewed round-trips as an empty cell, matching datasets that
    /// predate the status column.
    fn as_cell(&self) -> &'static str {
        match self {
            ValidationStatus::Unreviewed => "",
            ValidationStatus::Accepted => "Accepted",
            ValidationStatus::Rejected => "Rejected",
        }
    }

    /// Check whether a decision has been made.
    pub fn is_decided(&self) -> bool {
        !matches!(self, ValidationStatus::Unreviewed)
    }
}

/// Configuration for typed column handling.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Columns coerced to numeric on load and after every edit.
    pub numeric_columns: Vec<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            numeric_columns: vec![
                "Circular_Tank_Count".to_string(),
                "Rectangular_Tank_Count".to_string(),
                // The source dataset spells it this way.
                "Desgin_Capacity".to_string(),
                LAT_COLUMN.to_string(),
                LON_COLUMN.to_string(),
            ],
        }
    }
}

/// One reviewable entity: a geotagged candidate site.
#[derive(Debug, Clone)]
pub struct Record {
    id: RecordId,
    fields: IndexMap<String, String>,
}

impl Record {
    /// Stable identity of this record.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Raw string value of a field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str())
    }

    /// All fields in column order.
    pub fn fields(&self) -> &IndexMap<String, String> {
        &self.fields
    }

    /// Numeric view of a field; unparseable or empty cells have no value.
    pub fn numeric(&self, name: &str) -> Option<f64> {
        let value = self.field(name)?.trim();
        if value.is_empty() {
            return None;
        }
        value.parse().ok()
    }

    /// Validated location, if the record has one.
    pub fn location(&self) -> Option<Coordinates> {
        let lat = self.numeric(LAT_COLUMN)?;
        let lon = self.numeric(LON_COLUMN)?;
        Coordinates::new(lat, lon)
    }

    /// Image URL, if present and plausibly fetchable.
    pub fn image_url(&self) -> Option<&str> {
        self.field(IMAGE_COLUMN)
            .map(str::trim)
            .filter(|v| v.starts_with("http://") || v.starts_with("https://"))
    }

    /// Current review status.
    pub fn status(&self) -> ValidationStatus {
        self.field(STATUS_COLUMN)
            .map(ValidationStatus::from_cell)
            .unwrap_or(ValidationStatus::Unreviewed)
    }
}

/// Counts of records by review status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub unreviewed: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl StatusCounts {
    /// Total number of records counted.
    pub fn total(&self) -> usize {
        self.unreviewed + self.accepted + self.rejected
    }
}

/// Summary statistics for one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    /// Number of cells with a value.
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Ordered collection of records; insertion order is the canonical row order.
///
/// The table is owned by the active review session. Other components refer
/// to rows by [`RecordId`] and never hold diverging copies.
#[derive(Debug, Clone)]
pub struct RecordTable {
    headers: Vec<String>,
    records: Vec<Record>,
    config: TableConfig,
}

impl RecordTable {
    /// Load a table from a CSV file with the default column configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_config(path, TableConfig::default())
    }

    /// Load a table from a CSV file.
    pub fn load_with_config(path: impl AsRef<Path>, config: TableConfig) -> Result<Self> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| SitevetError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| SitevetError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        // Source files are not reliably UTF-8 (the original dataset is
        // latin1); lossy conversion keeps every row loadable.
        Self::from_csv(&String::from_utf8_lossy(&contents), config)
    }

    /// Parse a table from CSV text.
    pub fn from_csv(content: &str, config: TableConfig) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|s| s.trim().to_string())
            .collect();

        if headers.is_empty() {
            return Err(SitevetError::EmptyData("No columns found".to_string()));
        }

        if !headers.iter().any(|h| h == STATUS_COLUMN) {
            headers.push(STATUS_COLUMN.to_string());
        }

        let mut records = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let row = result?;
            let mut fields = IndexMap::with_capacity(headers.len());
            for (col_idx, name) in headers.iter().enumerate() {
                // Ragged rows are padded; extra cells are dropped.
                let value = row.get(col_idx).unwrap_or("").to_string();
                fields.insert(name.clone(), value);
            }
            records.push(Record {
                id: RecordId(row_idx),
                fields,
            });
        }

        let mut table = Self {
            headers,
            records,
            config,
        };
        table.recoerce_numeric();
        Ok(table)
    }

    /// Column names in order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Records in canonical row order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: RecordId) -> Result<&Record> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or(SitevetError::NotFound(id))
    }

    fn get_mut(&mut self, id: RecordId) -> Result<&mut Record> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(SitevetError::NotFound(id))
    }

    /// Overwrite the named fields of a record, then re-coerce numeric
    /// columns across the whole table.
    ///
    /// Field names not present in the table are ignored, so a presentation
    /// form can post its complete fieldset back verbatim. A numeric column
    /// that receives an unparseable value ends up as "no value", not as the
    /// raw string and not as an error.
    pub fn apply_edit(
        &mut self,
        id: RecordId,
        updates: &IndexMap<String, String>,
    ) -> Result<()> {
        let record = self.get_mut(id)?;
        for (name, value) in updates {
            if let Some(cell) = record.fields.get_mut(name) {
                *cell = value.clone();
            }
        }
        // Multi-select style fields can be rewritten as joined strings, so
        // the re-validation pass covers every row, not just the edited one.
        self.recoerce_numeric();
        Ok(())
    }

    /// Set the review status of a record. Idempotent.
    pub fn set_status(&mut self, id: RecordId, status: ValidationStatus) -> Result<()> {
        let record = self.get_mut(id)?;
        record
            .fields
            .insert(STATUS_COLUMN.to_string(), status.as_cell().to_string());
        Ok(())
    }

    /// Blank out numeric cells that do not parse.
    fn recoerce_numeric(&mut self) {
        for record in &mut self.records {
            for column in &self.config.numeric_columns {
                if let Some(cell) = record.fields.get_mut(column) {
                    let trimmed = cell.trim();
                    if !trimmed.is_empty() && trimmed.parse::<f64>().is_err() {
                        cell.clear();
                    }
                }
            }
        }
    }

    /// Sorted distinct non-empty values of a field, for building filter
    /// options (e.g. the country multi-select).
    pub fn unique_values(&self, field: &str) -> Vec<String> {
        let mut values = BTreeSet::new();
        for record in &self.records {
            if let Some(value) = record.field(field) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    values.insert(trimmed.to_string());
                }
            }
        }
        values.into_iter().collect()
    }

    /// Count records by review status.
    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for record in &self.records {
            match record.status() {
                ValidationStatus::Unreviewed => counts.unreviewed += 1,
                ValidationStatus::Accepted => counts.accepted += 1,
                ValidationStatus::Rejected => counts.rejected += 1,
            }
        }
        counts
    }

    /// Count records that carry a usable location.
    pub fn located_count(&self) -> usize {
        self.records.iter().filter(|r| r.location().is_some()).count()
    }

    /// Basic statistics for each configured numeric column, over the given
    /// rows. Columns with no values are omitted.
    pub fn numeric_summary(&self, ids: &[RecordId]) -> Vec<ColumnSummary> {
        let mut summaries = Vec::new();
        for column in &self.config.numeric_columns {
            let values: Vec<f64> = ids
                .iter()
                .filter_map(|id| self.get(*id).ok())
                .filter_map(|r| r.numeric(column))
                .collect();
            if values.is_empty() {
                continue;
            }
            let count = values.len();
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let mean = values.iter().sum::<f64>() / count as f64;
            summaries.push(ColumnSummary {
                column: column.clone(),
                count,
                min,
                max,
                mean,
            });
        }
        summaries
    }

    /// Frequency of each non-empty value of a field, in first-seen order.
    pub fn value_counts(&self, field: &str) -> IndexMap<String, usize> {
        let mut counts = IndexMap::new();
        for record in &self.records {
            if let Some(value) = record.field(field) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    *counts.entry(trimmed.to_string()).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// All record ids in canonical order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(|r| r.id).collect()
    }

    /// Serialize the full table back to CSV, all columns round-tripping.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for record in &self.records {
            let row: Vec<&str> = self
                .headers
                .iter()
                .map(|h| record.field(h).unwrap_or(""))
                .collect();
            writer.write_record(&row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| SitevetError::Persistence(format!("CSV flush failed: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| SitevetError::Persistence(format!("CSV output not UTF-8: {}", e)))
    }
}
