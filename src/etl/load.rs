//! Loading tables to output files
//!
//! One writer per output format (CSV, Parquet, JSON), a format-dispatching
//! [`Loader::save`], and the descriptive [`create_summary`] document written
//! alongside the primary output.

use crate::error::{EtlError, Result};
use crate::table::{stats, CellValue, ColumnType, NumericSummary, Table};
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Recognized output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
    Json,
}

impl OutputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            "json" => Ok(OutputFormat::Json),
            _ => Err(EtlError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Outcome of one load operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Success,
    Failed,
}

/// Per-path entry in the load summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadRecord {
    pub status: LoadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoadRecord {
    fn success(table: &Table, format: OutputFormat) -> Self {
        Self {
            status: LoadStatus::Success,
            rows: Some(table.row_count()),
            columns: Some(table.column_count()),
            format: Some(format.name()),
            error: None,
        }
    }

    fn failed(err: &EtlError) -> Self {
        Self {
            status: LoadStatus::Failed,
            rows: None,
            columns: None,
            format: None,
            error: Some(err.to_string()),
        }
    }
}

pub type LoadSummary = BTreeMap<String, LoadRecord>;

/// Writes tables to output files and keeps a cumulative per-path summary
#[derive(Debug, Default)]
pub struct Loader {
    load_summary: LoadSummary,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_csv(&mut self, table: &Table, path: impl AsRef<Path>) -> Result<()> {
        self.write(table, path.as_ref(), OutputFormat::Csv)
    }

    pub fn to_parquet(&mut self, table: &Table, path: impl AsRef<Path>) -> Result<()> {
        self.write(table, path.as_ref(), OutputFormat::Parquet)
    }

    pub fn to_json(&mut self, table: &Table, path: impl AsRef<Path>) -> Result<()> {
        self.write(table, path.as_ref(), OutputFormat::Json)
    }

    /// Validate the destination and dispatch to the matching writer
    ///
    /// # Errors
    /// [`EtlError::InvalidOutputPath`] when neither the parent directory nor
    /// its own parent exists; write failures come back as the underlying
    /// error after being recorded in the load summary.
    pub fn save(&mut self, table: &Table, path: impl AsRef<Path>, format: OutputFormat) -> Result<()> {
        let path = path.as_ref();
        if !self.validate_output_path(path) {
            log::error!("Invalid output path: {}", path.display());
            return Err(EtlError::InvalidOutputPath {
                path: path.to_path_buf(),
            });
        }
        self.write(table, path, format)
    }

    /// The destination is usable when its parent directory exists or is one
    /// `create_dir_all` away (the parent's parent exists)
    pub fn validate_output_path(&self, path: impl AsRef<Path>) -> bool {
        fn dir_exists(dir: &Path) -> bool {
            // an empty parent means the current directory
            dir.as_os_str().is_empty() || dir.exists()
        }

        path.as_ref()
            .parent()
            .is_some_and(|parent| dir_exists(parent) || parent.parent().is_some_and(dir_exists))
    }

    /// Cumulative summary of all load operations, as an independent copy
    pub fn load_summary(&self) -> LoadSummary {
        self.load_summary.clone()
    }

    fn write(&mut self, table: &Table, path: &Path, format: OutputFormat) -> Result<()> {
        log::info!("Loading {} rows to {}", table.row_count(), path.display());

        let result = match format {
            OutputFormat::Csv => write_csv(table, path),
            OutputFormat::Parquet => write_parquet(table, path),
            OutputFormat::Json => write_json(table, path),
        };

        let key = path.display().to_string();
        match result {
            Ok(()) => {
                self.load_summary
                    .insert(key, LoadRecord::success(table, format));
                log::info!("Successfully loaded data to {}", path.display());
                Ok(())
            }
            Err(err) => {
                log::error!("Error loading data to {}: {}", path.display(), err);
                self.load_summary.insert(key, LoadRecord::failed(&err));
                Err(err)
            }
        }
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn write_csv(table: &Table, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.column_names())?;
    for idx in 0..table.row_count() {
        let record: Vec<String> = table.row(idx).iter().map(|v| v.to_string()).collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(table: &Table, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(&table.row_objects())?;
    std::fs::write(path, json)?;
    Ok(())
}

fn write_parquet(table: &Table, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let batch = to_record_batch(table)?;
    let file = std::fs::File::create(path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();

    let mut fields = Vec::with_capacity(table.column_count());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.column_count());

    for column in table.columns() {
        let (data_type, array): (DataType, ArrayRef) = match column.ty() {
            ColumnType::Int => {
                // straight from the cell; going through f64 would round
                // values above 2^53
                let values: Vec<Option<i64>> = column
                    .values()
                    .iter()
                    .map(|v| match v {
                        CellValue::Int(i) => Some(*i),
                        _ => None,
                    })
                    .collect();
                (DataType::Int64, Arc::new(Int64Array::from(values)))
            }
            ColumnType::Float => {
                let values: Vec<Option<f64>> =
                    column.values().iter().map(CellValue::as_f64).collect();
                (DataType::Float64, Arc::new(Float64Array::from(values)))
            }
            ColumnType::Str => {
                let values: Vec<Option<String>> = column
                    .values()
                    .iter()
                    .map(|v| (!v.is_null()).then(|| v.to_string()))
                    .collect();
                (DataType::Utf8, Arc::new(StringArray::from(values)))
            }
            ColumnType::Date => {
                let values: Vec<Option<i32>> = column
                    .values()
                    .iter()
                    .map(|v| match v {
                        CellValue::Date(d) => {
                            Some(d.signed_duration_since(epoch).num_days() as i32)
                        }
                        _ => None,
                    })
                    .collect();
                (DataType::Date32, Arc::new(Date32Array::from(values)))
            }
        };
        fields.push(Field::new(column.name(), data_type, true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// Format-independent descriptive document for a processed table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub total_rows: usize,
    pub total_columns: usize,
    pub column_names: Vec<String>,
    pub data_types: BTreeMap<String, &'static str>,
    pub missing_values: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub numeric_summary: BTreeMap<String, NumericSummary>,
}

impl DataSummary {
    pub fn new(table: &Table) -> Self {
        let mut data_types = BTreeMap::new();
        let mut missing_values = BTreeMap::new();
        let mut numeric_summary = BTreeMap::new();

        for column in table.columns() {
            data_types.insert(column.name().to_string(), column.ty().name());
            missing_values.insert(column.name().to_string(), column.null_count());
            if column.ty().is_numeric() {
                if let Some(summary) = stats::describe(&column.numeric_values()) {
                    numeric_summary.insert(column.name().to_string(), summary);
                }
            }
        }

        Self {
            total_rows: table.row_count(),
            total_columns: table.column_count(),
            column_names: table.column_names().iter().map(|s| s.to_string()).collect(),
            data_types,
            missing_values,
            numeric_summary,
        }
    }
}

/// Write the descriptive JSON summary for a table
///
/// Failures are logged and returned as errors, never panicked.
pub fn create_summary(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let result = (|| -> Result<()> {
        let summary = DataSummary::new(table);
        ensure_parent_dir(path)?;
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
        Ok(())
    })();

    match &result {
        Ok(()) => log::info!("Data summary saved to {}", path.display()),
        Err(err) => log::error!("Error creating data summary: {}", err),
    }
    result
}
