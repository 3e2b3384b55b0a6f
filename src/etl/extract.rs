//! Extraction of delimited source files into tables

use crate::error::{EtlError, Result};
use crate::table::{CellValue, Column, ColumnType, Table};
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;

/// Recognized source file kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    Csv,
}

impl FromStr for SourceKind {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(SourceKind::Csv),
            _ => Err(EtlError::UnsupportedSource(s.to_string())),
        }
    }
}

/// Basic metadata about a source path
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileInfo {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Reads row-oriented source files into [`Table`]s
#[derive(Debug, Default)]
pub struct Extractor;

impl Extractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract a table from the given path
    ///
    /// # Errors
    /// [`EtlError::SourceNotFound`] when the path does not exist; read and
    /// parse failures are logged and propagated without a partial result.
    pub fn extract(&self, path: impl AsRef<Path>, kind: SourceKind) -> Result<Table> {
        let path = path.as_ref();
        if !self.file_exists(path) {
            return Err(EtlError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        match kind {
            SourceKind::Csv => self.extract_csv(path),
        }
    }

    fn extract_csv(&self, path: &Path) -> Result<Table> {
        log::info!("Extracting data from {}", path.display());

        let result = read_csv(path);
        match &result {
            Ok(table) => log::info!(
                "Successfully extracted {} rows from {}",
                table.row_count(),
                path.display()
            ),
            Err(err) => log::error!("Error extracting data from {}: {}", path.display(), err),
        }
        result
    }

    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().exists()
    }

    /// Metadata query; an absent path yields `exists: false`, never an error
    pub fn file_info(&self, path: impl AsRef<Path>) -> FileInfo {
        let path = path.as_ref();
        let Ok(metadata) = std::fs::metadata(path) else {
            return FileInfo::default();
        };
        FileInfo {
            exists: true,
            size_bytes: Some(metadata.len()),
            extension: path
                .extension()
                .and_then(|s| s.to_str())
                .map(str::to_string),
            name: path
                .file_name()
                .and_then(|s| s.to_str())
                .map(str::to_string),
        }
    }
}

fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (idx, field) in record.iter().enumerate() {
            raw_columns[idx].push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw_columns)
        .map(|(name, raw)| infer_column(name, raw))
        .collect();

    Table::from_columns(columns)
}

/// Type a raw string column: all-integer, else all-float, else text. Empty
/// fields become `Null` and do not participate in inference.
///
/// Inference and conversion are one pass per candidate type, so the values
/// in the typed column are exactly the ones that decided its type.
fn infer_column(name: String, raw: Vec<String>) -> Column {
    if let Some(values) = parse_column(&raw, |s| s.parse::<i64>().ok().map(CellValue::Int)) {
        return Column::new(name, ColumnType::Int, values);
    }
    if let Some(values) = parse_column(&raw, |s| s.parse::<f64>().ok().map(CellValue::Float)) {
        return Column::new(name, ColumnType::Float, values);
    }

    let values = raw
        .into_iter()
        .map(|field| {
            if field.trim().is_empty() {
                CellValue::Null
            } else {
                CellValue::Str(field)
            }
        })
        .collect();
    Column::new(name, ColumnType::Str, values)
}

/// Parse every present field with one parser, empty fields as `Null`.
/// `None` when any present field refuses, or when no field is present.
fn parse_column(
    raw: &[String],
    parse: impl Fn(&str) -> Option<CellValue>,
) -> Option<Vec<CellValue>> {
    let mut any_present = false;
    let values = raw
        .iter()
        .map(|field| {
            let trimmed = field.trim();
            if trimmed.is_empty() {
                return Some(CellValue::Null);
            }
            any_present = true;
            parse(trimmed)
        })
        .collect::<Option<Vec<_>>>()?;
    any_present.then_some(values)
}
