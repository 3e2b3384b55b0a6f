//! Error taxonomy for the ETL pipeline
//!
//! Every fallible operation in the crate returns [`Result`], so callers can
//! match on the failure cause instead of parsing log text.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("source file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("unsupported source type: {0}")]
    UnsupportedSource(String),

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid output path: {}", path.display())]
    InvalidOutputPath { path: PathBuf },

    #[error("cannot parse {value:?} in column {column:?} as a date")]
    DateParse { column: String, value: String },

    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("column {column:?} has {actual} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
