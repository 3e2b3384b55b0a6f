//! Rowboat
//!
//! A batch ETL pipeline for tabular data files: extract a delimited source
//! into an in-memory table, clean and enrich it, and load it to CSV,
//! Parquet, or JSON alongside a descriptive summary.

pub mod error;
pub mod etl;
pub mod table;

// Re-exports for convenience
pub use error::{EtlError, Result};
pub use etl::{
    run_etl, Extractor, FilterCriterion, FilterSpec, Loader, OutputFormat, Pipeline, RunOptions,
    SourceKind, Transformer,
};
pub use table::{CellValue, Column, ColumnType, Table};
