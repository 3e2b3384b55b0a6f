//! Core ETL (Extract, Transform, Load) components
//!
//! This module provides the building blocks of the batch pipeline: an
//! extractor that reads delimited sources into tables, a transformer that
//! cleans and enriches them, a loader that writes them out in several
//! formats, and the pipeline that sequences the three.

mod extract;
mod filter;
mod load;
mod pipeline;
mod transform;

pub use extract::{Extractor, FileInfo, SourceKind};
pub use filter::{FilterCriterion, FilterSpec};
pub use load::{
    create_summary, DataSummary, LoadRecord, LoadStatus, LoadSummary, Loader, OutputFormat,
};
pub use pipeline::{
    run_etl, ExtractSummary, LoadPhaseSummary, Pipeline, PipelineSummary, RunOptions,
    TransformSummary,
};
pub use transform::{apply_business_rules, normalise_column_names, Transformer};
