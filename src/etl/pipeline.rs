//! Pipeline orchestration for ETL runs
//!
//! Sequences Extract → Transform → Load over fresh component instances and
//! accumulates a structured run summary. Phase failures are logged, recorded
//! in the summary, and returned as tagged errors; `run_etl` flattens that to
//! a boolean for one-call use.

use crate::error::Result;
use crate::etl::extract::{Extractor, SourceKind};
use crate::etl::filter::FilterSpec;
use crate::etl::load::{create_summary, LoadStatus, Loader, OutputFormat};
use crate::etl::transform::{apply_business_rules, normalise_column_names, Transformer};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Extract-phase metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractSummary {
    pub source_path: String,
    pub rows_extracted: usize,
    pub columns_extracted: usize,
}

/// Transform-phase metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformSummary {
    pub transformations_applied: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_columns: Option<usize>,
}

/// Load-phase metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadPhaseSummary {
    pub status: LoadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_rows: Option<usize>,
}

/// Structured summary of one pipeline run, built phase by phase
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract: Option<ExtractSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadPhaseSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-run configuration
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source_kind: SourceKind,
    pub output_format: OutputFormat,
    pub apply_transforms: bool,
    pub filters: Option<FilterSpec>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            source_kind: SourceKind::Csv,
            output_format: OutputFormat::Csv,
            apply_transforms: true,
            filters: None,
        }
    }
}

/// Orchestrates one Extract → Transform → Load run
///
/// Each instance owns fresh components and an empty summary; summaries are
/// never merged across runs.
#[derive(Debug, Default)]
pub struct Pipeline {
    extractor: Extractor,
    transformer: Transformer,
    loader: Loader,
    summary: PipelineSummary,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the complete ETL pipeline
    ///
    /// Phases run unconditionally in order with no retry and no rollback.
    /// Any failure aborts the run, lands under the summary's `error` key,
    /// and comes back as the tagged cause.
    pub fn run_pipeline(
        &mut self,
        source: impl AsRef<Path>,
        output: impl AsRef<Path>,
        options: &RunOptions,
    ) -> Result<()> {
        log::info!("Starting ETL pipeline");

        let result = self.execute(source.as_ref(), output.as_ref(), options);
        if let Err(err) = &result {
            log::error!("ETL pipeline failed: {}", err);
            self.summary.error = Some(err.to_string());
        }
        result
    }

    fn execute(&mut self, source: &Path, output: &Path, options: &RunOptions) -> Result<()> {
        log::info!("Phase 1: Extract");
        let table = self.extractor.extract(source, options.source_kind)?;
        self.summary.extract = Some(ExtractSummary {
            source_path: source.display().to_string(),
            rows_extracted: table.row_count(),
            columns_extracted: table.column_count(),
        });

        log::info!("Phase 2: Transform");
        let table = if options.apply_transforms {
            let table = normalise_column_names(&table)?;
            let table = apply_business_rules(&table)?;
            let table = match &options.filters {
                Some(spec) => self.transformer.filter(&table, spec),
                None => table,
            };
            self.summary.transform = Some(TransformSummary {
                transformations_applied: self.transformer.transformation_log(),
                final_rows: Some(table.row_count()),
                final_columns: Some(table.column_count()),
            });
            table
        } else {
            self.summary.transform = Some(TransformSummary {
                transformations_applied: vec!["None - transformations skipped".to_string()],
                final_rows: None,
                final_columns: None,
            });
            table
        };

        log::info!("Phase 3: Load");
        match self.loader.save(&table, output, options.output_format) {
            Ok(()) => {
                let summary_path = summary_path_for(output, options.output_format);
                // the data summary is best-effort; the load already succeeded
                if let Err(err) = create_summary(&table, &summary_path) {
                    log::warn!("Continuing without data summary: {}", err);
                }
                self.summary.load = Some(LoadPhaseSummary {
                    status: LoadStatus::Success,
                    output_path: Some(output.display().to_string()),
                    summary_path: Some(summary_path.display().to_string()),
                    final_rows: Some(table.row_count()),
                });
                log::info!("ETL pipeline completed successfully");
                Ok(())
            }
            Err(err) => {
                self.summary.load = Some(LoadPhaseSummary {
                    status: LoadStatus::Failed,
                    output_path: None,
                    summary_path: None,
                    final_rows: None,
                });
                log::error!("ETL pipeline failed during load phase");
                Err(err)
            }
        }
    }

    /// The run summary so far, as an independent copy
    pub fn pipeline_summary(&self) -> PipelineSummary {
        self.summary.clone()
    }
}

/// Derive the summary-file path by swapping the format suffix for
/// `_summary.json`
fn summary_path_for(output: &Path, format: OutputFormat) -> PathBuf {
    let name = output.display().to_string();
    let suffix = format!(".{}", format.name());
    match name.strip_suffix(&suffix) {
        Some(stem) => PathBuf::from(format!("{}_summary.json", stem)),
        None => PathBuf::from(format!("{}_summary.json", name)),
    }
}

/// One-call convenience: run a fresh pipeline and report success as a boolean
pub fn run_etl(source: impl AsRef<Path>, output: impl AsRef<Path>, options: &RunOptions) -> bool {
    Pipeline::new()
        .run_pipeline(source, output, options)
        .is_ok()
}
