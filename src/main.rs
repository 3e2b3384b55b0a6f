use clap::{Parser, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use rowboat::etl::{FilterSpec, Pipeline, RunOptions};

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Rowboat: --{row}-> your tabular data from source file to destination file
#[derive(Parser)]
#[command(name = "rowboat", version, styles = STYLES)]
struct Cli {
    /// Path to the source data file
    source: String,

    /// Path for the output data file
    output: String,

    /// Kind of source to read (csv)
    #[arg(short, long, default_value = "csv")]
    source_type: String,

    /// Output format (csv | parquet | json)
    #[arg(short, long, default_value = "csv")]
    format: String,

    /// Pass the data through unchanged, skipping all transformations
    #[arg(long)]
    skip_transforms: bool,

    /// JSON filter specification, e.g. '{"quantity": {"min": 1}}'
    #[arg(long)]
    filter: Option<String>,

    /// More verbose logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    let filters = match &cli.filter {
        Some(raw) => Some(serde_json::from_str::<FilterSpec>(raw)?),
        None => None,
    };
    let options = RunOptions {
        source_kind: cli.source_type.parse()?,
        output_format: cli.format.parse()?,
        apply_transforms: !cli.skip_transforms,
        filters,
    };

    log::info!(
        "Rowing {} to {}",
        cli.source.bright_black(),
        cli.output.bright_black()
    );

    let mut pipeline = Pipeline::new();
    let result = pipeline.run_pipeline(&cli.source, &cli.output, &options);

    println!(
        "{}",
        serde_json::to_string_pretty(&pipeline.pipeline_summary())?
    );

    match result {
        Ok(()) => {
            log::info!("ETL pipeline completed {}", "successfully".green());
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
