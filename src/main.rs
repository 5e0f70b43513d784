use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use psg_labeler::utils::logging::log_operation_start;
use psg_labeler::{
    LabelingConfig, PreprocessConfig, PsgDataset, TableFormat, label_dataset, preprocess,
    read_table, save_cohorts, write_table,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Label a PSG table and write one table per cohort
    Label {
        /// Input table (.csv, .parquet or .pq)
        #[arg(long)]
        input: PathBuf,
        /// Directory the cohort tables are written to
        #[arg(long)]
        output_dir: PathBuf,
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output table format
        #[arg(long)]
        format: Option<TableFormat>,
        /// Also write the per-criterion pOSA subsets
        #[arg(long)]
        posa_subsets: bool,
        /// Let families with absent columns produce empty cohorts
        #[arg(long)]
        no_validate: bool,
        /// Write labeling_summary.json
        #[arg(long)]
        summary: bool,
    },
    /// Clean a raw PSG export
    Preprocess {
        /// Raw export (.csv, .parquet or .pq)
        #[arg(long)]
        input: PathBuf,
        /// Cleaned table; format follows the extension
        #[arg(long)]
        output: PathBuf,
        /// JSON preprocessing configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Label {
            input,
            output_dir,
            config,
            format,
            posa_subsets,
            no_validate,
            summary,
        } => load_config(config.as_deref()).and_then(|mut config| {
            if let Some(format) = format {
                config.output_format = format;
            }
            config.write_posa_subsets |= posa_subsets;
            config.write_summary |= summary;
            if no_validate {
                config.validate_schema = false;
            }
            label(&input, &output_dir, &config)
        }),
        Commands::Preprocess {
            input,
            output,
            config,
        } => clean(&input, &output, config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<LabelingConfig> {
    match path {
        Some(path) => LabelingConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => Ok(LabelingConfig::default()),
    }
}

fn label(input: &Path, output_dir: &Path, config: &LabelingConfig) -> Result<()> {
    let start = Instant::now();
    info!("{config}");

    let dataset = PsgDataset::load(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let run = label_dataset(&dataset, config).context("Labeling failed")?;
    let written = save_cohorts(&run, output_dir, config)
        .with_context(|| format!("Failed to write cohorts to {}", output_dir.display()))?;

    println!("{}", run.summary().render());
    info!(
        "Wrote {} files to {} in {:?}",
        written.len(),
        output_dir.display(),
        start.elapsed()
    );

    if run.all_failed() {
        anyhow::bail!("Every rule family failed, no cohorts were written");
    }
    Ok(())
}

fn clean(input: &Path, output: &Path, config: Option<&Path>) -> Result<()> {
    let config = match config {
        Some(path) => PreprocessConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => PreprocessConfig::default(),
    };
    info!("{config}");

    let raw = read_table(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let outcome = preprocess(&raw, &config)?;

    log_operation_start("Saving cleaned data to", output);
    let format = TableFormat::from_path(output)?;
    write_table(&outcome.batch, output, format)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}
