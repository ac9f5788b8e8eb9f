mod emit;
mod error;
mod job;
mod label;
mod loader;
mod pipeline;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pipeline::RowMode;
use settings::Settings;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "zonal_batch",
    about = "Generate a GDAL zonal statistics batch file from a CSV of raster paths"
)]
struct Cli {
    /// CSV of raster paths (default: input_rasters.csv)
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Batch JSON to write (default: output2.json)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Settings file; without it an optional ./zonal_batch.* is used
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Skip rasters whose name lacks a two-part label instead of failing
    #[arg(long)]
    skip_unlabeled: bool,
    /// Read raster paths from every CSV row, not only the first
    #[arg(long)]
    all_rows: bool,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())
        .context("Failed to load settings")?;
    if let Some(input) = cli.input {
        settings.input_csv = input;
    }
    if let Some(output) = cli.output {
        settings.output_json = output;
    }
    if cli.skip_unlabeled {
        settings.skip_unlabeled = true;
    }
    info!(settings_loaded = ?settings, msg = "Starting zonal batch generator");

    let mode = if cli.all_rows {
        RowMode::AllRecords
    } else {
        RowMode::FirstRecord
    };
    let summary = pipeline::run(&settings, mode)
        .with_context(|| format!("Failed to build batch from {:?}", settings.input_csv))?;

    println!(
        "{} rasters -> {} jobs in {:?}",
        summary.rasters,
        summary.jobs,
        settings.output_json
    );
    if !summary.skipped.is_empty() {
        println!("Skipped {} unlabeled:", summary.skipped.len());
        for raster in &summary.skipped {
            println!("  {}", raster);
        }
    }
    Ok(())
}
