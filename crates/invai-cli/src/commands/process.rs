//! Process command - extract records from a single document.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use invai_core::{ExtractedBatch, InputFile};

use super::output::{format_records, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, image, spreadsheet or text document)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Content type to use instead of guessing from the extension
    #[arg(long)]
    mime_type: Option<String>,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let mut file = InputFile::from_path(&args.input).await?;
    if let Some(mime_type) = &args.mime_type {
        file = file.with_declared_type(mime_type);
    }

    let processor = super::build_processor(&config)?;
    processor.check_intake(std::slice::from_ref(&file))?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Extracting {}", file.name));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = processor.process_one(&file).await;
    pb.finish_and_clear();

    let extraction = result.map_err(|e| anyhow::anyhow!("{}: {}", file.name, e))?;
    let incomplete = extraction.invoices.iter().filter(|i| !i.is_complete()).count();
    let records = extraction.len();

    let mut batch = ExtractedBatch::new();
    batch.extend(extraction);
    let output = format_records(batch, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if incomplete > 0 {
        eprintln!(
            "{} {} invoice(s) are missing required fields",
            style("⚠").yellow(),
            incomplete
        );
    }

    eprintln!(
        "{} Extracted {} record(s) in {:?}",
        style("ℹ").blue(),
        records,
        start.elapsed()
    );

    Ok(())
}
