//! Batch processing command for multiple documents.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::debug;

use invai_core::{BatchError, BatchOutcome, InputFile, ProgressEvent, ProgressObserver};

use super::output::{format_records, write_records, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Files processed concurrently (overrides batch.window_size)
    #[arg(short = 'j', long)]
    window_size: Option<usize>,

    /// Extra attempts for files whose extractor call failed
    #[arg(long)]
    retries: Option<u32>,

    /// Include every supported document type, not only PDF, images and Excel
    #[arg(long)]
    all_types: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if let Some(window_size) = args.window_size {
        config.batch.window_size = window_size;
    }
    if let Some(retries) = args.retries {
        config.batch.retry_attempts = retries;
    }

    let paths = expand_inputs(&args.inputs)?;

    let mut files = Vec::with_capacity(paths.len());
    let mut skipped = 0;
    for path in &paths {
        let file = InputFile::from_path(path).await?;
        if config.intake.accepted_only && !args.all_types && !file.is_accepted() {
            debug!("Skipping {}: not a PDF, image or Excel file", path.display());
            skipped += 1;
            continue;
        }
        files.push(file);
    }

    if files.is_empty() {
        anyhow::bail!("No matching files found for: {}", args.inputs.join(" "));
    }
    disambiguate_names(&mut files);

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );
    if skipped > 0 {
        println!(
            "{} Skipped {} unsupported file(s)",
            style("ℹ").blue(),
            skipped
        );
    }

    let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
    let processor = super::build_processor(&config)?;
    let progress = ConsoleProgress::new(files.len() as u64)?;

    let (outcome, stopped) = match processor.process(files, &progress).await {
        Ok(outcome) => (outcome, None),
        Err(BatchError::Stopped {
            reason,
            partial,
            not_attempted,
        }) => {
            progress.overall.abandon_with_message("Stopped");
            (*partial, Some((reason, not_attempted)))
        }
        Err(e) => return Err(e.into()),
    };

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        if let Some(parent) = summary_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_summary(&summary_path, &names, &outcome)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let summary = outcome.summary();
    let failures: Vec<(String, String)> = outcome
        .failures
        .iter()
        .map(|f| (f.file_name.clone(), f.error.to_string()))
        .collect();

    if !outcome.batch.is_empty() {
        match &args.output_dir {
            Some(dir) => {
                for path in write_records(outcome.batch, args.format, dir)? {
                    println!("{} Wrote {}", style("✓").green(), path.display());
                }
            }
            None => println!("{}", format_records(outcome.batch, args.format)?),
        }
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        summary.processed,
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(summary.succeeded).green(),
        style(summary.failed).red()
    );
    println!(
        "   {} invoice(s), {} product(s), {} customer(s)",
        summary.invoices, summary.products, summary.customers
    );

    if !failures.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for (file, error) in &failures {
            println!("  - {}: {}", file, error);
        }
    }

    if let Some((reason, not_attempted)) = stopped {
        if !not_attempted.is_empty() {
            println!();
            println!("{}", style("Not attempted:").yellow());
            for file in &not_attempted {
                println!("  - {}", file);
            }
        }
        anyhow::bail!("Batch stopped, extractor is not configured: {}", reason);
    }

    Ok(())
}

/// Expand glob patterns into regular files, dropping duplicates.
fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for pattern in inputs {
        for path in glob(pattern)?.filter_map(|r| r.ok()) {
            if path.is_file() && seen.insert(path.clone()) {
                paths.push(path);
            }
        }
    }

    Ok(paths)
}

/// Replace bare file names shared by several inputs with their full path.
fn disambiguate_names(files: &mut [InputFile]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for file in files.iter() {
        *counts.entry(file.name.clone()).or_default() += 1;
    }

    for file in files.iter_mut() {
        if counts.get(&file.name).copied().unwrap_or_default() < 2 {
            continue;
        }
        if let Some(path) = file.path().map(|p| p.display().to_string()) {
            file.name = path;
        }
    }
}

fn write_summary(path: &Path, names: &[String], outcome: &BatchOutcome) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "invoices",
        "products",
        "customers",
        "error_kind",
        "error",
    ])?;

    let succeeded: HashMap<&str, _> = outcome
        .succeeded
        .iter()
        .map(|s| (s.file_name.as_str(), s))
        .collect();

    for name in names {
        if let Some(success) = succeeded.get(name.as_str()) {
            wtr.write_record([
                name.as_str(),
                "success",
                &success.invoices.to_string(),
                &success.products.to_string(),
                &success.customers.to_string(),
                "",
                "",
            ])?;
        } else if let Some(failure) = outcome.failure_for(name) {
            wtr.write_record([
                name.as_str(),
                "error",
                "0",
                "0",
                "0",
                &format!("{:?}", failure.kind()),
                &failure.error.to_string(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Overall bar plus one spinner per file in the processing set.
struct ConsoleProgress {
    multi: MultiProgress,
    overall: ProgressBar,
    spinner_style: ProgressStyle,
    spinners: Mutex<HashMap<String, ProgressBar>>,
}

impl ConsoleProgress {
    fn new(total: u64) -> anyhow::Result<Self> {
        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total));
        overall.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
                .progress_chars("=>-"),
        );

        Ok(Self {
            multi,
            overall,
            spinner_style: ProgressStyle::default_spinner().template("  {spinner:.blue} {msg}")?,
            spinners: Mutex::new(HashMap::new()),
        })
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_event(&self, event: &ProgressEvent) {
        let mut spinners = self.spinners.lock().unwrap_or_else(|p| p.into_inner());

        match event {
            ProgressEvent::BatchStarted { .. } => {}
            ProgressEvent::WindowStarted { files, .. } => {
                for file in files {
                    let spinner = self
                        .multi
                        .insert_before(&self.overall, ProgressBar::new_spinner());
                    spinner.set_style(self.spinner_style.clone());
                    spinner.set_message(file.clone());
                    spinner.enable_steady_tick(Duration::from_millis(100));
                    spinners.insert(file.clone(), spinner);
                }
            }
            ProgressEvent::FileFinished { file, succeeded } => {
                if let Some(spinner) = spinners.remove(file) {
                    spinner.finish_and_clear();
                }
                let mark = if *succeeded {
                    style("✓").green()
                } else {
                    style("✗").red()
                };
                let _ = self.multi.println(format!("{} {}", mark, file));
                self.overall.inc(1);
            }
            ProgressEvent::BatchFinished { .. } => {
                self.overall.finish_with_message("Complete");
            }
        }
    }
}
