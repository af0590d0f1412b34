//! Windowed batch orchestration.

use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::progress::{ProgressEvent, ProgressObserver};
use crate::encode::{EncodedPayload, Encoder};
use crate::error::{BatchError, ErrorKind, ExtractorError, PipelineError};
use crate::extract::{parse_response, DocumentExtractor, EXTRACTION_PROMPT, PROMPT_VERSION};
use crate::input::InputFile;
use crate::models::config::{BatchConfig, IntakeConfig, InvaiConfig};
use crate::models::records::{ExtractedBatch, Extraction};
use crate::validate::SchemaValidator;

/// A file that produced no records, with the reason.
#[derive(Debug)]
pub struct FileFailure {
    pub file_name: String,
    pub error: PipelineError,
}

impl FileFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Record counts for a file that succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSuccess {
    pub file_name: String,
    pub invoices: usize,
    pub products: usize,
    pub customers: usize,
}

impl FileSuccess {
    fn new(file_name: &str, extraction: &Extraction) -> Self {
        Self {
            file_name: file_name.to_string(),
            invoices: extraction.invoices.len(),
            products: extraction.products.len(),
            customers: extraction.customers.len(),
        }
    }
}

/// Everything a batch produced.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Records from every successful file, in input order.
    pub batch: ExtractedBatch,
    /// Successful files, in input order.
    pub succeeded: Vec<FileSuccess>,
    /// Failed files, in input order.
    pub failures: Vec<FileFailure>,
}

/// Counts describing a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub invoices: usize,
    pub products: usize,
    pub customers: usize,
}

impl BatchOutcome {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            processed: self.succeeded.len() + self.failures.len(),
            succeeded: self.succeeded.len(),
            failed: self.failures.len(),
            invoices: self.batch.invoices.len(),
            products: self.batch.products.len(),
            customers: self.batch.customers.len(),
        }
    }

    /// Failure recorded for a file, if it failed.
    pub fn failure_for(&self, file_name: &str) -> Option<&FileFailure> {
        self.failures.iter().find(|f| f.file_name == file_name)
    }

    fn record(&mut self, file_name: &str, result: Result<Extraction, PipelineError>) {
        match result {
            Ok(extraction) => {
                self.succeeded.push(FileSuccess::new(file_name, &extraction));
                self.batch.extend(extraction);
            }
            Err(error) => self.failures.push(FileFailure {
                file_name: file_name.to_string(),
                error,
            }),
        }
    }
}

/// Runs files through encode, extract, parse and validate.
pub struct BatchProcessor {
    extractor: Box<dyn DocumentExtractor>,
    encoder: Encoder,
    validator: SchemaValidator,
    intake: IntakeConfig,
    batch: BatchConfig,
}

impl BatchProcessor {
    pub fn new(extractor: Box<dyn DocumentExtractor>, config: &InvaiConfig) -> Self {
        Self {
            extractor,
            encoder: Encoder::from_config(&config.encoder),
            validator: SchemaValidator::from_config(&config.validation),
            intake: config.intake.clone(),
            batch: config.batch.clone(),
        }
    }

    /// Reject the batch if any file exceeds the intake size limit.
    pub fn check_intake(&self, files: &[InputFile]) -> Result<(), BatchError> {
        let oversized: Vec<String> = files
            .iter()
            .filter(|f| f.size > self.intake.max_file_size)
            .map(|f| f.name.clone())
            .collect();

        if oversized.is_empty() {
            return Ok(());
        }

        warn!("Rejecting batch, {} oversized file(s)", oversized.len());
        Err(BatchError::Oversized {
            files: oversized,
            limit: self.intake.max_file_size,
        })
    }

    /// Process a batch in sequential windows of concurrently handled files.
    ///
    /// Per-file errors become [`FileFailure`]s. The batch itself fails only
    /// on intake rejection or a configuration problem with the extractor. A
    /// configuration problem seen mid-batch ends the batch after its window
    /// and returns [`BatchError::Stopped`] carrying the windows that ran.
    pub async fn process(
        &self,
        files: Vec<InputFile>,
        progress: &dyn ProgressObserver,
    ) -> Result<BatchOutcome, BatchError> {
        self.check_intake(&files)?;
        self.extractor.preflight().map_err(configuration)?;

        let window_size = self.batch.window_size.max(1);
        info!(
            "Processing {} file(s) with {} in windows of {}",
            files.len(),
            self.extractor.name(),
            window_size
        );
        progress.on_event(&ProgressEvent::BatchStarted { total: files.len() });

        let mut outcome = BatchOutcome::default();

        for (index, window) in files.chunks(window_size).enumerate() {
            let names: Vec<String> = window.iter().map(|f| f.name.clone()).collect();
            debug!("Window {}: {}", index + 1, names.join(", "));
            progress.on_event(&ProgressEvent::WindowStarted {
                index,
                files: names,
            });

            let results = join_all(window.iter().map(|file| async move {
                let result = self.run_file(file).await;
                progress.on_event(&ProgressEvent::FileFinished {
                    file: file.name.clone(),
                    succeeded: result.is_ok(),
                });
                (file, result)
            }))
            .await;

            let mut fatal = None;
            for (file, result) in results {
                if let Err(error) = &result {
                    warn!("{} failed: {}", file.name, error);
                    if error.kind().is_batch_fatal() && fatal.is_none() {
                        fatal = Some(fatal_message(error));
                    }
                }
                outcome.record(&file.name, result);
            }

            if let Some(reason) = fatal {
                let not_attempted: Vec<String> = files
                    .iter()
                    .skip((index + 1) * window_size)
                    .map(|f| f.name.clone())
                    .collect();
                warn!(
                    "Stopping batch after window {}: {} ({} file(s) not attempted)",
                    index + 1,
                    reason,
                    not_attempted.len()
                );
                return Err(BatchError::Stopped {
                    reason,
                    partial: Box::new(outcome),
                    not_attempted,
                });
            }
        }

        let summary = outcome.summary();
        info!(
            "Batch finished: {} succeeded, {} failed, {} record(s)",
            summary.succeeded,
            summary.failed,
            outcome.batch.len()
        );
        progress.on_event(&ProgressEvent::BatchFinished {
            succeeded: summary.succeeded,
            failed: summary.failed,
        });

        Ok(outcome)
    }

    /// Run the pipeline for a single file.
    pub async fn process_one(&self, file: &InputFile) -> Result<Extraction, PipelineError> {
        self.extractor.preflight()?;
        self.run_file(file).await
    }

    async fn run_file(&self, file: &InputFile) -> Result<Extraction, PipelineError> {
        let payload = self.encoder.encode(file).await?;
        let text = self.extract_with_retry(&file.name, &payload).await?;
        let value = parse_response(&text, &file.name)?;
        let extraction = self.validator.validate(&value, &file.name)?;
        Ok(extraction)
    }

    async fn extract_with_retry(
        &self,
        file_name: &str,
        payload: &EncodedPayload,
    ) -> Result<String, PipelineError> {
        debug!(
            "Extracting {} ({}, {} base64 chars) with prompt {}",
            file_name,
            payload.mime_type,
            payload.data.len(),
            PROMPT_VERSION
        );

        let mut attempt = 0;
        loop {
            let error = match self
                .extractor
                .extract(file_name, payload, EXTRACTION_PROMPT)
                .await
            {
                Ok(text) => return Ok(text),
                Err(e) => PipelineError::from(e),
            };

            if !error.kind().is_retryable() || attempt >= self.batch.retry_attempts {
                return Err(error);
            }

            attempt += 1;
            warn!(
                "{}: {}, retrying ({}/{})",
                file_name, error, attempt, self.batch.retry_attempts
            );
            if self.batch.retry_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.batch.retry_delay_ms)).await;
            }
        }
    }
}

fn configuration(error: ExtractorError) -> BatchError {
    match error {
        ExtractorError::Configuration(message) => BatchError::Configuration(message),
        other => BatchError::Configuration(other.to_string()),
    }
}

fn fatal_message(error: &PipelineError) -> String {
    match error {
        PipelineError::Extractor(ExtractorError::Configuration(message)) => message.clone(),
        other => other.to_string(),
    }
}
