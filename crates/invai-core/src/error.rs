//! Error types for the invai-core library.
//!
//! Every per-file error carries the name of the file it was raised for, so a
//! failure can be attributed without extra bookkeeping at the call site.

use thiserror::Error;

use crate::batch::BatchOutcome;

/// Coarse classification of a failure, independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileTooLarge,
    EmptyFile,
    UnsupportedType,
    FileRead,
    SpreadsheetParse,
    ExtractorUnavailable,
    Configuration,
    NoJsonFound,
    MalformedJson,
    NoValidData,
    InvalidField,
}

impl ErrorKind {
    /// Whether this kind of failure makes every other file in the batch
    /// pointless to attempt.
    pub fn is_batch_fatal(self) -> bool {
        matches!(self, ErrorKind::Configuration)
    }

    /// Whether the orchestrator may try the same file again.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::ExtractorUnavailable)
    }
}

/// Errors raised while turning a file into a transport payload.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// File is larger than the encoder accepts.
    #[error("file size {size} bytes exceeds maximum limit of {limit} bytes")]
    FileTooLarge { file: String, size: u64, limit: u64 },

    /// File has no content.
    #[error("file is empty")]
    EmptyFile { file: String },

    /// Neither the declared type nor the extension is supported.
    #[error("unsupported file type{}", describe_declared(.declared))]
    UnsupportedType {
        file: String,
        declared: Option<String>,
    },

    /// Reading the file content failed.
    #[error("failed to read file: {source}")]
    FileRead {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while flattening a spreadsheet.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// Workbook could not be opened or read.
    #[error("failed to convert spreadsheet: {reason}")]
    Parse { file: String, reason: String },
}

/// Errors raised by the extractor service client.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// No credential is available for the service.
    #[error("extractor is not configured: {0}")]
    Configuration(String),

    /// Transport or service failure.
    #[error("extractor unavailable: {reason}")]
    Unavailable { file: String, reason: String },
}

/// Errors raised while locating JSON in a raw response.
#[derive(Error, Debug)]
pub enum ResponseError {
    /// No JSON candidate in the response text.
    #[error("no valid JSON found in response")]
    NoJsonFound { file: String },

    /// Candidate text is not valid JSON.
    #[error("invalid JSON response from extractor: {reason}")]
    MalformedJson { file: String, reason: String },
}

/// Errors raised while validating extracted data.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// None of the known record keys produced a record.
    #[error("no valid data found in the extracted content")]
    NoValidData { file: String },

    /// A numeric field held a value that is not a number (strict mode only).
    #[error("{record}.{field} is not a number: {value}")]
    InvalidField {
        file: String,
        record: &'static str,
        field: &'static str,
        value: String,
    },
}

/// Any error that can fail a single file.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),

    #[error(transparent)]
    Extractor(#[from] ExtractorError),

    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PipelineError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Encode(e) => match e {
                EncodeError::FileTooLarge { .. } => ErrorKind::FileTooLarge,
                EncodeError::EmptyFile { .. } => ErrorKind::EmptyFile,
                EncodeError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
                EncodeError::FileRead { .. } => ErrorKind::FileRead,
            },
            PipelineError::Spreadsheet(_) => ErrorKind::SpreadsheetParse,
            PipelineError::Extractor(e) => match e {
                ExtractorError::Configuration(_) => ErrorKind::Configuration,
                ExtractorError::Unavailable { .. } => ErrorKind::ExtractorUnavailable,
            },
            PipelineError::Response(e) => match e {
                ResponseError::NoJsonFound { .. } => ErrorKind::NoJsonFound,
                ResponseError::MalformedJson { .. } => ErrorKind::MalformedJson,
            },
            PipelineError::Validation(e) => match e {
                ValidationError::NoValidData { .. } => ErrorKind::NoValidData,
                ValidationError::InvalidField { .. } => ErrorKind::InvalidField,
            },
        }
    }

    /// Name of the file the error was raised for, when known.
    pub fn file_name(&self) -> Option<&str> {
        let file = match self {
            PipelineError::Encode(
                EncodeError::FileTooLarge { file, .. }
                | EncodeError::EmptyFile { file }
                | EncodeError::UnsupportedType { file, .. }
                | EncodeError::FileRead { file, .. },
            ) => file,
            PipelineError::Spreadsheet(SpreadsheetError::Parse { file, .. }) => file,
            PipelineError::Extractor(ExtractorError::Unavailable { file, .. }) => file,
            PipelineError::Extractor(ExtractorError::Configuration(_)) => return None,
            PipelineError::Response(
                ResponseError::NoJsonFound { file } | ResponseError::MalformedJson { file, .. },
            ) => file,
            PipelineError::Validation(
                ValidationError::NoValidData { file } | ValidationError::InvalidField { file, .. },
            ) => file,
        };
        Some(file)
    }
}

/// Errors that reject a whole batch.
#[derive(Error, Debug)]
pub enum BatchError {
    /// One or more files exceed the intake limit; nothing was processed.
    #[error("files exceeding {} limit: {}", format_limit(.limit), .files.join(", "))]
    Oversized { files: Vec<String>, limit: u64 },

    /// The extractor cannot be used at all; nothing was processed.
    #[error("extractor is not configured: {0}")]
    Configuration(String),

    /// The extractor became unusable mid-batch. `partial` holds every
    /// window that ran, `not_attempted` the files left behind.
    #[error("extractor is not configured: {reason}")]
    Stopped {
        reason: String,
        partial: Box<BatchOutcome>,
        not_attempted: Vec<String>,
    },
}

fn describe_declared(declared: &Option<String>) -> String {
    declared
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

/// Render a byte limit the way users expect to read it ("10MB").
pub(crate) fn format_limit(limit: &u64) -> String {
    const MB: u64 = 1024 * 1024;
    let limit = *limit;
    if limit % MB == 0 {
        format!("{}MB", limit / MB)
    } else {
        format!("{limit} bytes")
    }
}
