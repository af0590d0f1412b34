//! Core library for AI-assisted business document extraction.
//!
//! This crate provides:
//! - File intake and payload encoding (base64, spreadsheets flattened to CSV)
//! - An extractor client for the Gemini document-understanding API
//! - Tolerant parsing of the JSON carried by free-form model responses
//! - Schema validation into invoice, product and customer records
//! - Windowed batch orchestration with per-file failure isolation

pub mod batch;
pub mod encode;
pub mod error;
pub mod extract;
pub mod input;
pub mod models;
pub mod validate;

pub use batch::{
    BatchOutcome, BatchProcessor, BatchSummary, FileFailure, NoProgress, ProgressEvent,
    ProgressObserver,
};
pub use encode::{DocumentKind, EncodedPayload, Encoder};
pub use error::{
    BatchError, EncodeError, ErrorKind, ExtractorError, PipelineError, ResponseError,
    SpreadsheetError, ValidationError,
};
pub use extract::{parse_response, DocumentExtractor, GeminiClient, EXTRACTION_PROMPT};
pub use input::InputFile;
pub use models::{
    Customer, ExtractedBatch, Extraction, InvaiConfig, Invoice, InvoiceStatus, Product,
    RecordSink,
};
pub use validate::SchemaValidator;
