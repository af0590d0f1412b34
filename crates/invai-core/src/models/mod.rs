//! Data models: canonical records and configuration.

pub mod config;
pub mod records;

pub use config::InvaiConfig;
pub use records::{
    Customer, ExtractedBatch, Extraction, Invoice, InvoiceStatus, Product, RecordSink,
    INVOICE_REQUIRED_FIELDS,
};
