//! Canonical record types produced by the schema validator.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields an invoice must carry to be considered complete, in reporting order.
pub const INVOICE_REQUIRED_FIELDS: [&str; 6] = [
    "serialNumber",
    "customerName",
    "productName",
    "quantity",
    "tax",
    "totalAmount",
];

/// An invoice extracted from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Unique record identifier.
    pub id: Uuid,

    /// Invoice serial number as printed on the document.
    pub serial_number: String,

    /// Name of the billed customer.
    pub customer_name: String,

    /// Name of the invoiced product or service.
    pub product_name: String,

    /// Invoiced quantity.
    pub quantity: u32,

    /// Tax amount or rate, as reported by the document.
    pub tax: Decimal,

    /// Total amount due.
    pub total_amount: Decimal,

    /// Invoice date (processing date when the document has none).
    pub date: NaiveDate,

    /// Completeness classification.
    pub status: InvoiceStatus,

    /// Required fields absent from the source data.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
}

impl Invoice {
    /// Whether every required field was present in the source data.
    pub fn is_complete(&self) -> bool {
        self.status == InvoiceStatus::Complete
    }
}

/// Completeness of an extracted invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// All required fields were present.
    Complete,
    /// At least one required field was missing.
    Incomplete,
}

impl InvoiceStatus {
    /// Derive the status from a list of missing fields.
    pub fn from_missing(missing: &[String]) -> Self {
        if missing.is_empty() {
            Self::Complete
        } else {
            Self::Incomplete
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
        }
    }
}

/// A product line extracted from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub tax: Decimal,
    pub price_with_tax: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
}

/// A customer extracted from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub total_purchase_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_purchase_date: Option<NaiveDate>,
}

/// Records validated from a single extraction result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub invoices: Vec<Invoice>,
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
}

impl Extraction {
    /// Whether no record of any type was produced.
    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty() && self.products.is_empty() && self.customers.is_empty()
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.invoices.len() + self.products.len() + self.customers.len()
    }
}

/// Receiver of validated records, one call per record.
pub trait RecordSink {
    fn add_invoice(&mut self, invoice: Invoice);
    fn add_product(&mut self, product: Product);
    fn add_customer(&mut self, customer: Customer);
}

/// Records accumulated over one orchestration run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedBatch {
    pub invoices: Vec<Invoice>,
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
}

impl ExtractedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every record of an extraction, keeping its order.
    pub fn extend(&mut self, extraction: Extraction) {
        self.invoices.extend(extraction.invoices);
        self.products.extend(extraction.products);
        self.customers.extend(extraction.customers);
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty() && self.products.is_empty() && self.customers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.invoices.len() + self.products.len() + self.customers.len()
    }

    /// Hand every record to a sink as a discrete add event: invoices first,
    /// then products, then customers, each in production order.
    pub fn emit_into<S: RecordSink + ?Sized>(self, sink: &mut S) {
        for invoice in self.invoices {
            sink.add_invoice(invoice);
        }
        for product in self.products {
            sink.add_product(product);
        }
        for customer in self.customers {
            sink.add_customer(customer);
        }
    }
}

impl RecordSink for ExtractedBatch {
    fn add_invoice(&mut self, invoice: Invoice) {
        self.invoices.push(invoice);
    }

    fn add_product(&mut self, product: Product) {
        self.products.push(product);
    }

    fn add_customer(&mut self, customer: Customer) {
        self.customers.push(customer);
    }
}
