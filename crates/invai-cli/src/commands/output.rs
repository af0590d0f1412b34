//! Rendering extracted records as JSON, CSV or text.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use invai_core::{Customer, ExtractedBatch, Invoice, Product, RecordSink};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one table per record type
    Csv,
    /// Plain text summary
    Text,
}

/// Render every record for stdout or a single output file.
pub fn format_records(batch: ExtractedBatch, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&batch)?),
        OutputFormat::Csv => {
            let tables = [
                (batch.invoices.is_empty(), invoices_csv(&batch.invoices)?),
                (batch.products.is_empty(), products_csv(&batch.products)?),
                (batch.customers.is_empty(), customers_csv(&batch.customers)?),
            ];
            let sections: Vec<String> = tables
                .into_iter()
                .filter(|(empty, _)| !empty)
                .map(|(_, table)| table)
                .collect();
            Ok(sections.join("\n"))
        }
        OutputFormat::Text => {
            let mut report = TextReport::default();
            batch.emit_into(&mut report);
            Ok(report.finish())
        }
    }
}

/// Write records into a directory. CSV output gets one file per record type.
pub fn write_records(
    batch: ExtractedBatch,
    format: OutputFormat,
    dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    match format {
        OutputFormat::Csv => {
            let tables = [
                ("invoices.csv", batch.invoices.is_empty(), invoices_csv(&batch.invoices)?),
                ("products.csv", batch.products.is_empty(), products_csv(&batch.products)?),
                ("customers.csv", batch.customers.is_empty(), customers_csv(&batch.customers)?),
            ];
            for (name, empty, table) in tables {
                if empty {
                    continue;
                }
                let path = dir.join(name);
                fs::write(&path, table)?;
                written.push(path);
            }
        }
        OutputFormat::Json | OutputFormat::Text => {
            let name = match format {
                OutputFormat::Json => "records.json",
                _ => "records.txt",
            };
            let path = dir.join(name);
            fs::write(&path, format_records(batch, format)?)?;
            written.push(path);
        }
    }

    Ok(written)
}

fn to_csv<const N: usize>(header: [&str; N], rows: Vec<[String; N]>) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(&row)?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn invoices_csv(invoices: &[Invoice]) -> anyhow::Result<String> {
    to_csv(
        [
            "id",
            "serial_number",
            "customer_name",
            "product_name",
            "quantity",
            "tax",
            "total_amount",
            "date",
            "status",
            "missing_fields",
        ],
        invoices
            .iter()
            .map(|i| {
                [
                    i.id.to_string(),
                    i.serial_number.clone(),
                    i.customer_name.clone(),
                    i.product_name.clone(),
                    i.quantity.to_string(),
                    i.tax.to_string(),
                    i.total_amount.to_string(),
                    i.date.to_string(),
                    i.status.as_str().to_string(),
                    i.missing_fields.join(";"),
                ]
            })
            .collect(),
    )
}

fn products_csv(products: &[Product]) -> anyhow::Result<String> {
    to_csv(
        [
            "id",
            "name",
            "quantity",
            "unit_price",
            "tax",
            "price_with_tax",
            "discount",
        ],
        products
            .iter()
            .map(|p| {
                [
                    p.id.to_string(),
                    p.name.clone(),
                    p.quantity.to_string(),
                    p.unit_price.to_string(),
                    p.tax.to_string(),
                    p.price_with_tax.to_string(),
                    p.discount.map(|d| d.to_string()).unwrap_or_default(),
                ]
            })
            .collect(),
    )
}

fn customers_csv(customers: &[Customer]) -> anyhow::Result<String> {
    to_csv(
        [
            "id",
            "name",
            "phone_number",
            "total_purchase_amount",
            "email",
            "address",
            "last_purchase_date",
        ],
        customers
            .iter()
            .map(|c| {
                [
                    c.id.to_string(),
                    c.name.clone(),
                    c.phone_number.clone(),
                    c.total_purchase_amount.to_string(),
                    c.email.clone().unwrap_or_default(),
                    c.address.clone().unwrap_or_default(),
                    c.last_purchase_date.map(|d| d.to_string()).unwrap_or_default(),
                ]
            })
            .collect(),
    )
}

/// Human-readable listing built from record add events.
#[derive(Default)]
struct TextReport {
    output: String,
}

impl TextReport {
    fn finish(self) -> String {
        if self.output.is_empty() {
            "No records extracted.\n".to_string()
        } else {
            self.output
        }
    }

    fn separate(&mut self) {
        if !self.output.is_empty() {
            self.output.push('\n');
        }
    }
}

// Writing to a String cannot fail.
impl RecordSink for TextReport {
    fn add_invoice(&mut self, invoice: Invoice) {
        self.separate();
        let out = &mut self.output;
        let _ = writeln!(out, "Invoice {} ({})", invoice.serial_number, invoice.status.as_str());
        let _ = writeln!(out, "  Customer: {}", invoice.customer_name);
        let _ = writeln!(out, "  Product:  {} x{}", invoice.product_name, invoice.quantity);
        let _ = writeln!(out, "  Tax:      {}", invoice.tax);
        let _ = writeln!(out, "  Total:    {}", invoice.total_amount);
        let _ = writeln!(out, "  Date:     {}", invoice.date);
        if !invoice.missing_fields.is_empty() {
            let _ = writeln!(out, "  Missing:  {}", invoice.missing_fields.join(", "));
        }
    }

    fn add_product(&mut self, product: Product) {
        self.separate();
        let out = &mut self.output;
        let _ = writeln!(out, "Product {}", product.name);
        let _ = writeln!(out, "  Quantity:   {}", product.quantity);
        let _ = writeln!(out, "  Unit price: {}", product.unit_price);
        let _ = writeln!(out, "  Tax:        {}", product.tax);
        let _ = writeln!(out, "  With tax:   {}", product.price_with_tax);
        if let Some(discount) = product.discount {
            let _ = writeln!(out, "  Discount:   {}", discount);
        }
    }

    fn add_customer(&mut self, customer: Customer) {
        self.separate();
        let out = &mut self.output;
        let _ = writeln!(out, "Customer {}", customer.name);
        let _ = writeln!(out, "  Phone:     {}", customer.phone_number);
        let _ = writeln!(out, "  Purchases: {}", customer.total_purchase_amount);
        if let Some(email) = &customer.email {
            let _ = writeln!(out, "  Email:     {}", email);
        }
        if let Some(address) = &customer.address {
            let _ = writeln!(out, "  Address:   {}", address);
        }
        if let Some(date) = customer.last_purchase_date {
            let _ = writeln!(out, "  Last purchase: {}", date);
        }
    }
}
