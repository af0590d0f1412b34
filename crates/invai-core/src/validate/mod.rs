//! Schema validation: untyped extraction output to canonical records.
//!
//! This is the only place `serde_json::Value` is interpreted. Each of the
//! optional `invoice`, `product` and `customer` keys may hold one object or an
//! array of objects. A present, truthy value yields a record even when it
//! carries no usable field; the invoice then reports every field as missing.

pub mod coerce;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::config::ValidationConfig;
use crate::models::records::{
    Customer, Extraction, Invoice, InvoiceStatus, Product, INVOICE_REQUIRED_FIELDS,
};

use coerce::{
    is_truthy, read_date, read_number, to_optional_string, to_quantity, to_string_field,
    NumberRead,
};

/// Result type for validation operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

type Object = Map<String, Value>;

/// Converts parsed extraction output into records.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    strict_numbers: bool,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self {
            strict_numbers: config.strict_numbers,
        }
    }

    /// Reject non-numeric values in numeric fields instead of reading zero.
    pub fn with_strict_numbers(mut self, strict: bool) -> Self {
        self.strict_numbers = strict;
        self
    }

    /// Validate using today's date for invoices without one.
    pub fn validate(&self, value: &Value, file_name: &str) -> Result<Extraction> {
        self.validate_at(value, file_name, Local::now().date_naive())
    }

    /// Validate with an explicit processing date.
    pub fn validate_at(&self, value: &Value, file_name: &str, today: NaiveDate) -> Result<Extraction> {
        let no_data = || ValidationError::NoValidData {
            file: file_name.to_string(),
        };

        let root = value.as_object().ok_or_else(no_data)?;
        let ctx = FieldReader {
            file: file_name,
            strict: self.strict_numbers,
        };

        let empty = Object::new();
        let mut extraction = Extraction::default();

        for data in record_objects(root, "invoice", &empty) {
            extraction.invoices.push(ctx.invoice(data, today)?);
        }
        for data in record_objects(root, "product", &empty) {
            extraction.products.push(ctx.product(data)?);
        }
        for data in record_objects(root, "customer", &empty) {
            extraction.customers.push(ctx.customer(data)?);
        }

        if extraction.is_empty() {
            return Err(no_data());
        }

        debug!(
            "Validated {}: {} invoice(s), {} product(s), {} customer(s)",
            file_name,
            extraction.invoices.len(),
            extraction.products.len(),
            extraction.customers.len()
        );

        Ok(extraction)
    }
}

/// Objects stored under a record key. Falsy values yield nothing. Any other
/// non-object value stands for a record with no readable fields. Array
/// elements that are not objects are skipped.
fn record_objects<'a>(root: &'a Object, key: &str, empty: &'a Object) -> Vec<&'a Object> {
    let value = root.get(key);
    if !is_truthy(value) {
        return Vec::new();
    }

    match value {
        Some(Value::Object(obj)) => vec![obj],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
        Some(other) => {
            debug!("Non-object {} value {}, no fields readable", key, other);
            vec![empty]
        }
        None => Vec::new(),
    }
}

struct FieldReader<'a> {
    file: &'a str,
    strict: bool,
}

impl FieldReader<'_> {
    fn number(&self, data: &Object, record: &'static str, field: &'static str) -> Result<Decimal> {
        match read_number(data.get(field)) {
            NumberRead::Invalid(raw) if self.strict => Err(ValidationError::InvalidField {
                file: self.file.to_string(),
                record,
                field,
                value: raw,
            }),
            read => Ok(read.or_zero()),
        }
    }

    fn optional_number(
        &self,
        data: &Object,
        record: &'static str,
        field: &'static str,
    ) -> Result<Option<Decimal>> {
        match data.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.number(data, record, field).map(Some),
        }
    }

    fn invoice(&self, data: &Object, today: NaiveDate) -> Result<Invoice> {
        let missing_fields: Vec<String> = INVOICE_REQUIRED_FIELDS
            .iter()
            .filter(|field| !is_truthy(data.get(**field)))
            .map(|field| field.to_string())
            .collect();

        let date = match data.get("date") {
            raw if is_truthy(raw) => read_date(raw).unwrap_or_else(|| {
                warn!(
                    "Unreadable invoice date {} in {}, using {}",
                    raw.map(|v| v.to_string()).unwrap_or_default(),
                    self.file,
                    today
                );
                today
            }),
            _ => today,
        };

        Ok(Invoice {
            id: Uuid::new_v4(),
            serial_number: to_string_field(data.get("serialNumber")),
            customer_name: to_string_field(data.get("customerName")),
            product_name: to_string_field(data.get("productName")),
            quantity: to_quantity(self.number(data, "invoice", "quantity")?),
            tax: self.number(data, "invoice", "tax")?,
            total_amount: self.number(data, "invoice", "totalAmount")?,
            date,
            status: InvoiceStatus::from_missing(&missing_fields),
            missing_fields,
        })
    }

    fn product(&self, data: &Object) -> Result<Product> {
        Ok(Product {
            id: Uuid::new_v4(),
            name: to_string_field(data.get("name")),
            quantity: to_quantity(self.number(data, "product", "quantity")?),
            unit_price: self.number(data, "product", "unitPrice")?,
            tax: self.number(data, "product", "tax")?,
            price_with_tax: self.number(data, "product", "priceWithTax")?,
            discount: self.optional_number(data, "product", "discount")?,
        })
    }

    fn customer(&self, data: &Object) -> Result<Customer> {
        Ok(Customer {
            id: Uuid::new_v4(),
            name: to_string_field(data.get("name")),
            phone_number: to_string_field(data.get("phoneNumber")),
            total_purchase_amount: self.number(data, "customer", "totalPurchaseAmount")?,
            email: to_optional_string(data.get("email")),
            address: to_optional_string(data.get("address")),
            last_purchase_date: read_date(data.get("lastPurchaseDate")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn validate(value: Value) -> Result<Extraction> {
        SchemaValidator::new().validate_at(&value, "doc.pdf", today())
    }

    fn full_invoice() -> Value {
        json!({
            "serialNumber": "INV-2024-001",
            "customerName": "Acme Corp",
            "productName": "Widget",
            "quantity": 3,
            "tax": 18,
            "totalAmount": 354.0,
            "date": "2024-05-20"
        })
    }

    #[test]
    fn complete_invoice() {
        let extraction = validate(json!({ "invoice": full_invoice() })).unwrap();
        let invoice = &extraction.invoices[0];

        assert_eq!(invoice.status, InvoiceStatus::Complete);
        assert!(invoice.missing_fields.is_empty());
        assert_eq!(invoice.serial_number, "INV-2024-001");
        assert_eq!(invoice.quantity, 3);
        assert_eq!(invoice.total_amount, Decimal::from(354));
        assert_eq!(invoice.date, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());

        let serialized = serde_json::to_value(invoice).unwrap();
        assert!(serialized.get("missingFields").is_none());
    }

    #[test]
    fn missing_tax_only() {
        let mut data = full_invoice();
        data.as_object_mut().unwrap().remove("tax");

        let invoice = validate(json!({ "invoice": data })).unwrap().invoices.remove(0);
        assert_eq!(invoice.status, InvoiceStatus::Incomplete);
        assert_eq!(invoice.missing_fields, vec!["tax".to_string()]);
        assert_eq!(invoice.tax, Decimal::ZERO);
    }

    #[test]
    fn falsy_values_count_as_missing_before_coercion() {
        let invoice = validate(json!({
            "invoice": {
                "serialNumber": "",
                "customerName": null,
                "productName": "Widget",
                "quantity": 0,
                "tax": "0",
                "totalAmount": 10
            }
        }))
        .unwrap()
        .invoices
        .remove(0);

        assert_eq!(
            invoice.missing_fields,
            vec!["serialNumber", "customerName", "quantity"]
        );
        assert_eq!(invoice.tax, Decimal::ZERO);
    }

    #[test]
    fn missing_date_defaults_to_processing_date() {
        let mut data = full_invoice();
        data.as_object_mut().unwrap().remove("date");
        let invoice = validate(json!({ "invoice": data })).unwrap().invoices.remove(0);
        assert_eq!(invoice.date, today());
        assert!(invoice.is_complete());
    }

    #[test]
    fn unreadable_date_falls_back_to_processing_date() {
        let mut data = full_invoice();
        data["date"] = json!("next tuesday");
        let invoice = validate(json!({ "invoice": data })).unwrap().invoices.remove(0);
        assert_eq!(invoice.date, today());
        assert!(invoice.is_complete());
    }

    #[test]
    fn empty_invoice_object_is_fully_incomplete() {
        for raw in [json!({}), json!({"serialNumber": null}), json!("junk")] {
            let extraction = validate(json!({ "invoice": raw })).unwrap();
            let invoice = &extraction.invoices[0];

            assert_eq!(extraction.len(), 1);
            assert_eq!(invoice.status, InvoiceStatus::Incomplete);
            assert_eq!(invoice.missing_fields, INVOICE_REQUIRED_FIELDS.to_vec());
            assert_eq!(invoice.serial_number, "");
            assert_eq!(invoice.date, today());
        }
    }

    #[test]
    fn lenient_numbers_read_as_zero() {
        let mut data = full_invoice();
        data["quantity"] = json!("a few");
        let invoice = validate(json!({ "invoice": data })).unwrap().invoices.remove(0);
        assert_eq!(invoice.quantity, 0);
        assert!(invoice.is_complete());
    }

    #[test]
    fn strict_numbers_reject_garbage() {
        let mut data = full_invoice();
        data["quantity"] = json!("a few");
        let err = SchemaValidator::new()
            .with_strict_numbers(true)
            .validate_at(&json!({ "invoice": data }), "doc.pdf", today())
            .unwrap_err();

        match err {
            ValidationError::InvalidField { record, field, value, .. } => {
                assert_eq!((record, field, value.as_str()), ("invoice", "quantity", "a few"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn huge_numbers_saturate_even_when_strict() {
        let mut invoice = full_invoice();
        invoice["quantity"] = json!(1e300);
        invoice["totalAmount"] = json!(1.23e29);
        let value = json!({ "invoice": invoice, "product": {"name": "A", "unitPrice": -1e300} });

        let extraction = SchemaValidator::new()
            .with_strict_numbers(true)
            .validate_at(&value, "doc.pdf", today())
            .unwrap();

        assert_eq!(extraction.invoices[0].quantity, u32::MAX);
        assert_eq!(extraction.invoices[0].total_amount, Decimal::MAX);
        assert_eq!(extraction.products[0].unit_price, Decimal::MIN);
    }

    #[test]
    fn product_defaults_and_discount() {
        let extraction = validate(json!({
            "product": {"name": "Lamp", "unitPrice": "12.50", "discount": 5}
        }))
        .unwrap();
        let product = &extraction.products[0];

        assert_eq!(product.name, "Lamp");
        assert_eq!(product.quantity, 0);
        assert_eq!(product.unit_price, Decimal::new(1250, 2));
        assert_eq!(product.price_with_tax, Decimal::ZERO);
        assert_eq!(product.discount, Some(Decimal::from(5)));
    }

    #[test]
    fn product_array_yields_one_record_each() {
        let extraction = validate(json!({
            "product": [{"name": "A"}, "junk", {}, {"name": "B"}]
        }))
        .unwrap();
        let names: Vec<_> = extraction.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "", "B"]);
    }

    #[test]
    fn customer_optionals() {
        let extraction = validate(json!({
            "customer": {
                "name": "Jane Roe",
                "phoneNumber": 5550100,
                "totalPurchaseAmount": 99.9,
                "email": "jane@example.com",
                "address": "",
                "lastPurchaseDate": "2024-02-29"
            }
        }))
        .unwrap();
        let customer = &extraction.customers[0];

        assert_eq!(customer.phone_number, "5550100");
        assert_eq!(customer.email.as_deref(), Some("jane@example.com"));
        assert_eq!(customer.address, None);
        assert_eq!(customer.last_purchase_date, NaiveDate::from_ymd_opt(2024, 2, 29));
    }

    #[test]
    fn every_record_gets_its_own_id() {
        let extraction = validate(json!({
            "invoice": full_invoice(),
            "product": {"name": "Widget"},
            "customer": {"name": "Acme Corp"}
        }))
        .unwrap();

        assert_eq!(extraction.len(), 3);
        assert_ne!(extraction.invoices[0].id, extraction.products[0].id);
        assert_ne!(extraction.products[0].id, extraction.customers[0].id);
    }

    #[test]
    fn empty_extraction_is_no_valid_data() {
        for value in [
            json!({}),
            json!({"invoice": null, "product": "", "customer": 0}),
            json!({"product": []}),
            json!([1, 2]),
        ] {
            match validate(value) {
                Err(ValidationError::NoValidData { file }) => assert_eq!(file, "doc.pdf"),
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }
}
