//! Extraction instruction sent with every document.

/// Version of [`EXTRACTION_PROMPT`]. Bump whenever the wording changes.
pub const PROMPT_VERSION: &str = "2024-06.1";

/// Instruction asking the service for one JSON object with optional
/// `invoice`, `product` and `customer` keys.
pub const EXTRACTION_PROMPT: &str = r#"Extract invoice, product, and customer information from this document.
Return ONLY a JSON object with this exact structure:

{
  "invoice": {
    "serialNumber": "string",
    "customerName": "string",
    "productName": "string",
    "quantity": number,
    "tax": number,
    "totalAmount": number,
    "date": "YYYY-MM-DD"
  },
  "product": {
    "name": "string",
    "quantity": number,
    "unitPrice": number,
    "tax": number,
    "priceWithTax": number,
    "discount": number (optional)
  },
  "customer": {
    "name": "string",
    "phoneNumber": "string",
    "totalPurchaseAmount": number,
    "email": "string (optional)",
    "address": "string (optional)",
    "lastPurchaseDate": "YYYY-MM-DD (optional)"
  }
}

Important:
- Return ONLY the JSON object
- Omit "invoice", "product" or "customer" entirely if the document has no such data
- If the document lists several products, "product" may be an array of product objects
- Use numbers for numeric values, not strings
- Use YYYY-MM-DD format for dates
- Omit fields if data cannot be extracted with high confidence
- Do not add any explanatory text"#;
