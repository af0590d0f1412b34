//! Spreadsheet flattening using calamine.
//!
//! The extractor reads documents, not workbook containers, so the first
//! sheet is rendered as CSV text and sent as `text/csv`.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::debug;

use super::{DocumentKind, EncodedPayload};
use crate::error::SpreadsheetError;

/// Result type for spreadsheet operations.
pub type Result<T> = std::result::Result<T, SpreadsheetError>;

/// Render the first sheet of a workbook as comma-separated text.
pub fn sheet_to_csv(file_name: &str, bytes: &[u8]) -> Result<String> {
    let parse_error = |reason: String| SpreadsheetError::Parse {
        file: file_name.to_string(),
        reason,
    };

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| parse_error(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| parse_error("workbook has no sheets".to_string()))?
        .map_err(|e| parse_error(e.to_string()))?;

    debug!(
        "Sheet of {} has {} rows x {} columns",
        file_name,
        range.height(),
        range.width()
    );

    range_to_csv(&range).map_err(|e| parse_error(e.to_string()))
}

/// Flatten a workbook and encode the CSV text as a payload.
pub fn encode_spreadsheet(file_name: &str, bytes: &[u8]) -> Result<EncodedPayload> {
    let csv = sheet_to_csv(file_name, bytes)?;
    Ok(EncodedPayload {
        mime_type: DocumentKind::Csv.mime_type().to_string(),
        data: STANDARD.encode(csv.as_bytes()),
    })
}

/// Write a cell range as CSV. Rows and columns before the range start are
/// emitted empty so cell positions match the sheet.
fn range_to_csv(range: &Range<Data>) -> std::result::Result<String, csv::Error> {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let lead_cols = start_col as usize;
    let width = lead_cols + range.width();

    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    if width > 0 {
        let blank = vec![String::new(); width];
        for _ in 0..start_row {
            wtr.write_record(&blank)?;
        }
    }

    for row in range.rows() {
        let mut record: Vec<String> = Vec::with_capacity(width);
        record.resize(lead_cols, String::new());
        record.extend(row.iter().map(cell_to_string));
        wtr.write_record(&record)?;
    }

    let bytes = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        other => other.to_string(),
    }
}
