//! File-to-payload encoding.
//!
//! Every file becomes an [`EncodedPayload`]: a MIME type plus the base64 text
//! of its content. Workbooks are flattened to CSV first (see [`spreadsheet`]).

mod kind;
pub mod spreadsheet;

pub use kind::DocumentKind;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EncodeError, PipelineError};
use crate::input::InputFile;
use crate::models::config::EncoderConfig;

/// Transport-ready representation of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedPayload {
    /// MIME type of the encoded content.
    pub mime_type: String,
    /// Standard base64 of the content.
    pub data: String,
}

impl EncodedPayload {
    /// Encode raw bytes under the given MIME type.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Decode the payload back to bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// Turns input files into payloads, enforcing the size ceiling.
#[derive(Debug, Clone)]
pub struct Encoder {
    max_file_size: u64,
}

impl Encoder {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn from_config(config: &EncoderConfig) -> Self {
        Self::new(config.max_file_size)
    }

    /// Check size limits and resolve the document kind without reading content.
    pub fn inspect(&self, file: &InputFile) -> Result<DocumentKind, EncodeError> {
        if file.size == 0 {
            return Err(EncodeError::EmptyFile {
                file: file.name.clone(),
            });
        }

        if file.size > self.max_file_size {
            return Err(EncodeError::FileTooLarge {
                file: file.name.clone(),
                size: file.size,
                limit: self.max_file_size,
            });
        }

        DocumentKind::resolve(file.declared_type.as_deref(), &file.name).ok_or_else(|| {
            EncodeError::UnsupportedType {
                file: file.name.clone(),
                declared: file.declared_type.clone(),
            }
        })
    }

    /// Read a file and encode it. Workbooks are converted to CSV text.
    pub async fn encode(&self, file: &InputFile) -> Result<EncodedPayload, PipelineError> {
        let kind = self.inspect(file)?;

        let bytes = file.read().await.map_err(|source| EncodeError::FileRead {
            file: file.name.clone(),
            source,
        })?;

        if bytes.is_empty() {
            return Err(EncodeError::EmptyFile {
                file: file.name.clone(),
            }
            .into());
        }

        let payload = if kind.is_spreadsheet() {
            spreadsheet::encode_spreadsheet(&file.name, &bytes)?
        } else {
            EncodedPayload::from_bytes(kind.mime_type(), &bytes)
        };

        debug!(
            "Encoded {} as {} ({} bytes -> {} base64 chars)",
            file.name,
            payload.mime_type,
            bytes.len(),
            payload.data.len()
        );

        Ok(payload)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::from_config(&EncoderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn supported_files_round_trip() {
        let encoder = Encoder::default();
        let content = b"%PDF-1.4\n\x00\xff binary body".to_vec();

        for name in ["a.pdf", "b.png", "c.JPG", "d.txt", "e.csv", "f.doc", "g.docx"] {
            let file = InputFile::from_bytes(name, content.clone(), None);
            let payload = encoder.encode(&file).await.unwrap();
            assert_eq!(payload.decode().unwrap(), content, "{name}");
        }
    }

    #[tokio::test]
    async fn declared_type_sets_mime() {
        let encoder = Encoder::default();
        let file = InputFile::from_bytes("upload", b"hello".to_vec(), Some("text/plain".into()));
        let payload = encoder.encode(&file).await.unwrap();
        assert_eq!(payload.mime_type, "text/plain");
        assert_eq!(payload.data, "aGVsbG8=");
    }

    #[tokio::test]
    async fn empty_file_rejected() {
        let encoder = Encoder::default();
        let file = InputFile::from_bytes("empty.pdf", Vec::new(), None);
        let err = encoder.encode(&file).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyFile);
    }

    #[tokio::test]
    async fn oversized_file_rejected() {
        let encoder = Encoder::new(4);
        let file = InputFile::from_bytes("big.pdf", b"12345".to_vec(), None);
        let err = encoder.encode(&file).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileTooLarge);
        assert_eq!(err.file_name(), Some("big.pdf"));
    }

    #[tokio::test]
    async fn unknown_type_rejected() {
        let encoder = Encoder::default();
        let file = InputFile::from_bytes("data.bin", b"x".to_vec(), None);
        let err = encoder.encode(&file).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    }

    #[tokio::test]
    async fn corrupt_workbook_is_spreadsheet_error() {
        let encoder = Encoder::default();
        let file = InputFile::from_bytes("sheet.xlsx", b"not a zip".to_vec(), None);
        let err = encoder.encode(&file).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SpreadsheetParse);
    }

    #[tokio::test]
    async fn missing_path_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        let file = InputFile::from_path(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        let err = Encoder::default().encode(&file).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileRead);
    }
}
