//! Input files handed to the pipeline.

use std::path::{Path, PathBuf};

use crate::encode::DocumentKind;

/// A file submitted for extraction: name, size, declared type and a way to
/// read its bytes.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// Display name, used to attribute records and failures. Names should be
    /// unique within a batch.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type declared by the submitter, if any.
    pub declared_type: Option<String>,
    source: FileSource,
}

#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

impl InputFile {
    /// Describe a file on disk. The content is read later, when the file is
    /// encoded.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            size: metadata.len(),
            declared_type: None,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Wrap bytes already in memory.
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: Vec<u8>,
        declared_type: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            declared_type,
            source: FileSource::Memory(bytes),
        }
    }

    pub fn with_declared_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }

    /// Path on disk, for files that have one.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Path(path) => Some(path),
            FileSource::Memory(_) => None,
        }
    }

    /// Read the full content.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            FileSource::Path(path) => tokio::fs::read(path).await,
            FileSource::Memory(bytes) => Ok(bytes.clone()),
        }
    }

    /// Whether the intake offers this file for extraction: PDF, any image,
    /// or an Excel workbook.
    pub fn is_accepted(&self) -> bool {
        let declared_image = self
            .declared_type
            .as_deref()
            .is_some_and(|t| t.trim().to_ascii_lowercase().starts_with("image/"));

        declared_image
            || DocumentKind::resolve(self.declared_type.as_deref(), &self.name)
                .is_some_and(DocumentKind::is_intake_type)
    }
}
