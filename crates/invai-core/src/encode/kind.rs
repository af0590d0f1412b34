//! Supported document types and their MIME mapping.

/// A document type the extractor can be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    Png,
    Jpeg,
    Xlsx,
    Xls,
    PlainText,
    Csv,
    Doc,
    Docx,
}

impl DocumentKind {
    /// Every supported kind.
    pub const ALL: [DocumentKind; 9] = [
        DocumentKind::Pdf,
        DocumentKind::Png,
        DocumentKind::Jpeg,
        DocumentKind::Xlsx,
        DocumentKind::Xls,
        DocumentKind::PlainText,
        DocumentKind::Csv,
        DocumentKind::Doc,
        DocumentKind::Docx,
    ];

    /// Canonical MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Png => "image/png",
            DocumentKind::Jpeg => "image/jpeg",
            DocumentKind::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            DocumentKind::Xls => "application/vnd.ms-excel",
            DocumentKind::PlainText => "text/plain",
            DocumentKind::Csv => "text/csv",
            DocumentKind::Doc => "application/msword",
            DocumentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Map a MIME type to a kind. Parameters such as `; charset=utf-8` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpg" | "image/pjpeg" => Some(DocumentKind::Jpeg),
            "application/csv" => Some(DocumentKind::Csv),
            other => Self::ALL.into_iter().find(|kind| kind.mime_type() == other),
        }
    }

    /// Map a file extension (without the dot) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "png" => Some(DocumentKind::Png),
            "jpg" | "jpeg" => Some(DocumentKind::Jpeg),
            "xlsx" => Some(DocumentKind::Xlsx),
            "xls" => Some(DocumentKind::Xls),
            "txt" => Some(DocumentKind::PlainText),
            "csv" => Some(DocumentKind::Csv),
            "doc" => Some(DocumentKind::Doc),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    /// Map a file name to a kind by its extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// Resolve the kind of a file: a supported declared type wins, the
    /// extension decides otherwise.
    pub fn resolve(declared: Option<&str>, file_name: &str) -> Option<Self> {
        declared
            .and_then(Self::from_mime)
            .or_else(|| Self::from_file_name(file_name))
    }

    /// Workbook formats that are flattened to CSV before extraction.
    pub fn is_spreadsheet(self) -> bool {
        matches!(self, DocumentKind::Xlsx | DocumentKind::Xls)
    }

    /// Types offered at intake: PDF, images and Excel workbooks.
    pub fn is_intake_type(self) -> bool {
        matches!(
            self,
            DocumentKind::Pdf
                | DocumentKind::Png
                | DocumentKind::Jpeg
                | DocumentKind::Xlsx
                | DocumentKind::Xls
        )
    }
}
