use bytes::Bytes;
use serde::Serialize;

pub const PDF_MIME: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF";

/// An uploaded resume file. Dropped as soon as text extraction finishes.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Bytes,
    pub mime_type: String,
    pub file_name: Option<String>,
}

impl RawDocument {
    pub fn new(bytes: Bytes, mime_type: impl Into<String>, file_name: Option<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    /// Accepts declared PDFs and undeclared uploads that carry the PDF magic.
    pub fn looks_like_pdf(&self) -> bool {
        self.mime_type.eq_ignore_ascii_case(PDF_MIME) || self.bytes.starts_with(PDF_MAGIC)
    }
}

/// Which extraction path produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedText {
    pub text: String,
    pub source: TextSource,
}

impl ExtractedText {
    pub fn new(text: String, source: TextSource) -> Self {
        Self { text, source }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// First `max_chars` characters, for echoing back to the client.
    pub fn preview(&self, max_chars: usize) -> String {
        self.text.chars().take(max_chars).collect()
    }
}
