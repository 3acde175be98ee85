//! Text Extractor: best-effort plain text from an uploaded PDF.
//!
//! Flow: validate → primary source (pdf-extract) → byte-scan fallback → normalize
//!       → minimum-length checks.
//!
//! One attempt per path, no retries. Both paths sit behind `PdfTextSource` so
//! either can be swapped without touching the pipeline.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::document::{ExtractedText, RawDocument, TextSource};

/// Below this many characters the upload has no usable text at all.
pub const MIN_TEXT_CHARS: usize = 10;
/// Below this many characters there is not enough text to structure.
pub const MIN_STRUCTURABLE_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{0}")]
    InvalidDocument(String),

    #[error("PDF text source '{source_name}' failed: {message}")]
    Source {
        source_name: &'static str,
        message: String,
    },

    #[error("PDF text source '{0}' panicked")]
    Panicked(&'static str),

    #[error("PDF text source '{0}' timed out")]
    Timeout(&'static str),

    #[error("Could not extract text from PDF. Please ensure the PDF contains readable text.")]
    NoUsableText { chars: usize },

    #[error(
        "Only {chars} characters of text could be read from this PDF, which is not enough to \
         build a portfolio. Please upload a text-based (not scanned) resume."
    )]
    InsufficientText { chars: usize },
}

/// A PDF-to-text capability. Implementations are synchronous and run on a
/// blocking thread.
pub trait PdfTextSource: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Primary source backed by the `pdf-extract` crate.
pub struct PdfExtractSource;

impl PdfTextSource for PdfExtractSource {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Source {
            source_name: self.name(),
            message: e.to_string(),
        })
    }
}

/// Fallback source: scans raw bytes for printable ASCII.
pub struct ByteScanSource;

impl PdfTextSource for ByteScanSource {
    fn name(&self) -> &'static str {
        "byte-scan"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        Ok(scan_printable(bytes))
    }
}

#[derive(Clone)]
pub struct TextExtractor {
    primary: Arc<dyn PdfTextSource>,
    fallback: Arc<dyn PdfTextSource>,
    timeout: Duration,
}

impl TextExtractor {
    pub fn new(
        primary: Arc<dyn PdfTextSource>,
        fallback: Arc<dyn PdfTextSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeout,
        }
    }

    /// pdf-extract with the byte-scan fallback.
    pub fn standard(timeout: Duration) -> Self {
        Self::new(Arc::new(PdfExtractSource), Arc::new(ByteScanSource), timeout)
    }

    /// Extracts normalized text, failing only when fewer than
    /// `MIN_TEXT_CHARS` characters survive both paths.
    pub async fn extract_text(
        &self,
        document: &RawDocument,
    ) -> Result<ExtractedText, ExtractionError> {
        validate_document(document)?;

        let primary = match run_source(&self.primary, document.bytes.clone(), self.timeout).await
        {
            Ok(raw) => {
                let text = normalize_text(&raw);
                if text.is_empty() {
                    warn!("Primary PDF extraction returned no text, falling back to byte scan");
                    None
                } else {
                    Some(text)
                }
            }
            Err(e) => {
                warn!("Primary PDF extraction failed ({e}), falling back to byte scan");
                None
            }
        };

        let extracted = match primary {
            Some(text) => ExtractedText::new(text, TextSource::Primary),
            None => {
                let raw = run_source(&self.fallback, document.bytes.clone(), self.timeout).await?;
                ExtractedText::new(normalize_text(&raw), TextSource::Fallback)
            }
        };

        let chars = extracted.char_len();
        if chars < MIN_TEXT_CHARS {
            warn!("Extraction produced only {chars} characters");
            return Err(ExtractionError::NoUsableText { chars });
        }

        info!(
            "Extracted {} characters from {} byte PDF via {:?} path",
            chars,
            document.byte_size(),
            extracted.source
        );
        Ok(extracted)
    }

    /// `extract_text` plus the stricter length check required before structuring.
    pub async fn extract_for_structuring(
        &self,
        document: &RawDocument,
    ) -> Result<ExtractedText, ExtractionError> {
        let extracted = self.extract_text(document).await?;
        ensure_structurable(&extracted)?;
        Ok(extracted)
    }
}

pub fn ensure_structurable(text: &ExtractedText) -> Result<(), ExtractionError> {
    let chars = text.char_len();
    if chars < MIN_STRUCTURABLE_CHARS {
        return Err(ExtractionError::InsufficientText { chars });
    }
    Ok(())
}

pub fn validate_document(document: &RawDocument) -> Result<(), ExtractionError> {
    if document.bytes.is_empty() {
        return Err(ExtractionError::InvalidDocument(
            "The uploaded file is empty".to_string(),
        ));
    }
    if !document.looks_like_pdf() {
        return Err(ExtractionError::InvalidDocument(
            "Please upload a PDF file".to_string(),
        ));
    }
    Ok(())
}

/// Runs a source on the blocking pool. Panics inside the PDF library surface
/// as `Panicked` instead of unwinding into the caller.
///
/// The timeout only bounds the wait: a blocking job cannot be cancelled, so a
/// pathological PDF keeps its pool thread busy until the library returns.
async fn run_source(
    source: &Arc<dyn PdfTextSource>,
    bytes: Bytes,
    timeout: Duration,
) -> Result<String, ExtractionError> {
    let name = source.name();
    let source = Arc::clone(source);
    let task = tokio::task::spawn_blocking(move || source.extract(&bytes));

    match tokio::time::timeout(timeout, task).await {
        Err(_) => Err(ExtractionError::Timeout(name)),
        Ok(Err(join_error)) if join_error.is_panic() => Err(ExtractionError::Panicked(name)),
        Ok(Err(join_error)) => Err(ExtractionError::Source {
            source_name: name,
            message: join_error.to_string(),
        }),
        Ok(Ok(result)) => result,
    }
}

/// Collapses horizontal whitespace runs to one space, trims every line and
/// drops blank lines. Line breaks survive for the heuristic parser.
pub fn normalize_text(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keeps printable ASCII plus line breaks and tabs; any printable character
/// outside `[A-Za-z0-9_@.-]` becomes a space.
fn scan_printable(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter_map(|&b| match b {
            b'\n' | b'\r' | b'\t' => Some(b as char),
            0x20..=0x7e => {
                let c = b as char;
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '.' | '-') {
                    Some(c)
                } else {
                    Some(' ')
                }
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Source with a fixed answer.
    pub struct FixedSource(pub Result<String, String>);

    impl PdfTextSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn extract(&self, _bytes: &[u8]) -> Result<String, ExtractionError> {
            self.0.clone().map_err(|message| ExtractionError::Source {
                source_name: "fixed",
                message,
            })
        }
    }

    pub struct PanickingSource;

    impl PdfTextSource for PanickingSource {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn extract(&self, _bytes: &[u8]) -> Result<String, ExtractionError> {
            panic!("malformed xref table")
        }
    }

    pub fn extractor_returning(text: &str) -> TextExtractor {
        TextExtractor::new(
            Arc::new(FixedSource(Ok(text.to_string()))),
            Arc::new(FixedSource(Ok(String::new()))),
            Duration::from_secs(5),
        )
    }

    pub fn pdf(bytes: &'static [u8]) -> RawDocument {
        RawDocument::new(Bytes::from_static(bytes), "application/pdf", None)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    const RESUME_LINE: &str = "Jane Doe jane@x.com Software Engineer at Acme 2022";

    #[test]
    fn test_normalize_collapses_whitespace_and_blank_lines() {
        let raw = "  Jane   Doe \r\n\n\n\t\nSoftware\tEngineer  \n   \nAcme\x0C Corp ";
        assert_eq!(normalize_text(raw), "Jane Doe\nSoftware Engineer\nAcme Corp");
    }

    #[test]
    fn test_scan_printable_strips_binary_and_punctuation() {
        let bytes = b"%PDF-1.4\n\x00\x01(Jane Doe) Tj\n<<jane@x.com>>\xff";
        assert_eq!(scan_printable(bytes), " PDF-1.4\n Jane Doe  Tj\n  jane@x.com  ");
    }

    #[tokio::test]
    async fn test_primary_text_is_used_when_available() {
        let extractor = extractor_returning(RESUME_LINE);
        let extracted = extractor.extract_text(&pdf(b"%PDF-1.4")).await.unwrap();
        assert_eq!(extracted.text, RESUME_LINE);
        assert_eq!(extracted.source, TextSource::Primary);
    }

    #[tokio::test]
    async fn test_primary_error_falls_back_to_byte_scan() {
        let extractor = TextExtractor::new(
            Arc::new(FixedSource(Err("encrypted".to_string()))),
            Arc::new(ByteScanSource),
            Duration::from_secs(5),
        );
        let extracted = extractor
            .extract_text(&pdf(b"%PDF-1.4 (Jane Doe) Tj (Rust Engineer) Tj"))
            .await
            .unwrap();
        assert_eq!(extracted.source, TextSource::Fallback);
        assert!(extracted.text.contains("Jane Doe"));
        assert!(extracted.text.contains("Rust Engineer"));
    }

    #[tokio::test]
    async fn test_primary_empty_output_falls_back() {
        let extractor = TextExtractor::new(
            Arc::new(FixedSource(Ok("  \n \n".to_string()))),
            Arc::new(FixedSource(Ok("fallback text that is long enough".to_string()))),
            Duration::from_secs(5),
        );
        let extracted = extractor.extract_text(&pdf(b"%PDF")).await.unwrap();
        assert_eq!(extracted.source, TextSource::Fallback);
    }

    #[tokio::test]
    async fn test_panicking_primary_falls_back() {
        let extractor = TextExtractor::new(
            Arc::new(PanickingSource),
            Arc::new(FixedSource(Ok("recovered resume text".to_string()))),
            Duration::from_secs(5),
        );
        let extracted = extractor.extract_text(&pdf(b"%PDF")).await.unwrap();
        assert_eq!(extracted.text, "recovered resume text");
    }

    /// Holds its blocking thread well past any test timeout.
    struct StalledSource;

    impl PdfTextSource for StalledSource {
        fn name(&self) -> &'static str {
            "stalled"
        }

        fn extract(&self, _bytes: &[u8]) -> Result<String, ExtractionError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok("too late".to_string())
        }
    }

    #[tokio::test]
    async fn test_stalled_primary_times_out_into_fallback() {
        let extractor = TextExtractor::new(
            Arc::new(StalledSource),
            Arc::new(FixedSource(Ok("recovered resume text".to_string()))),
            Duration::from_millis(50),
        );
        let extracted = extractor.extract_text(&pdf(b"%PDF")).await.unwrap();
        assert_eq!(extracted.source, TextSource::Fallback);
        assert_eq!(extracted.text, "recovered resume text");
    }

    #[tokio::test]
    async fn test_stalled_source_reports_timeout() {
        let source: Arc<dyn PdfTextSource> = Arc::new(StalledSource);
        let result = run_source(&source, Bytes::from_static(b"%PDF"), Duration::from_millis(50)).await;
        assert!(matches!(result, Err(ExtractionError::Timeout("stalled"))));
    }

    #[tokio::test]
    async fn test_short_text_is_a_hard_failure() {
        let extractor = extractor_returning("Jane");
        let result = extractor.extract_text(&pdf(b"%PDF")).await;
        assert!(matches!(result, Err(ExtractionError::NoUsableText { chars: 4 })));
    }

    #[tokio::test]
    async fn test_structuring_threshold_boundary() {
        let exactly_fifty = extractor_returning(RESUME_LINE);
        assert_eq!(RESUME_LINE.chars().count(), MIN_STRUCTURABLE_CHARS);
        assert!(exactly_fifty
            .extract_for_structuring(&pdf(b"%PDF"))
            .await
            .is_ok());

        let forty_nine = extractor_returning(&RESUME_LINE[..49]);
        let result = forty_nine.extract_for_structuring(&pdf(b"%PDF")).await;
        assert!(matches!(
            result,
            Err(ExtractionError::InsufficientText { chars: 49 })
        ));
    }

    #[tokio::test]
    async fn test_rejects_empty_and_non_pdf_uploads() {
        let extractor = extractor_returning(RESUME_LINE);

        let empty = RawDocument::new(Bytes::new(), "application/pdf", None);
        assert!(matches!(
            extractor.extract_text(&empty).await,
            Err(ExtractionError::InvalidDocument(_))
        ));

        let docx = RawDocument::new(Bytes::from_static(b"PK\x03\x04"), "application/zip", None);
        assert!(matches!(
            extractor.extract_text(&docx).await,
            Err(ExtractionError::InvalidDocument(_))
        ));
    }
}
