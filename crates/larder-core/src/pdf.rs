//! PDF text extraction behind a narrow collaborator trait.
//!
//! The pipeline only needs concatenated page text in reading order; which
//! engine produces it is an implementation detail.

use lopdf::Document;
use tracing::debug;

use crate::error::ExtractError;

/// Trait for PDF text extraction backends.
pub trait PdfTextExtractor: Send + Sync {
    /// Extract concatenated page text in reading order from PDF bytes.
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, ExtractError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Default backend: lopdf for structural checks, pdf-extract for text.
#[derive(Debug, Default)]
pub struct LopdfTextExtractor;

impl LopdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl PdfTextExtractor for LopdfTextExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, ExtractError> {
        let doc = Document::load_mem(pdf_bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(ExtractError::Encrypted);
        }
        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(ExtractError::NoPages);
        }

        let text = pdf_extract::extract_text_from_mem(pdf_bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;

        debug!("extracted {} chars from {} pages", text.len(), page_count);
        Ok(text)
    }

    fn backend_name(&self) -> &str {
        "lopdf+pdf-extract"
    }
}

/// Test backend returning canned text, for exercising the pipeline without
/// real PDF bytes.
#[derive(Debug, Clone)]
pub struct StaticTextExtractor(pub String);

impl PdfTextExtractor for StaticTextExtractor {
    fn extract_text(&self, _pdf_bytes: &[u8]) -> Result<String, ExtractError> {
        Ok(self.0.clone())
    }

    fn backend_name(&self) -> &str {
        "static"
    }
}
