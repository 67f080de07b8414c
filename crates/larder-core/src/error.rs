//! Error types for the larder-core library.

use thiserror::Error;

use crate::detect::Vendor;

/// Main error type for the larder library.
#[derive(Error, Debug)]
pub enum LarderError {
    /// Vendor detection error.
    #[error("detection error: {0}")]
    Detect(#[from] DetectError),

    /// Line-item extraction error.
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Unit conversion error.
    #[error("unit error: {0}")]
    Unit(#[from] UnitError),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while classifying an uploaded file to a vendor format.
#[derive(Error, Debug)]
pub enum DetectError {
    /// No vendor signature matched the file.
    #[error("could not detect vendor for '{file_name}' (.{extension}): no known signature matched")]
    UnknownVendor {
        file_name: String,
        extension: String,
    },

    /// The file extension is not one the pipeline accepts.
    #[error("unsupported file extension '.{0}': only .csv and .pdf invoices are accepted")]
    UnsupportedExtension(String),

    /// PDF text extraction failed before any signature could be tested.
    #[error("failed to read PDF text for detection: {0}")]
    Pdf(String),
}

/// Errors raised by the vendor format extractors.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The extractor ran but produced zero line items. A zero-item invoice
    /// indicates a parsing failure, never an empty invoice.
    #[error("no line items extracted: {0}")]
    NoItems(String),

    /// The detected vendor has no implemented grammar.
    #[error("no extractor implemented for vendor {0}")]
    UnsupportedVendor(Vendor),

    /// Failed to extract text from a PDF invoice.
    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// CSV parsing failed at the reader level.
    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors raised by unit conversion.
///
/// Pack-size parsing is total and default-fills; conversion is not. It feeds
/// cost and waste calculations, so a cross-family request must fail loudly
/// rather than coerce to zero.
#[derive(Error, Debug)]
pub enum UnitError {
    /// The two units belong to different measurement families.
    #[error("cannot convert {from} ({from_family}) to {to} ({to_family}): incompatible unit families")]
    IncompatibleFamilies {
        from: String,
        from_family: String,
        to: String,
        to_family: String,
    },

    /// The unit has no conversion factor (free-form vendor unit).
    #[error("unit '{0}' has no known conversion factor")]
    UnknownUnit(String),
}

/// Errors raised by the storage collaborator.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The batch write failed; nothing was applied.
    #[error("batch write failed: {0}")]
    WriteFailed(String),

    /// Loading the catalog failed.
    #[error("catalog load failed: {0}")]
    LoadFailed(String),

    /// I/O error from a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error from a file-backed store.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for the larder library.
pub type Result<T> = std::result::Result<T, LarderError>;
