//! Vendor format detection for uploaded invoice files.
//!
//! Detection is deterministic: vendors are tested in declaration order and
//! the first whose signature list matches wins.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::error::DetectError;
use crate::pdf::PdfTextExtractor;

/// Known vendor invoice formats, in detection-precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// CSV export dialect.
    Sysco,
    /// Fixed tabular PDF layout.
    BenEKeith,
    /// PDF; grammar not yet implemented.
    UsFoods,
    /// PDF; grammar not yet implemented.
    PerformanceFood,
}

impl Vendor {
    /// All vendors, in declaration order. Ties resolve by this order.
    pub const ALL: [Vendor; 4] = [
        Vendor::Sysco,
        Vendor::BenEKeith,
        Vendor::UsFoods,
        Vendor::PerformanceFood,
    ];

    /// Ordered case-insensitive text signatures for PDF detection.
    fn text_signatures(&self) -> &'static [&'static str] {
        match self {
            Vendor::Sysco => &[],
            Vendor::BenEKeith => &["ben e. keith", "ben e keith", "benekeith"],
            Vendor::UsFoods => &["us foods", "usfoods"],
            Vendor::PerformanceFood => &["performance foodservice", "performance food group"],
        }
    }

    /// Filename substrings used as a fallback when text signatures are
    /// inconclusive or extraction fails.
    fn filename_hints(&self) -> &'static [&'static str] {
        match self {
            Vendor::Sysco => &["sysco"],
            Vendor::BenEKeith => &["benekeith", "ben_e_keith", "bek"],
            Vendor::UsFoods => &["usfoods", "usf"],
            Vendor::PerformanceFood => &["pfg", "performance"],
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::Sysco => write!(f, "Sysco"),
            Vendor::BenEKeith => write!(f, "Ben E. Keith"),
            Vendor::UsFoods => write!(f, "US Foods"),
            Vendor::PerformanceFood => write!(f, "Performance Food"),
        }
    }
}

/// Minimal header set a CSV must carry to claim the Sysco dialect.
const SYSCO_REQUIRED_HEADERS: [&str; 2] = ["Product Description", "Product #"];

/// An uploaded invoice file: name plus raw bytes.
#[derive(Debug, Clone)]
pub struct InvoiceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InvoiceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Lower-cased file extension. Extension drives branch selection; there
    /// is no content-based sniffing.
    pub fn extension(&self) -> String {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }
}

/// Classify an uploaded file as one of the known vendor formats.
pub fn detect_vendor(
    file: &InvoiceFile,
    pdf: &dyn PdfTextExtractor,
) -> Result<Vendor, DetectError> {
    match file.extension().as_str() {
        "csv" => detect_csv(file),
        "pdf" => detect_pdf(file, pdf),
        other => Err(DetectError::UnsupportedExtension(other.to_string())),
    }
}

fn detect_csv(file: &InvoiceFile) -> Result<Vendor, DetectError> {
    let text = String::from_utf8_lossy(&file.bytes);
    let header_row = text.lines().next().unwrap_or_default();
    let headers: Vec<String> = header_row
        .split(',')
        .map(|h| h.trim().trim_matches('"').to_string())
        .collect();

    let claimed = SYSCO_REQUIRED_HEADERS
        .iter()
        .all(|required| headers.iter().any(|h| h == required));

    if claimed {
        debug!("CSV header matched the {} dialect", Vendor::Sysco);
        return Ok(Vendor::Sysco);
    }

    unknown(file)
}

fn detect_pdf(file: &InvoiceFile, pdf: &dyn PdfTextExtractor) -> Result<Vendor, DetectError> {
    // Text signatures first; filename heuristics only when extraction fails
    // or no signature matches.
    match pdf.extract_text(&file.bytes) {
        Ok(text) => {
            let lower = text.to_lowercase();
            for vendor in Vendor::ALL {
                if vendor
                    .text_signatures()
                    .iter()
                    .any(|sig| lower.contains(sig))
                {
                    debug!("text signature matched vendor {vendor}");
                    return Ok(vendor);
                }
            }
        }
        Err(e) => {
            warn!("PDF text extraction failed during detection: {e}");
        }
    }

    let name_lower = file.name.to_lowercase();
    for vendor in Vendor::ALL {
        if vendor
            .filename_hints()
            .iter()
            .any(|hint| name_lower.contains(hint))
        {
            debug!("filename hint matched vendor {vendor}");
            return Ok(vendor);
        }
    }

    unknown(file)
}

fn unknown(file: &InvoiceFile) -> Result<Vendor, DetectError> {
    Err(DetectError::UnknownVendor {
        file_name: file.name.clone(),
        extension: file.extension(),
    })
}
