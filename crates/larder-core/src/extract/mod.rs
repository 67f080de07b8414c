//! Vendor format extractors.
//!
//! Each extractor encodes one vendor's invoice grammar and turns raw file
//! content into normalized line items. An empty result is always an error:
//! a zero-item invoice indicates a parsing failure, not an empty invoice.

pub mod bene_keith;
mod patterns;
pub mod sysco_csv;

use chrono::{NaiveDate, Utc};

use crate::detect::{InvoiceFile, Vendor};
use crate::error::ExtractError;
use crate::models::item::ExtractedLineItem;
use crate::pdf::PdfTextExtractor;

pub use bene_keith::BenEKeithExtractor;
pub use sysco_csv::SyscoCsvExtractor;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Output of a successful extraction: at least one item, plus invoice
/// metadata (default-filled when the document doesn't carry it).
#[derive(Debug, Clone)]
pub struct Extraction {
    pub items: Vec<ExtractedLineItem>,
    pub invoice_number: String,
    /// ISO-formatted; defaults to the current date when absent.
    pub invoice_date: String,
}

/// Trait for vendor-specific invoice extractors.
pub trait VendorExtractor {
    /// The vendor whose grammar this extractor implements.
    fn vendor(&self) -> Vendor;

    /// Extract line items from the file. Never returns an empty item list.
    fn extract(&self, file: &InvoiceFile, pdf: &dyn PdfTextExtractor) -> Result<Extraction>;
}

/// Look up the extractor for a detected vendor.
///
/// Vendors without an implemented grammar get a stub that fails explicitly;
/// fabricated or empty success is never an option.
pub fn extractor_for(vendor: Vendor) -> Box<dyn VendorExtractor> {
    match vendor {
        Vendor::Sysco => Box::new(SyscoCsvExtractor::default()),
        Vendor::BenEKeith => Box::new(BenEKeithExtractor::default()),
        Vendor::UsFoods | Vendor::PerformanceFood => Box::new(UnsupportedExtractor(vendor)),
    }
}

/// Stub for vendors with no implemented grammar.
struct UnsupportedExtractor(Vendor);

impl VendorExtractor for UnsupportedExtractor {
    fn vendor(&self) -> Vendor {
        self.0
    }

    fn extract(&self, _file: &InvoiceFile, _pdf: &dyn PdfTextExtractor) -> Result<Extraction> {
        Err(ExtractError::UnsupportedVendor(self.0))
    }
}

/// Stamp invoice metadata onto every item and finish the extraction,
/// enforcing the non-empty invariant.
fn finish(
    mut items: Vec<ExtractedLineItem>,
    invoice_number: String,
    invoice_date: String,
    empty_reason: &str,
) -> Result<Extraction> {
    if items.is_empty() {
        return Err(ExtractError::NoItems(empty_reason.to_string()));
    }
    for item in &mut items {
        item.invoice_number = invoice_number.clone();
        item.invoice_date = invoice_date.clone();
    }
    Ok(Extraction {
        items,
        invoice_number,
        invoice_date,
    })
}

/// Today's date in ISO form, the safe default for absent invoice dates.
fn today_iso() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Format a parsed date in ISO form.
fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_vendor_fails_explicitly() {
        let file = InvoiceFile::new("usf.pdf", vec![0]);
        let pdf = crate::pdf::StaticTextExtractor("US FOODS".into());
        let err = extractor_for(Vendor::UsFoods).extract(&file, &pdf).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedVendor(Vendor::UsFoods)));
    }
}
