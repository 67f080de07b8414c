//! Core library for vendor invoice import.
//!
//! This crate provides:
//! - Pack-size/portion normalization and strict unit conversion
//! - Vendor format detection (CSV header sniff, PDF text signatures)
//! - Vendor-specific line-item extractors with fallback grammar chains
//! - Fuzzy inventory matching with confidence and review semantics
//! - A review/reconciliation engine producing create/update batches

pub mod detect;
pub mod error;
pub mod extract;
pub mod matching;
pub mod models;
pub mod pdf;
pub mod review;
pub mod storage;
pub mod units;

pub use detect::{detect_vendor, InvoiceFile, Vendor};
pub use error::{DetectError, ExtractError, LarderError, Result, StorageError, UnitError};
pub use extract::{extractor_for, Extraction, VendorExtractor};
pub use matching::{match_items, string_similarity};
pub use models::config::LarderConfig;
pub use models::item::{ExtractedLineItem, InventoryItem, UnitFamily, UnitType};
pub use models::session::{ImportSession, ImportStage, ImportSummary, MatchResult, MatchResultId, MatchType};
pub use pdf::{LopdfTextExtractor, PdfTextExtractor, StaticTextExtractor};
pub use review::{apply_import, build_batch, ImportBatch, ItemPatch};
pub use storage::{DraftSnapshot, DraftStore, InventoryStore, JsonDraftStore, JsonStore, MemoryStore};
pub use units::{convert_units, parse_pack_size, parse_portion_size, PackSize, PortionParse};

use tracing::info;

/// One extraction attempt: detect -> extract -> match against a
/// point-in-time catalog snapshot.
///
/// The pipeline is strictly sequential per session, with no retries at this
/// layer; stage failures bubble to the caller, which surfaces them to a
/// human. The stage is observable so callers can report where an attempt
/// stopped.
pub struct ImportPipeline<'a> {
    pdf: &'a dyn PdfTextExtractor,
    config: &'a LarderConfig,
    stage: ImportStage,
}

impl<'a> ImportPipeline<'a> {
    pub fn new(pdf: &'a dyn PdfTextExtractor, config: &'a LarderConfig) -> Self {
        Self {
            pdf,
            config,
            stage: ImportStage::Idle,
        }
    }

    /// Stage the most recent attempt reached.
    pub fn stage(&self) -> &ImportStage {
        &self.stage
    }

    /// Run one import attempt. The returned session is ready for review.
    pub fn run(
        &mut self,
        file: &InvoiceFile,
        catalog: &[InventoryItem],
    ) -> Result<ImportSession> {
        self.stage = ImportStage::Detecting;
        let vendor = self.step(detect_vendor(file, self.pdf).map_err(LarderError::from))?;
        info!("detected vendor {vendor} for {}", file.name);

        self.stage = ImportStage::Extracting;
        let extractor: Box<dyn VendorExtractor> = match vendor {
            Vendor::BenEKeith => Box::new(extract::BenEKeithExtractor {
                min_expected_items: Some(self.config.extraction.min_primary_items),
            }),
            other => extractor_for(other),
        };
        let extraction = self.step(extractor.extract(file, self.pdf).map_err(LarderError::from))?;
        info!(
            "extracted {} items from invoice {}",
            extraction.items.len(),
            extraction.invoice_number
        );

        let results = match_items(extraction.items.clone(), catalog, &self.config.matching, 1);

        self.stage = ImportStage::Succeeded;
        Ok(ImportSession::from_matches(
            vendor,
            file.name.clone(),
            &extraction,
            results,
            self.config.matching.review_threshold,
        ))
    }

    fn step<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.stage = ImportStage::Failed(e.to_string());
        }
        result
    }
}

/// Convenience wrapper for the common one-shot case.
pub fn run_import(
    file: &InvoiceFile,
    pdf: &dyn PdfTextExtractor,
    catalog: &[InventoryItem],
    config: &LarderConfig,
) -> Result<ImportSession> {
    ImportPipeline::new(pdf, config).run(file, catalog)
}
