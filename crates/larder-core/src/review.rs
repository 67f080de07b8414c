//! Review and reconciliation of match results into an upsert batch.
//!
//! Every mutation recomputes the summary from the full result list rather
//! than adjusting counters in place; the counters can never drift from the
//! list they describe.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::detect::Vendor;
use crate::error::StorageError;
use crate::extract::Extraction;
use crate::models::item::{InventoryItem, UnitType};
use crate::models::session::{
    ImportSession, ImportStage, ImportSummary, MatchResult, MatchResultId, MatchType,
};
use crate::storage::InventoryStore;

/// Typed field update for an extracted item under review.
///
/// The set of editable fields is closed; cost-bearing updates trigger a
/// recompute of the derived unit cost.
#[derive(Debug, Clone)]
pub enum ItemPatch {
    Name(String),
    Brand(Option<String>),
    Category(String),
    VendorSku(String),
    UnitsPerCase(Decimal),
    SizePerUnit(Decimal),
    UnitType(UnitType),
    CaseCost(Decimal),
    QuantityOrdered(Decimal),
    QuantityShipped(Decimal),
    Par(Decimal),
    OnHand(Decimal),
    Location(Option<String>),
    Area(Option<String>),
    PortionSize(Option<Decimal>),
    PortionUnit(Option<UnitType>),
}

impl ImportSession {
    /// Assemble a session from a finished extraction and its match results.
    pub fn from_matches(
        vendor: Vendor,
        file_name: impl Into<String>,
        extraction: &Extraction,
        results: Vec<MatchResult>,
        review_threshold: f32,
    ) -> Self {
        let next_result_id = results.iter().map(|r| r.id.0 + 1).max().unwrap_or(1);
        let mut session = Self {
            vendor,
            invoice_number: extraction.invoice_number.clone(),
            invoice_date: extraction.invoice_date.clone(),
            file_name: file_name.into(),
            results,
            summary: ImportSummary::default(),
            stage: ImportStage::Succeeded,
            review_threshold,
            created_at: Utc::now(),
            next_result_id,
        };
        session.recompute_summary();
        session
    }

    /// Mark a reviewed match as accepted.
    pub fn accept_match(&mut self, id: MatchResultId) -> bool {
        let found = self.with_result(id, |r| {
            r.requires_review = false;
        });
        self.recompute_summary();
        found
    }

    /// Force the row to import as a new catalog entry.
    ///
    /// Clears the matched-item snapshot: the reference is meaningless once
    /// the row is declared new, and a stale snapshot would leak into drafts.
    pub fn create_new_item(&mut self, id: MatchResultId) -> bool {
        let found = self.with_result(id, |r| {
            r.is_new_item = true;
            r.requires_review = false;
            r.matched_item = None;
            r.match_type = MatchType::New;
        });
        self.recompute_summary();
        found
    }

    /// Remove the result from the session entirely.
    pub fn skip_item(&mut self, id: MatchResultId) -> bool {
        let before = self.results.len();
        self.results.retain(|r| r.id != id);
        let removed = self.results.len() < before;
        self.recompute_summary();
        removed
    }

    /// Detach the result from its catalog candidate and treat it as new.
    pub fn unmatch_item(&mut self, id: MatchResultId) -> bool {
        let found = self.with_result(id, |r| {
            r.is_new_item = true;
            r.matched_item = None;
            r.match_type = MatchType::New;
            r.requires_review = false;
        });
        self.recompute_summary();
        found
    }

    /// Deep-copy the extracted item as a new-item result with suffix markers
    /// on name and SKU. Returns the new result's id.
    pub fn duplicate_item(&mut self, id: MatchResultId) -> Option<MatchResultId> {
        let source = self.results.iter().find(|r| r.id == id)?;

        let mut copy = source.extracted_item.clone();
        copy.name = format!("{} (Copy)", copy.name);
        copy.vendor_sku = format!("{}_COPY", copy.vendor_sku);

        let new_id = MatchResultId(self.next_result_id);
        self.next_result_id += 1;

        self.results.push(MatchResult {
            id: new_id,
            extracted_item: copy,
            matched_item: None,
            match_type: MatchType::New,
            confidence: 0.0,
            // The user asked for the copy; it does not need review.
            requires_review: false,
            is_new_item: true,
        });

        debug!("duplicated {id} as {new_id}");
        self.recompute_summary();
        Some(new_id)
    }

    /// Apply a typed field edit. The derived unit cost is recomputed after
    /// every patch, so the cost invariant holds no matter which field
    /// changed.
    pub fn update_field(&mut self, id: MatchResultId, patch: ItemPatch) -> bool {
        let found = self.with_result(id, |r| {
            let item = &mut r.extracted_item;
            match patch {
                ItemPatch::Name(v) => item.name = v,
                ItemPatch::Brand(v) => item.brand = v,
                ItemPatch::Category(v) => item.category = v,
                ItemPatch::VendorSku(v) => item.vendor_sku = v,
                ItemPatch::UnitsPerCase(v) => item.units_per_case = v,
                ItemPatch::SizePerUnit(v) => item.size_per_unit = v,
                ItemPatch::UnitType(v) => item.unit_type = v,
                ItemPatch::CaseCost(v) => item.case_cost = v,
                ItemPatch::QuantityOrdered(v) => {
                    item.quantity_ordered = v.max(Decimal::ZERO).round_dp(2)
                }
                ItemPatch::QuantityShipped(v) => {
                    item.quantity_shipped = v.max(Decimal::ZERO).round_dp(2)
                }
                ItemPatch::Par(v) => item.par = v,
                ItemPatch::OnHand(v) => item.on_hand = v,
                ItemPatch::Location(v) => item.location = v,
                ItemPatch::Area(v) => item.area = v,
                ItemPatch::PortionSize(v) => item.portion_size = v,
                ItemPatch::PortionUnit(v) => item.portion_unit = v,
            }
            item.recompute_unit_cost();
        });
        self.recompute_summary();
        found
    }

    /// Recompute the summary counters from the full result list.
    pub fn recompute_summary(&mut self) {
        let mut summary = ImportSummary {
            total_items: self.results.len(),
            ..ImportSummary::default()
        };

        for r in &self.results {
            if r.is_new_item {
                summary.new_items += 1;
            } else if r.confidence >= self.review_threshold {
                summary.auto_matched += 1;
            }
            if r.requires_review {
                summary.needs_review += 1;
            }
            if r.extracted_item.portion_size.is_some() {
                summary.portions_parsed += 1;
            }
        }

        self.summary = summary;
    }

    fn with_result(&mut self, id: MatchResultId, f: impl FnOnce(&mut MatchResult)) -> bool {
        match self.results.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                f(r);
                true
            }
            None => false,
        }
    }
}

/// The final set of create/update operations for one import.
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub created: Vec<InventoryItem>,
    pub updated: Vec<InventoryItem>,
}

impl ImportBatch {
    pub fn len(&self) -> usize {
        self.created.len() + self.updated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty()
    }
}

/// Build the create/update batch from the current session state.
///
/// New or unmatched rows synthesize a fresh catalog entry; matched rows
/// produce a superseding copy of the catalog entry. Existing catalog data is
/// never overwritten with blanks.
pub fn build_batch(session: &ImportSession) -> ImportBatch {
    let mut batch = ImportBatch::default();

    for result in &session.results {
        let item = &result.extracted_item;
        match &result.matched_item {
            Some(matched) if !result.is_new_item => {
                let mut updated = matched.clone();
                updated.on_hand += item.quantity_shipped;
                if item.case_cost > Decimal::ZERO {
                    updated.case_cost = item.case_cost;
                    updated.unit_cost = item.unit_cost;
                }
                if updated.portion_size.is_none() && item.portion_size.is_some() {
                    updated.portion_size = item.portion_size;
                    updated.portion_unit = item.portion_unit.clone();
                }
                updated.updated_at = Utc::now();
                batch.updated.push(updated);
            }
            _ => batch.created.push(InventoryItem::from_extracted(item)),
        }
    }

    batch
}

/// Build the batch and submit it to the store in one save call.
///
/// Partial application is not supported: if the write fails, nothing is
/// considered applied and the caller retries the whole apply.
pub fn apply_import(
    session: &ImportSession,
    store: &mut dyn InventoryStore,
) -> Result<ImportBatch, StorageError> {
    let batch = build_batch(session);

    let mut all: Vec<InventoryItem> = Vec::with_capacity(batch.len());
    all.extend(batch.created.iter().cloned());
    all.extend(batch.updated.iter().cloned());

    store.save(&all)?;
    info!(
        "applied import: {} created, {} updated",
        batch.created.len(),
        batch.updated.len()
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::MatchConfig;
    use crate::models::session::MatchType;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn session_with(results: Vec<MatchResult>) -> ImportSession {
        let extraction = Extraction {
            items: Vec::new(),
            invoice_number: "20240815".to_string(),
            invoice_date: "2024-08-15".to_string(),
        };
        ImportSession::from_matches(
            Vendor::Sysco,
            "sysco.csv",
            &extraction,
            results,
            MatchConfig::default().review_threshold,
        )
    }

    fn fuzzy_result(id: u64, name: &str, sku: &str, catalog: InventoryItem) -> MatchResult {
        let mut item = crate::models::item::ExtractedLineItem::new(name, sku, Vendor::Sysco);
        item.set_quantities(dec("5"), dec("5"));
        MatchResult {
            id: MatchResultId(id),
            extracted_item: item,
            matched_item: Some(catalog),
            match_type: MatchType::FuzzyName,
            confidence: 0.85,
            requires_review: true,
            is_new_item: false,
        }
    }

    fn catalog_item(id: &str, name: &str, sku: &str, on_hand: &str) -> InventoryItem {
        InventoryItem {
            id: id.to_string(),
            name: name.to_string(),
            vendor_sku: sku.to_string(),
            primary_vendor: "Sysco".to_string(),
            category: "Unknown".to_string(),
            case_cost: Decimal::ZERO,
            unit_cost: Decimal::ZERO,
            on_hand: dec(on_hand),
            par: Decimal::ZERO,
            portion_size: None,
            portion_unit: None,
            location: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_accept_clears_review_flag() {
        let mut session = session_with(vec![fuzzy_result(
            1,
            "Lettuce",
            "P-100",
            catalog_item("i1", "Lettuce Iceberg", "X-1", "0"),
        )]);
        assert_eq!(session.summary.needs_review, 1);

        assert!(session.accept_match(MatchResultId(1)));
        assert_eq!(session.summary.needs_review, 0);
        assert!(!session.result(MatchResultId(1)).unwrap().requires_review);
    }

    #[test]
    fn test_create_new_clears_matched_snapshot() {
        let mut session = session_with(vec![fuzzy_result(
            1,
            "Lettuce",
            "P-100",
            catalog_item("i1", "Lettuce Iceberg", "X-1", "0"),
        )]);

        assert!(session.create_new_item(MatchResultId(1)));
        let r = session.result(MatchResultId(1)).unwrap();
        assert!(r.is_new_item);
        assert!(r.matched_item.is_none());
        assert_eq!(session.summary.new_items, 1);
    }

    #[test]
    fn test_skip_removes_result_by_id() {
        let mut session = session_with(vec![
            fuzzy_result(1, "A", "S-1", catalog_item("i1", "A", "X-1", "0")),
            fuzzy_result(2, "B", "S-2", catalog_item("i2", "B", "X-2", "0")),
        ]);

        assert!(session.skip_item(MatchResultId(1)));
        assert_eq!(session.summary.total_items, 1);
        // The surviving result keeps its id; nothing shifted underneath it.
        assert!(session.result(MatchResultId(2)).is_some());
        assert!(!session.skip_item(MatchResultId(1)));
    }

    #[test]
    fn test_duplicate_appends_copy_with_markers() {
        let mut session = session_with(vec![fuzzy_result(
            1,
            "Lettuce",
            "A1",
            catalog_item("i1", "Lettuce Iceberg", "X-1", "0"),
        )]);
        let new_items_before = session.summary.new_items;

        let copy_id = session.duplicate_item(MatchResultId(1)).unwrap();
        let copy = session.result(copy_id).unwrap();
        assert_eq!(copy.extracted_item.name, "Lettuce (Copy)");
        assert_eq!(copy.extracted_item.vendor_sku, "A1_COPY");
        assert!(copy.is_new_item);
        assert_eq!(session.summary.total_items, 2);
        assert_eq!(session.summary.new_items, new_items_before + 1);
    }

    #[test]
    fn test_update_cost_field_recomputes_unit_cost() {
        let mut session = session_with(vec![fuzzy_result(
            1,
            "Lettuce",
            "P-100",
            catalog_item("i1", "Lettuce Iceberg", "X-1", "0"),
        )]);
        let id = MatchResultId(1);

        session.update_field(id, ItemPatch::UnitsPerCase(dec("2")));
        session.update_field(id, ItemPatch::SizePerUnit(dec("5")));
        session.update_field(id, ItemPatch::CaseCost(dec("10.00")));

        let item = &session.result(id).unwrap().extracted_item;
        assert_eq!(item.unit_cost, dec("1.00"));
    }

    #[test]
    fn test_apply_increments_on_hand() {
        // Matched row: catalog on-hand 3, shipped 5, expect 8.
        let session = session_with(vec![fuzzy_result(
            1,
            "Lettuce",
            "P-100",
            catalog_item("i1", "Lettuce Iceberg", "X-1", "3"),
        )]);

        let mut store = MemoryStore::default();
        let batch = apply_import(&session, &mut store).unwrap();
        assert_eq!(batch.created.len(), 0);
        assert_eq!(batch.updated.len(), 1);
        assert_eq!(batch.updated[0].on_hand, dec("8"));

        let stored = store.load().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].on_hand, dec("8"));
    }

    #[test]
    fn test_apply_new_item_starts_at_shipped() {
        let mut session = session_with(vec![fuzzy_result(
            1,
            "Lettuce",
            "P-100",
            catalog_item("i1", "Lettuce Iceberg", "X-1", "3"),
        )]);
        session.unmatch_item(MatchResultId(1));

        let mut store = MemoryStore::default();
        let batch = apply_import(&session, &mut store).unwrap();
        assert_eq!(batch.created.len(), 1);
        assert_eq!(batch.created[0].on_hand, dec("5"));
        assert!(batch.updated.is_empty());
    }

    #[test]
    fn test_apply_never_blanks_existing_portion() {
        let mut catalog = catalog_item("i1", "Chicken", "X-1", "0");
        catalog.portion_size = Some(dec("8"));
        catalog.portion_unit = Some(UnitType::Oz);

        // Extracted row has no portion data; the catalog values survive.
        let session = session_with(vec![fuzzy_result(1, "Chicken Breast", "P-1", catalog)]);
        let batch = build_batch(&session);
        assert_eq!(batch.updated[0].portion_size, Some(dec("8")));
    }

    #[test]
    fn test_apply_failure_applies_nothing() {
        let session = session_with(vec![fuzzy_result(
            1,
            "Lettuce",
            "P-100",
            catalog_item("i1", "Lettuce Iceberg", "X-1", "3"),
        )]);

        let mut store = MemoryStore::failing();
        let err = apply_import(&session, &mut store).unwrap_err();
        assert!(matches!(err, StorageError::WriteFailed(_)));
        assert!(store.load().unwrap().is_empty());
    }
}
