//! Fuzzy matching of extracted line items against the inventory catalog.
//!
//! Complexity is O(items x catalog x name_length^2) from the edit-distance
//! computation. That is acceptable for catalogs in the thousands; if it ever
//! becomes a bottleneck, do not swap in an approximation that changes match
//! results — the thresholds below are calibrated to exact similarity.

use tracing::debug;

use crate::models::config::MatchConfig;
use crate::models::item::{ExtractedLineItem, InventoryItem};
use crate::models::session::{MatchResult, MatchResultId, MatchType};

/// Levenshtein edit distance, two-row dynamic programming.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalized edit-distance similarity: 1 - distance / max_len.
///
/// Symmetric; identical strings score 1, including two empty strings.
pub fn string_similarity(a: &str, b: &str) -> f32 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f32 / max_len as f32
}

/// Match extracted items against a point-in-time catalog snapshot.
///
/// One result per item, order preserved. Ids are assigned sequentially
/// starting at `first_id`.
pub fn match_items(
    extracted: Vec<ExtractedLineItem>,
    catalog: &[InventoryItem],
    config: &MatchConfig,
    first_id: u64,
) -> Vec<MatchResult> {
    let mut results = Vec::with_capacity(extracted.len());

    for (offset, item) in extracted.into_iter().enumerate() {
        let result = match_one(item, catalog, config, MatchResultId(first_id + offset as u64));
        results.push(result);
    }

    results
}

fn match_one(
    item: ExtractedLineItem,
    catalog: &[InventoryItem],
    config: &MatchConfig,
    id: MatchResultId,
) -> MatchResult {
    // Exact SKU + vendor short-circuits with fixed confidence; it overrides
    // any fuzzy result that a name scan would find.
    if let Some(exact) = catalog
        .iter()
        .find(|c| c.vendor_sku == item.vendor_sku && c.primary_vendor == item.primary_vendor)
    {
        debug!("exact SKU match for {} -> {}", item.vendor_sku, exact.id);
        return build_result(
            id,
            item,
            Some(exact.clone()),
            MatchType::ExactSku,
            config.exact_sku_confidence,
            config,
        );
    }

    // Best name similarity over the whole catalog.
    let name_lower = item.name.to_lowercase();
    let mut best: Option<(&InventoryItem, f32)> = None;
    for candidate in catalog {
        let similarity = string_similarity(&name_lower, &candidate.name.to_lowercase());
        if best.is_none_or(|(_, s)| similarity > s) {
            best = Some((candidate, similarity));
        }
    }

    match best {
        Some((candidate, similarity)) if similarity > config.fuzzy_threshold => {
            debug!(
                "fuzzy match for '{}' -> '{}' ({:.2})",
                item.name, candidate.name, similarity
            );
            build_result(
                id,
                item,
                Some(candidate.clone()),
                MatchType::FuzzyName,
                similarity,
                config,
            )
        }
        _ => build_result(id, item, None, MatchType::New, 0.0, config),
    }
}

fn build_result(
    id: MatchResultId,
    item: ExtractedLineItem,
    matched: Option<InventoryItem>,
    match_type: MatchType,
    confidence: f32,
    config: &MatchConfig,
) -> MatchResult {
    let is_new_item = match_type == MatchType::New;
    MatchResult {
        id,
        extracted_item: item,
        matched_item: if is_new_item { None } else { matched },
        match_type,
        confidence,
        requires_review: confidence < config.review_threshold,
        is_new_item,
    }
}
