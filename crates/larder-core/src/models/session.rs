//! Import session aggregate: match results, summary counters, stage state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::detect::Vendor;
use crate::models::item::{ExtractedLineItem, InventoryItem};

/// How an extracted item was paired with the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Keyed on identical vendor SKU and vendor identity.
    ExactSku,
    /// Best name-similarity candidate above the fuzzy threshold.
    FuzzyName,
    /// No candidate registered; the item is new to the catalog.
    New,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::ExactSku => write!(f, "exact_sku"),
            MatchType::FuzzyName => write!(f, "fuzzy_name"),
            MatchType::New => write!(f, "new"),
        }
    }
}

/// Stable identifier for a match result within a session.
///
/// Review operations address results by id, not list position: skip and
/// duplicate shift positions, and a cached index would go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchResultId(pub u64);

impl fmt::Display for MatchResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Pairing of one extracted line item with zero-or-one catalog entry.
///
/// Invariants: `is_new_item` implies `matched_item` is `None`; an exact SKU
/// match carries the fixed confidence 0.98.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: MatchResultId,

    /// The extracted invoice row (owned; edited during review).
    pub extracted_item: ExtractedLineItem,

    /// Point-in-time snapshot of the matched catalog entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_item: Option<InventoryItem>,

    pub match_type: MatchType,

    /// Match certainty, 0 to 1.
    pub confidence: f32,

    /// Set at creation when confidence < the review threshold.
    pub requires_review: bool,

    pub is_new_item: bool,
}

/// Summary counters over the current match-result list.
///
/// Always recomputed from scratch after a mutation, never tracked
/// incrementally, so the counters cannot drift from the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_items: usize,
    /// Results matched with confidence at or above the review threshold.
    pub auto_matched: usize,
    pub needs_review: usize,
    pub new_items: usize,
    /// Items with a recognized portion expression in their description.
    pub portions_parsed: usize,
}

/// Stage of the current extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStage {
    Idle,
    Detecting,
    Extracting,
    Succeeded,
    Failed(String),
}

/// Aggregate root for one upload. A new upload replaces the prior session;
/// there is no concurrent mutation of session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSession {
    pub vendor: Vendor,

    pub invoice_number: String,

    /// ISO-formatted invoice date.
    pub invoice_date: String,

    pub file_name: String,

    /// Ordered match results (order preserved from extraction).
    pub results: Vec<MatchResult>,

    pub summary: ImportSummary,

    pub stage: ImportStage,

    /// Confidence at or above which a match counts as auto-matched.
    pub review_threshold: f32,

    pub created_at: DateTime<Utc>,

    pub(crate) next_result_id: u64,
}

impl ImportSession {
    pub fn result(&self, id: MatchResultId) -> Option<&MatchResult> {
        self.results.iter().find(|r| r.id == id)
    }

    /// Ordered ids of the current results, for display layers.
    pub fn result_ids(&self) -> Vec<MatchResultId> {
        self.results.iter().map(|r| r.id).collect()
    }
}
