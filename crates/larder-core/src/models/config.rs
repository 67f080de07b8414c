//! Configuration for the import pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the larder pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LarderConfig {
    /// Matching thresholds.
    pub matching: MatchConfig,

    /// Extraction settings.
    pub extraction: ExtractionConfig,

    /// Draft snapshot settings.
    pub drafts: DraftConfig,
}

impl Default for LarderConfig {
    fn default() -> Self {
        Self {
            matching: MatchConfig::default(),
            extraction: ExtractionConfig::default(),
            drafts: DraftConfig::default(),
        }
    }
}

/// Inventory matching thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum name similarity to register a fuzzy candidate.
    pub fuzzy_threshold: f32,

    /// Confidence below which a match requires manual review.
    pub review_threshold: f32,

    /// Fixed confidence assigned to exact SKU+vendor matches.
    pub exact_sku_confidence: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.7,
            review_threshold: 0.95,
            exact_sku_confidence: 0.98,
        }
    }
}

/// Extraction settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum items the primary grammar is expected to yield before the
    /// fallback grammar pass runs.
    pub min_primary_items: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_primary_items: 10,
        }
    }
}

/// Draft snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftConfig {
    /// Most-recent drafts retained; oldest evicted first.
    pub max_drafts: usize,

    /// Draft store location. Empty means the platform default.
    pub draft_dir: PathBuf,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            max_drafts: 10,
            draft_dir: PathBuf::new(),
        }
    }
}

impl LarderConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
