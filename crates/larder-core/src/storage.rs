//! Storage collaborators: the catalog store and the draft side-channel.
//!
//! The core treats these traits as its sole persistence boundary; it does
//! not know whether the backing store is a document database or a file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use crate::detect::Vendor;
use crate::error::StorageError;
use crate::models::item::InventoryItem;
use crate::models::session::{ImportSession, MatchResult};

/// Catalog persistence boundary. `save` upserts by id.
pub trait InventoryStore {
    fn load(&self) -> Result<Vec<InventoryItem>, StorageError>;

    /// Upsert the given items by id, as one batch.
    fn save(&mut self, items: &[InventoryItem]) -> Result<(), StorageError>;

    fn delete(&mut self, id: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: HashMap<String, InventoryItem>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn with_items(items: Vec<InventoryItem>) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.id.clone(), i)).collect(),
            fail_writes: false,
        }
    }

    /// A store whose writes always fail, for exercising apply-failure paths.
    pub fn failing() -> Self {
        Self {
            items: HashMap::new(),
            fail_writes: true,
        }
    }
}

impl InventoryStore for MemoryStore {
    fn load(&self) -> Result<Vec<InventoryItem>, StorageError> {
        let mut items: Vec<InventoryItem> = self.items.values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    fn save(&mut self, items: &[InventoryItem]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::WriteFailed("simulated write failure".into()));
        }
        for item in items {
            self.items.insert(item.id.clone(), item.clone());
        }
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::WriteFailed("simulated write failure".into()));
        }
        self.items.remove(id);
        Ok(())
    }
}

/// JSON-file-backed catalog store.
///
/// The whole catalog is one JSON array; the file is rewritten atomically
/// (write to a temp sibling, then rename) so a failed write never leaves a
/// truncated catalog behind.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<Vec<InventoryItem>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, items: &[InventoryItem]) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl InventoryStore for JsonStore {
    fn load(&self) -> Result<Vec<InventoryItem>, StorageError> {
        self.read_all()
    }

    fn save(&mut self, items: &[InventoryItem]) -> Result<(), StorageError> {
        let mut all = self.read_all()?;
        for item in items {
            match all.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => *existing = item.clone(),
                None => all.push(item.clone()),
            }
        }
        self.write_all(&all)?;
        debug!("saved {} items to {}", items.len(), self.path.display());
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StorageError> {
        let mut all = self.read_all()?;
        all.retain(|item| item.id != id);
        self.write_all(&all)
    }
}

/// Snapshot of an in-flight review session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSnapshot {
    pub id: String,
    pub vendor: Vendor,
    pub file_name: String,
    pub invoice_number: String,
    pub invoice_date: String,
    pub results: Vec<MatchResult>,
    pub saved_at: DateTime<Utc>,
}

impl DraftSnapshot {
    pub fn from_session(session: &ImportSession) -> Self {
        Self {
            id: format!("draft-{}", Utc::now().timestamp_millis()),
            vendor: session.vendor,
            file_name: session.file_name.clone(),
            invoice_number: session.invoice_number.clone(),
            invoice_date: session.invoice_date.clone(),
            results: session.results.clone(),
            saved_at: Utc::now(),
        }
    }
}

/// Draft side-channel: a small key-value snapshot list, capped at the most
/// recent `max_drafts` entries (oldest evicted first).
pub trait DraftStore {
    fn list(&self) -> Result<Vec<DraftSnapshot>, StorageError>;
    fn push(&mut self, draft: DraftSnapshot) -> Result<(), StorageError>;
}

/// JSON-file-backed draft store.
#[derive(Debug)]
pub struct JsonDraftStore {
    path: PathBuf,
    max_drafts: usize,
}

impl JsonDraftStore {
    pub fn new(path: impl Into<PathBuf>, max_drafts: usize) -> Self {
        Self {
            path: path.into(),
            max_drafts,
        }
    }
}

impl DraftStore for JsonDraftStore {
    fn list(&self) -> Result<Vec<DraftSnapshot>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn push(&mut self, draft: DraftSnapshot) -> Result<(), StorageError> {
        let mut drafts = self.list()?;
        drafts.push(draft);

        // Oldest first in the file; evict from the front.
        while drafts.len() > self.max_drafts {
            drafts.remove(0);
        }

        let content = serde_json::to_string_pretty(&drafts)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
