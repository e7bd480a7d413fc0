//! Generic per-item key/value metadata storage.
//!
//! The allow-list is one metadata record among whatever else the host keeps
//! per item. [`MetaStore`] is the seam to that storage; the access-list
//! store never talks to anything else.
//!
//! Two implementations are provided:
//!
//! - [`MemoryMetaStore`]: in-process map, used by tests and embedders that
//!   already hold metadata in memory
//! - [`JsonFileMetaStore`]: a single JSON document on disk, rewritten on
//!   every mutation
//!
//! Each call reads or writes one record under a lock, which is the only
//! atomicity the access-control layer relies on.

use privet_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::types::ItemId;

// ============================================================================
// Trait
// ============================================================================

/// Key/value metadata attached to catalog items.
pub trait MetaStore: Send + Sync {
    /// Read one metadata value.
    fn get_meta(&self, item: &ItemId, key: &str) -> Result<Option<String>>;

    /// Create or overwrite one metadata value.
    fn update_meta(&self, item: &ItemId, key: &str, value: &str) -> Result<()>;

    /// Remove one metadata value. Returns whether a value was removed.
    fn delete_meta(&self, item: &ItemId, key: &str) -> Result<bool>;

    /// Every item that has a value under `key`.
    fn items_with_key(&self, key: &str) -> Result<BTreeSet<ItemId>>;
}

impl<T: MetaStore + ?Sized> MetaStore for std::sync::Arc<T> {
    fn get_meta(&self, item: &ItemId, key: &str) -> Result<Option<String>> {
        (**self).get_meta(item, key)
    }

    fn update_meta(&self, item: &ItemId, key: &str, value: &str) -> Result<()> {
        (**self).update_meta(item, key, value)
    }

    fn delete_meta(&self, item: &ItemId, key: &str) -> Result<bool> {
        (**self).delete_meta(item, key)
    }

    fn items_with_key(&self, key: &str) -> Result<BTreeSet<ItemId>> {
        (**self).items_with_key(key)
    }
}

// ============================================================================
// Document
// ============================================================================

/// Serializable form of all item metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaDocument {
    /// Metadata per item, keyed by metadata key.
    #[serde(default)]
    pub items: BTreeMap<ItemId, BTreeMap<String, String>>,
}

impl MetaDocument {
    fn get(&self, item: &ItemId, key: &str) -> Option<String> {
        self.items.get(item).and_then(|meta| meta.get(key)).cloned()
    }

    fn update(&mut self, item: &ItemId, key: &str, value: &str) {
        self.items
            .entry(item.clone())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    fn delete(&mut self, item: &ItemId, key: &str) -> bool {
        let Some(meta) = self.items.get_mut(item) else {
            return false;
        };
        let removed = meta.remove(key).is_some();
        if meta.is_empty() {
            self.items.remove(item);
        }
        removed
    }

    fn items_with_key(&self, key: &str) -> BTreeSet<ItemId> {
        self.items
            .iter()
            .filter(|(_, meta)| meta.contains_key(key))
            .map(|(id, _)| id.clone())
            .collect()
    }
}

// ============================================================================
// MemoryMetaStore
// ============================================================================

/// In-memory metadata store.
#[derive(Debug, Default)]
pub struct MemoryMetaStore {
    doc: RwLock<MetaDocument>,
}

impl MemoryMetaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated from a document.
    pub fn from_document(doc: MetaDocument) -> Self {
        Self {
            doc: RwLock::new(doc),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MetaDocument>> {
        self.doc
            .read()
            .map_err(|_| Error::operation("metadata lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MetaDocument>> {
        self.doc
            .write()
            .map_err(|_| Error::operation("metadata lock poisoned"))
    }
}

impl MetaStore for MemoryMetaStore {
    fn get_meta(&self, item: &ItemId, key: &str) -> Result<Option<String>> {
        Ok(self.read()?.get(item, key))
    }

    fn update_meta(&self, item: &ItemId, key: &str, value: &str) -> Result<()> {
        self.write()?.update(item, key, value);
        Ok(())
    }

    fn delete_meta(&self, item: &ItemId, key: &str) -> Result<bool> {
        Ok(self.write()?.delete(item, key))
    }

    fn items_with_key(&self, key: &str) -> Result<BTreeSet<ItemId>> {
        Ok(self.read()?.items_with_key(key))
    }
}

// ============================================================================
// JsonFileMetaStore
// ============================================================================

/// Metadata store backed by one JSON file.
///
/// The whole document is loaded at open and written back after each
/// mutation. A missing file opens as an empty store and is created on the
/// first write.
#[derive(Debug)]
pub struct JsonFileMetaStore {
    path: PathBuf,
    inner: MemoryMetaStore,
}

impl JsonFileMetaStore {
    /// Open (or prepare to create) the store at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or is not a valid
    /// metadata document.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = if path.exists() {
            let json =
                std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
            serde_json::from_str(&json).map_err(|e| {
                Error::invalid_data(format!(
                    "Failed to parse metadata file {}: {e}",
                    path.display()
                ))
            })?
        } else {
            log::debug!("Metadata file {} not found, starting empty", path.display());
            MetaDocument::default()
        };

        Ok(Self {
            path,
            inner: MemoryMetaStore::from_document(doc),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, doc: &MetaDocument) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
        }
        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| Error::operation(format!("Failed to serialize metadata: {e}")))?;
        std::fs::write(&self.path, json).map_err(|e| Error::io_with_path(e, &self.path))
    }
}

impl MetaStore for JsonFileMetaStore {
    fn get_meta(&self, item: &ItemId, key: &str) -> Result<Option<String>> {
        self.inner.get_meta(item, key)
    }

    fn update_meta(&self, item: &ItemId, key: &str, value: &str) -> Result<()> {
        let mut doc = self.inner.write()?;
        let mut next = doc.clone();
        next.update(item, key, value);
        self.persist(&next)?;
        *doc = next;
        Ok(())
    }

    fn delete_meta(&self, item: &ItemId, key: &str) -> Result<bool> {
        let mut doc = self.inner.write()?;
        let mut next = doc.clone();
        if !next.delete(item, key) {
            return Ok(false);
        }
        self.persist(&next)?;
        *doc = next;
        Ok(true)
    }

    fn items_with_key(&self, key: &str) -> Result<BTreeSet<ItemId>> {
        self.inner.items_with_key(key)
    }
}
