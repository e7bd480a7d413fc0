//! Access-list persistence.
//!
//! [`AccessListStore`] owns the one metadata key that holds an item's
//! allow-list. It is the only writer of that key.

use privet_core::Result;
use std::collections::BTreeSet;

use crate::codec;
use crate::meta::MetaStore;
use crate::types::{AccessList, ItemId, ViewerSet};

/// Metadata key used when none is configured.
pub const DEFAULT_META_KEY: &str = "restrict-user-list";

/// Reads and writes per-item allow-lists on top of a [`MetaStore`].
#[derive(Debug)]
pub struct AccessListStore<M> {
    meta: M,
    key: String,
}

impl<M: MetaStore> AccessListStore<M> {
    /// Create a store using [`DEFAULT_META_KEY`].
    pub fn new(meta: M) -> Self {
        Self::with_key(meta, DEFAULT_META_KEY)
    }

    /// Create a store using a custom metadata key.
    pub fn with_key(meta: M, key: impl Into<String>) -> Self {
        Self {
            meta,
            key: key.into(),
        }
    }

    /// The metadata key holding allow-lists.
    pub fn meta_key(&self) -> &str {
        &self.key
    }

    /// The underlying metadata store.
    pub fn meta(&self) -> &M {
        &self.meta
    }

    /// Read an item's allow-list.
    ///
    /// `None` means no record (public). A record that cannot be decoded is
    /// returned as an empty set.
    pub fn get(&self, item: &ItemId) -> Result<Option<ViewerSet>> {
        Ok(self
            .meta
            .get_meta(item, &self.key)?
            .map(|raw| codec::decode(&raw)))
    }

    /// Read an item's allow-list as an [`AccessList`].
    pub fn access_list(&self, item: &ItemId) -> Result<AccessList> {
        self.get(item).map(AccessList::from_record)
    }

    /// Store an allow-list, replacing any previous one.
    pub fn set(&self, item: &ItemId, viewers: &ViewerSet) -> Result<()> {
        let raw = codec::encode(viewers)?;
        log::debug!("Restricting item {item} to {} viewer(s)", viewers.len());
        self.meta.update_meta(item, &self.key, &raw)
    }

    /// Remove an item's allow-list, making it public.
    ///
    /// Returns whether a record was removed.
    pub fn delete(&self, item: &ItemId) -> Result<bool> {
        let removed = self.meta.delete_meta(item, &self.key)?;
        if removed {
            log::debug!("Item {item} is public again");
        }
        Ok(removed)
    }

    /// Every item that carries an allow-list record, whatever its contents.
    pub fn restricted_items(&self) -> Result<BTreeSet<ItemId>> {
        self.meta.items_with_key(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MemoryMetaStore;
    use crate::types::ViewerId;

    fn set(ids: &[&str]) -> ViewerSet {
        ids.iter().map(|id| ViewerId::new(*id)).collect()
    }

    fn store() -> AccessListStore<MemoryMetaStore> {
        AccessListStore::new(MemoryMetaStore::new())
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = store();
        assert_eq!(store.get(&"p1".into()).unwrap(), None);
        assert_eq!(store.access_list(&"p1".into()).unwrap(), AccessList::Public);
    }

    #[test]
    fn test_set_then_get() {
        let store = store();
        let item = ItemId::new("p1");
        store.set(&item, &set(&["5", "12"])).unwrap();

        assert_eq!(store.get(&item).unwrap(), Some(set(&["12", "5"])));
        assert_eq!(
            store
                .meta()
                .get_meta(&item, DEFAULT_META_KEY)
                .unwrap()
                .as_deref(),
            Some(r#"["12","5"]"#)
        );
    }

    #[test]
    fn test_set_overwrites() {
        let store = store();
        let item = ItemId::new("p1");
        store.set(&item, &set(&["1"])).unwrap();
        store.set(&item, &set(&["2"])).unwrap();
        assert_eq!(store.get(&item).unwrap(), Some(set(&["2"])));
    }

    #[test]
    fn test_delete_makes_public() {
        let store = store();
        let item = ItemId::new("p1");
        store.set(&item, &set(&["1"])).unwrap();

        assert!(store.delete(&item).unwrap());
        assert_eq!(store.get(&item).unwrap(), None);
        assert!(!store.delete(&item).unwrap());
    }

    #[test]
    fn test_empty_record_is_restricted_to_nobody() {
        let store = store();
        let item = ItemId::new("p1");
        store.set(&item, &ViewerSet::new()).unwrap();
        assert_eq!(
            store.access_list(&item).unwrap(),
            AccessList::RestrictedTo(ViewerSet::new())
        );
    }

    #[test]
    fn test_malformed_record_decodes_empty() {
        let store = store();
        let item = ItemId::new("p1");
        store
            .meta()
            .update_meta(&item, DEFAULT_META_KEY, "a:1:{i:0;s:1:\"5\";}")
            .unwrap();
        assert_eq!(store.get(&item).unwrap(), Some(ViewerSet::new()));
    }

    #[test]
    fn test_custom_key() {
        let store = AccessListStore::with_key(MemoryMetaStore::new(), "_private_to");
        let item = ItemId::new("p1");
        store.set(&item, &set(&["9"])).unwrap();

        assert_eq!(store.meta_key(), "_private_to");
        assert!(store
            .meta()
            .get_meta(&item, DEFAULT_META_KEY)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_restricted_items() {
        let store = store();
        store.set(&"a".into(), &set(&["1"])).unwrap();
        store.set(&"b".into(), &ViewerSet::new()).unwrap();
        store.meta().update_meta(&"c".into(), "_sku", "X").unwrap();

        let restricted = store.restricted_items().unwrap();
        assert_eq!(restricted.len(), 2);
        assert!(restricted.contains(&ItemId::new("a")));
        assert!(restricted.contains(&ItemId::new("b")));
    }
}
