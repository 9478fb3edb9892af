//! Object cache shared by the handlers.
//!
//! A bounded LRU keyed by `(group, key)`. Reads hand out clones, so callers
//! never hold the lock while talking to storage. Cache operations cannot fail:
//! a poisoned lock is recovered, since every entry is a disposable copy of
//! data that lives in storage anyway.

pub mod keys;

use crate::core::{Row, Value};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

pub use keys::{GROUP_POSTS, GROUP_PRODUCT};

pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    /// Whole product row, column name to cell.
    Row(HashMap<String, Value>),
    /// Column name to the values a single-column read returned.
    Columns(HashMap<String, Vec<Value>>),
    /// Ordered related ids.
    Ids(Vec<i64>),
    /// Raw result rows.
    Rows(Vec<Row>),
    Text(String),
}

pub struct ObjectCache {
    entries: Mutex<LruCache<(String, String), CacheEntry>>,
}

impl ObjectCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<(String, String), CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, group: &str, key: &str) -> Option<CacheEntry> {
        self.lock().get(&(group.to_string(), key.to_string())).cloned()
    }

    pub fn set(&self, group: &str, key: &str, entry: CacheEntry) {
        self.lock().put((group.to_string(), key.to_string()), entry);
    }

    /// Remove an entry. Returns whether something was cached under the key.
    pub fn delete(&self, group: &str, key: &str) -> bool {
        self.lock().pop(&(group.to_string(), key.to_string())).is_some()
    }

    pub fn contains(&self, group: &str, key: &str) -> bool {
        self.lock().contains(&(group.to_string(), key.to_string()))
    }

    pub fn flush(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ObjectCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_do_not_collide() {
        let cache = ObjectCache::default();
        cache.set(GROUP_PRODUCT, "7", CacheEntry::Text("product".into()));
        cache.set(GROUP_POSTS, "7", CacheEntry::Text("post".into()));

        assert_eq!(cache.get(GROUP_PRODUCT, "7"), Some(CacheEntry::Text("product".into())));
        assert!(cache.delete(GROUP_POSTS, "7"));
        assert!(!cache.delete(GROUP_POSTS, "7"));
        assert!(cache.contains(GROUP_PRODUCT, "7"));
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = ObjectCache::new(2);
        cache.set(GROUP_PRODUCT, "a", CacheEntry::Ids(vec![1]));
        cache.set(GROUP_PRODUCT, "b", CacheEntry::Ids(vec![2]));
        cache.get(GROUP_PRODUCT, "a");
        cache.set(GROUP_PRODUCT, "c", CacheEntry::Ids(vec![3]));

        assert!(cache.contains(GROUP_PRODUCT, "a"));
        assert!(!cache.contains(GROUP_PRODUCT, "b"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_still_caches_one() {
        let cache = ObjectCache::new(0);
        cache.set(GROUP_PRODUCT, "a", CacheEntry::Text(String::new()));
        assert_eq!(cache.len(), 1);
    }
}
