//! Generic post metadata API with flat legacy storage.
//!
//! This is the host side of the interception: every call is offered to the
//! [`Interceptor`] while the hooks are active, and only deferred calls reach
//! the `postmeta` table. Non-scalar values are stored serialized.

use crate::ProductId;
use crate::core::{MetaValue, Result};
use crate::hooks::HookRegistry;
use crate::interception::{Intercept, Interceptor};
use crate::storage::{Catalog, Condition, Select, Statement, StorageEngine};
use log::debug;
use std::sync::Arc;

pub struct MetadataApi {
    storage: Arc<dyn StorageEngine>,
    catalog: Catalog,
    hooks: Arc<HookRegistry>,
    interceptor: Arc<Interceptor>,
}

impl MetadataApi {
    pub fn new(
        storage: Arc<dyn StorageEngine>,
        catalog: Catalog,
        hooks: Arc<HookRegistry>,
        interceptor: Arc<Interceptor>,
    ) -> Self {
        Self {
            storage,
            catalog,
            hooks,
            interceptor,
        }
    }

    fn intercept<T>(&self, call: impl FnOnce(&Interceptor) -> Intercept<T>) -> Intercept<T> {
        if self.hooks.is_active() {
            call(&self.interceptor)
        } else {
            Intercept::Deferred
        }
    }

    pub fn get(&self, post_id: ProductId, key: &str, single: bool) -> Result<MetaValue> {
        let empty = || {
            if single {
                MetaValue::text("")
            } else {
                MetaValue::List(Vec::new())
            }
        };
        if post_id <= 0 {
            return Ok(empty());
        }

        if let Some(value) = self.intercept(|layer| layer.get(post_id, key, single)).handled() {
            return Ok(value);
        }

        let values = self.raw_values(post_id, key)?;
        Ok(if single {
            values.into_iter().next().unwrap_or_else(empty)
        } else {
            MetaValue::List(values)
        })
    }

    pub fn add(&self, post_id: ProductId, key: &str, value: &MetaValue, unique: bool) -> Result<bool> {
        if post_id <= 0 || key.is_empty() {
            return Ok(false);
        }

        if let Some(added) = self.intercept(|layer| layer.add(post_id, key, value, unique)).handled() {
            return Ok(added);
        }

        if unique && !self.raw_values(post_id, key)?.is_empty() {
            return Ok(false);
        }

        self.storage.execute(&Statement::Insert {
            table: self.catalog.postmeta.clone(),
            values: vec![
                ("post_id".into(), post_id.into()),
                ("meta_key".into(), key.into()),
                ("meta_value".into(), stored_text(value).into()),
            ],
        })?;
        debug!("legacy meta {} added to post {}", key, post_id);
        Ok(true)
    }

    /// Update a value, adding it when the key is not stored yet.
    pub fn update(&self, post_id: ProductId, key: &str, value: &MetaValue, prev_value: &MetaValue) -> Result<bool> {
        if post_id <= 0 || key.is_empty() {
            return Ok(false);
        }

        if let Some(updated) = self
            .intercept(|layer| layer.update(post_id, key, value, prev_value))
            .handled()
        {
            return Ok(updated);
        }

        let existing = self.raw_values(post_id, key)?;
        if existing.is_empty() {
            return self.add(post_id, key, value, false);
        }

        let new_text = stored_text(value);
        let mut filter = self.key_filter(post_id, key);
        if prev_value.is_empty() {
            if existing.len() == 1 && stored_text(&existing[0]) == new_text {
                return Ok(false);
            }
        } else {
            filter.push(Condition::eq("meta_value", stored_text(prev_value)));
        }

        let affected = self
            .storage
            .execute(&Statement::Update {
                table: self.catalog.postmeta.clone(),
                assignments: vec![("meta_value".into(), new_text.into())],
                filter,
            })?
            .affected_rows;
        Ok(affected > 0)
    }

    /// Delete a key from the post, or from every post with `delete_all`.
    /// A non-empty `value` restricts the delete to rows holding it.
    pub fn delete(&self, post_id: ProductId, key: &str, value: &MetaValue, delete_all: bool) -> Result<bool> {
        if key.is_empty() || (post_id <= 0 && !delete_all) {
            return Ok(false);
        }

        if let Some(deleted) = self
            .intercept(|layer| layer.delete(post_id, key, value, delete_all))
            .handled()
        {
            return Ok(deleted);
        }

        let mut filter = vec![Condition::eq("meta_key", key)];
        if !delete_all {
            filter.push(Condition::eq("post_id", post_id));
        }
        if !value.is_empty() {
            filter.push(Condition::eq("meta_value", stored_text(value)));
        }

        let affected = self
            .storage
            .execute(&Statement::Delete {
                table: self.catalog.postmeta.clone(),
                filter,
            })?
            .affected_rows;
        Ok(affected > 0)
    }

    /// Values stored for the key in legacy storage, bypassing interception.
    pub fn raw_values(&self, post_id: ProductId, key: &str) -> Result<Vec<MetaValue>> {
        let mut select = Select::from(&self.catalog.postmeta).columns(&["meta_value"]);
        for condition in self.key_filter(post_id, key) {
            select = select.filter(condition);
        }

        Ok(self
            .storage
            .execute(&Statement::Select(select))?
            .first_column()
            .into_iter()
            .map(|value| match value.as_str() {
                Some(text) => MetaValue::maybe_unserialize(text),
                None => MetaValue::from(value),
            })
            .collect())
    }

    fn key_filter(&self, post_id: ProductId, key: &str) -> Vec<Condition> {
        vec![Condition::eq("post_id", post_id), Condition::eq("meta_key", key)]
    }
}

fn stored_text(value: &MetaValue) -> String {
    value.maybe_serialize().to_legacy_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ObjectCache;
    use crate::config::CompatConfig;
    use crate::product::MemoryProductRepository;
    use crate::storage::InMemoryStorage;

    fn api(enabled: bool) -> MetadataApi {
        let config = CompatConfig::default();
        let storage: Arc<dyn StorageEngine> = Arc::new(InMemoryStorage::new());
        config.catalog().install(storage.as_ref()).unwrap();
        let hooks = Arc::new(HookRegistry::install(enabled));
        let interceptor = Interceptor::new(
            &config,
            Arc::clone(&storage),
            Arc::new(ObjectCache::default()),
            Arc::clone(&hooks),
            Arc::new(MemoryProductRepository::new()),
        );
        MetadataApi::new(storage, config.catalog(), hooks, Arc::new(interceptor))
    }

    #[test]
    fn test_unmapped_key_uses_legacy_storage() {
        let api = api(true);
        assert!(api.add(7, "_edit_lock", &MetaValue::text("123:1"), false).unwrap());
        assert_eq!(api.get(7, "_edit_lock", true).unwrap(), MetaValue::text("123:1"));
        assert_eq!(api.raw_values(7, "_edit_lock").unwrap().len(), 1);

        assert!(api.update(7, "_edit_lock", &MetaValue::text("456:1"), &MetaValue::Null).unwrap());
        assert!(!api.update(7, "_edit_lock", &MetaValue::text("456:1"), &MetaValue::Null).unwrap());
        assert!(api.delete(7, "_edit_lock", &MetaValue::Null, false).unwrap());
        assert_eq!(api.get(7, "_edit_lock", false).unwrap(), MetaValue::List(vec![]));
    }

    #[test]
    fn test_arrays_are_stored_serialized() {
        let api = api(true);
        let value = MetaValue::list(["a", "b"]);
        api.add(7, "_custom", &value, false).unwrap();
        assert_eq!(api.get(7, "_custom", true).unwrap(), value);
    }

    #[test]
    fn test_unique_add_on_legacy_key() {
        let api = api(true);
        assert!(api.add(7, "_custom", &MetaValue::text("a"), true).unwrap());
        assert!(!api.add(7, "_custom", &MetaValue::text("b"), true).unwrap());
        assert!(api.add(7, "_custom", &MetaValue::text("b"), false).unwrap());
        assert_eq!(api.get(7, "_custom", false).unwrap(), MetaValue::list(["a", "b"]));
    }

    #[test]
    fn test_disabled_hooks_write_mapped_keys_to_legacy_storage() {
        let api = api(false);
        assert!(api.add(7, "_sku", &MetaValue::text("ABC"), false).unwrap());
        assert_eq!(api.raw_values(7, "_sku").unwrap(), vec![MetaValue::text("ABC")]);
    }

    #[test]
    fn test_delete_all_spans_posts() {
        let api = api(true);
        api.add(1, "_custom", &MetaValue::text("x"), false).unwrap();
        api.add(2, "_custom", &MetaValue::text("x"), false).unwrap();
        api.add(3, "_custom", &MetaValue::text("y"), false).unwrap();

        assert!(api.delete(0, "_custom", &MetaValue::text("x"), true).unwrap());
        assert!(api.raw_values(1, "_custom").unwrap().is_empty());
        assert_eq!(api.raw_values(3, "_custom").unwrap().len(), 1);
    }
}
