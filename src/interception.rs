//! Entry points the host's generic metadata subsystem calls for products.
//!
//! Each verb looks the key up in the mapping. Unmapped keys come back as
//! [`Intercept::Deferred`] and the host carries on with legacy storage;
//! mapped keys are answered from the product tables as
//! [`Intercept::Handled`].

use crate::ProductId;
use crate::cache::ObjectCache;
use crate::config::CompatConfig;
use crate::core::{MetaValue, Result};
use crate::handlers::{HandlerContext, WriteArgs};
use crate::hooks::HookRegistry;
use crate::mapping::{KeyMapping, Verb, mapping};
use crate::product::ProductRepository;
use crate::storage::{Catalog, StorageEngine};
use log::{debug, warn};
use std::sync::Arc;

/// Outcome of an intercepted call.
#[derive(Debug, Clone, PartialEq)]
pub enum Intercept<T> {
    /// Not handled here; use legacy storage.
    Deferred,
    Handled(T),
}

impl<T> Intercept<T> {
    /// The handled value; `None` tells the host to fall back to legacy
    /// storage.
    pub fn handled(self) -> Option<T> {
        match self {
            Self::Deferred => None,
            Self::Handled(value) => Some(value),
        }
    }
}

pub struct Interceptor {
    storage: Arc<dyn StorageEngine>,
    cache: Arc<ObjectCache>,
    catalog: Catalog,
    hooks: Arc<HookRegistry>,
    products: Arc<dyn ProductRepository>,
    strict_writes: bool,
}

impl Interceptor {
    pub fn new(
        config: &CompatConfig,
        storage: Arc<dyn StorageEngine>,
        cache: Arc<ObjectCache>,
        hooks: Arc<HookRegistry>,
        products: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            storage,
            cache,
            catalog: config.catalog(),
            hooks,
            products,
            strict_writes: config.strict_writes,
        }
    }

    fn context(&self) -> HandlerContext<'_> {
        HandlerContext {
            storage: self.storage.as_ref(),
            cache: &self.cache,
            catalog: &self.catalog,
            hooks: &self.hooks,
            products: self.products.as_ref(),
            strict_writes: self.strict_writes,
        }
    }

    /// Read a key. With `single` the first value is returned, or `""` when
    /// there is none; otherwise the list of values.
    pub fn get(&self, product_id: ProductId, key: &str, single: bool) -> Intercept<MetaValue> {
        let Some(mapped) = mapping().get(key) else {
            return Intercept::Deferred;
        };

        let values = self.read(product_id, key, mapped);
        let result = if single {
            values.into_iter().next().unwrap_or_else(|| MetaValue::text(""))
        } else {
            MetaValue::List(values)
        };
        Intercept::Handled(result)
    }

    /// Add a value. With `unique` the add fails when the key already holds
    /// a value.
    pub fn add(&self, product_id: ProductId, key: &str, value: &MetaValue, unique: bool) -> Intercept<bool> {
        let Some(mapped) = mapping().get(key) else {
            return Intercept::Deferred;
        };

        if unique {
            let existing = self.read(product_id, key, mapped);
            if existing.iter().any(MetaValue::is_truthy) {
                debug!("add of {} on product {} rejected: value exists", key, product_id);
                return Intercept::Handled(false);
            }
        }

        let args = merge(mapped, Verb::Add, product_id, value.clone());
        Intercept::Handled(self.write(key, mapped, Verb::Add, &args))
    }

    /// Update a value, only where it currently equals `prev_value` when one
    /// is given.
    pub fn update(
        &self,
        product_id: ProductId,
        key: &str,
        value: &MetaValue,
        prev_value: &MetaValue,
    ) -> Intercept<bool> {
        let Some(mapped) = mapping().get(key) else {
            return Intercept::Deferred;
        };

        let args = merge(mapped, Verb::Update, product_id, value.clone()).prev_value(prev_value.maybe_serialize());
        Intercept::Handled(self.write(key, mapped, Verb::Update, &args))
    }

    /// Reset a key to its default, on every product with `delete_all`.
    pub fn delete(
        &self,
        product_id: ProductId,
        key: &str,
        prev_value: &MetaValue,
        delete_all: bool,
    ) -> Intercept<bool> {
        let Some(mapped) = mapping().get(key) else {
            return Intercept::Deferred;
        };

        let args = merge(mapped, Verb::Delete, product_id, MetaValue::Null)
            .prev_value(prev_value.maybe_serialize())
            .delete_all(delete_all);
        Intercept::Handled(self.write(key, mapped, Verb::Delete, &args))
    }

    fn read(&self, product_id: ProductId, key: &str, mapped: &KeyMapping) -> Vec<MetaValue> {
        soften(key, Verb::Get, mapped.handler.read(&self.context(), product_id))
    }

    fn write(&self, key: &str, mapped: &KeyMapping, verb: Verb, args: &WriteArgs) -> bool {
        let written = soften(key, verb, mapped.handler.write(&self.context(), args));
        debug!(
            "{} {} on product {} via {}: {}",
            verb, key, args.product_id, mapped.handler, written
        );
        written
    }
}

/// Call arguments merged over the verb's defaults. A fixed default value
/// wins over the caller's.
fn merge(mapped: &KeyMapping, verb: Verb, product_id: ProductId, value: MetaValue) -> WriteArgs {
    let operation = mapped.operation(verb);
    let value = operation.value.clone().unwrap_or(value);
    WriteArgs::new(product_id, value).format(operation.format)
}

fn soften<T: Default>(key: &str, verb: Verb, result: Result<T>) -> T {
    result.unwrap_or_else(|err| {
        warn!("{} of {} failed: {}", verb, key, err);
        T::default()
    })
}
