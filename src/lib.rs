// ============================================================================
// Product Tables: legacy product metadata over normalized tables
// ============================================================================

pub mod cache;
pub mod config;
pub mod core;
pub mod handlers;
pub mod hooks;
pub mod interception;
pub mod mapping;
pub mod metadata;
pub mod product;
pub mod result;
pub mod script;
pub mod storage;

pub use cache::ObjectCache;
pub use config::CompatConfig;
pub use core::{CompatError, DataType, MetaValue, Result, Value};
pub use hooks::HookRegistry;
pub use interception::{Intercept, Interceptor};
pub use mapping::{Handler, mapping};
pub use metadata::MetadataApi;
pub use product::{MemoryProductRepository, Product, ProductAttribute, ProductRepository};
pub use result::QueryResult;
pub use storage::{Catalog, InMemoryStorage, StorageEngine};

use cache::{CacheEntry, GROUP_PRODUCT, keys};
use std::collections::HashMap;
use std::sync::Arc;
use storage::{Condition, Select, Statement};
use tracing::{Level, event};

/// Numeric id of a product (and of its post).
pub type ProductId = i64;

pub const PRODUCT_POST_TYPE: &str = "product";
pub use handlers::description::VARIATION_POST_TYPE;

// ============================================================================
// Facade
// ============================================================================

/// Product tables with the metadata compatibility layer wired in.
///
/// Opening installs the tables, registers the interception (unless the
/// configuration turns it off) and exposes the generic metadata API that
/// routes product keys into the tables.
///
/// # Examples
///
/// ```
/// use product_tables::{MetaValue, ProductTables};
///
/// # fn main() -> product_tables::Result<()> {
/// let tables = ProductTables::in_memory()?;
/// tables.create_product(7)?;
///
/// let meta = tables.metadata();
/// meta.add(7, "_sku", &MetaValue::text("ABC"), false)?;
/// assert_eq!(meta.get(7, "_sku", true)?, MetaValue::text("ABC"));
/// assert!(meta.raw_values(7, "_sku")?.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct ProductTables {
    config: CompatConfig,
    catalog: Catalog,
    storage: Arc<dyn StorageEngine>,
    cache: Arc<ObjectCache>,
    hooks: Arc<HookRegistry>,
    products: Arc<dyn ProductRepository>,
    interceptor: Arc<Interceptor>,
    metadata: MetadataApi,
}

impl ProductTables {
    /// In-memory tables with the default configuration.
    pub fn in_memory() -> Result<Self> {
        Self::open(CompatConfig::default())
    }

    /// In-memory storage and product repository with `config`.
    pub fn open(config: CompatConfig) -> Result<Self> {
        Self::with_backends(
            config,
            Arc::new(InMemoryStorage::new()),
            Arc::new(MemoryProductRepository::new()),
        )
    }

    pub fn with_backends(
        config: CompatConfig,
        storage: Arc<dyn StorageEngine>,
        products: Arc<dyn ProductRepository>,
    ) -> Result<Self> {
        config.validate().map_err(CompatError::InvalidConfig)?;

        let catalog = config.catalog();
        catalog.install(storage.as_ref())?;

        let cache = Arc::new(ObjectCache::new(config.cache_capacity));
        let hooks = Arc::new(HookRegistry::install(config.backward_compatibility_enabled()));
        let interceptor = Arc::new(Interceptor::new(
            &config,
            Arc::clone(&storage),
            Arc::clone(&cache),
            Arc::clone(&hooks),
            Arc::clone(&products),
        ));
        let metadata = MetadataApi::new(
            Arc::clone(&storage),
            catalog.clone(),
            Arc::clone(&hooks),
            Arc::clone(&interceptor),
        );

        event!(
            Level::INFO,
            prefix = %config.table_prefix,
            registered = hooks.is_registered(),
            "product tables opened"
        );

        Ok(Self {
            config,
            catalog,
            storage,
            cache,
            hooks,
            products,
            interceptor,
            metadata,
        })
    }

    /// Create a product: its post, its row with column defaults and its
    /// product object.
    pub fn create_product(&self, product_id: ProductId) -> Result<()> {
        self.create(product_id, PRODUCT_POST_TYPE)
    }

    /// Create a variation, which is a product with a variation post.
    pub fn create_variation(&self, product_id: ProductId) -> Result<()> {
        self.create(product_id, VARIATION_POST_TYPE)
    }

    fn create(&self, product_id: ProductId, post_type: &str) -> Result<()> {
        if product_id <= 0 {
            return Err(CompatError::ProductNotFound(product_id));
        }

        self.storage.execute(&Statement::Insert {
            table: self.catalog.posts.clone(),
            values: vec![
                ("ID".into(), product_id.into()),
                ("post_type".into(), post_type.into()),
            ],
        })?;
        self.storage.execute(&Statement::Insert {
            table: self.catalog.products.clone(),
            values: vec![("product_id".into(), product_id.into())],
        })?;

        let _suspended = self.hooks.suspend();
        if self.products.find(product_id)?.is_none() {
            self.products.save(&Product::new(product_id))?;
        }

        event!(Level::DEBUG, product_id, post_type, "product created");
        Ok(())
    }

    /// The product row keyed by column name, through the canonical cache.
    pub fn product_row(&self, product_id: ProductId) -> Result<Option<HashMap<String, Value>>> {
        let key = keys::product(product_id);
        if let Some(CacheEntry::Row(row)) = self.cache.get(GROUP_PRODUCT, &key) {
            return Ok(Some(row));
        }

        let result = self.storage.execute(&Statement::Select(
            Select::from(&self.catalog.products).filter(Condition::eq("product_id", product_id)),
        ))?;
        let Some(cells) = result.rows.into_iter().next() else {
            return Ok(None);
        };

        let row: HashMap<String, Value> = result.columns.into_iter().zip(cells).collect();
        self.cache.set(GROUP_PRODUCT, &key, CacheEntry::Row(row.clone()));
        Ok(Some(row))
    }

    pub fn metadata(&self) -> &MetadataApi {
        &self.metadata
    }

    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn cache(&self) -> &ObjectCache {
        &self.cache
    }

    pub fn storage(&self) -> &dyn StorageEngine {
        self.storage.as_ref()
    }

    pub fn products(&self) -> &dyn ProductRepository {
        self.products.as_ref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &CompatConfig {
        &self.config
    }
}
