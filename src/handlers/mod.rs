//! Handlers translating legacy metadata into the product tables.
//!
//! Every handler fails soft on missing identifiers: reads return an empty
//! list and writes return `false`. Storage failures come back as `Err` and
//! are turned into the same soft results by the interceptor.

pub mod attributes;
pub mod column;
pub mod description;
pub mod downloads;
pub mod relationship;
pub mod stock;

use crate::ProductId;
use crate::cache::ObjectCache;
use crate::core::meta::Format;
use crate::core::{MetaValue, Result, Value};
use crate::hooks::HookRegistry;
use crate::mapping::Handler;
use crate::product::ProductRepository;
use crate::result::QueryResult;
use crate::storage::{Catalog, Statement, StorageEngine};
use tracing::{Level, event};

/// Collaborators a handler call works against.
pub struct HandlerContext<'a> {
    pub storage: &'a dyn StorageEngine,
    pub cache: &'a ObjectCache,
    pub catalog: &'a Catalog,
    pub hooks: &'a HookRegistry,
    pub products: &'a dyn ProductRepository,
    pub strict_writes: bool,
}

impl HandlerContext<'_> {
    pub fn execute(&self, statement: &Statement) -> Result<QueryResult> {
        self.storage.execute(statement)
    }

    /// Run the statements of a multi-statement write in order.
    ///
    /// Without strict writes a failing statement is logged and the pass goes
    /// on. With strict writes the first failure stops the pass and is
    /// returned.
    pub fn execute_pass(&self, statements: impl IntoIterator<Item = Statement>) -> Result<()> {
        for statement in statements {
            if let Err(err) = self.storage.execute(&statement) {
                if self.strict_writes {
                    return Err(err);
                }
                event!(Level::WARN, sql = %statement, error = %err, "write pass statement failed");
            }
        }
        Ok(())
    }
}

/// Arguments of a write, after the mapping defaults were merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteArgs {
    pub product_id: ProductId,
    pub value: MetaValue,
    pub format: Format,
    /// Serialized expected previous value. Empty means no constraint.
    pub prev_value: MetaValue,
    pub delete_all: bool,
}

impl WriteArgs {
    pub fn new(product_id: ProductId, value: impl Into<MetaValue>) -> Self {
        Self {
            product_id,
            value: value.into(),
            format: Format::Raw,
            prev_value: MetaValue::Null,
            delete_all: false,
        }
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn prev_value(mut self, prev_value: impl Into<MetaValue>) -> Self {
        self.prev_value = prev_value.into();
        self
    }

    pub fn delete_all(mut self, delete_all: bool) -> Self {
        self.delete_all = delete_all;
        self
    }

    /// The expected previous value, if one constrains the write.
    pub fn prev_constraint(&self) -> Option<&MetaValue> {
        if self.prev_value.is_empty() {
            None
        } else {
            Some(&self.prev_value)
        }
    }
}

impl Handler {
    /// Legacy values stored under the key, in the shape the host's get
    /// primitive returns.
    pub fn read(&self, ctx: &HandlerContext<'_>, product_id: ProductId) -> Result<Vec<MetaValue>> {
        match *self {
            Handler::Column(column) => Ok(legacy_values(column::get(ctx, product_id, column)?)),
            Handler::Relationship(relation) => relationship::get(ctx, product_id, relation),
            Handler::VariationDescription => description::get(ctx, product_id),
            Handler::ManageStock => stock::get(ctx, product_id),
            Handler::DownloadableFiles => downloads::get(ctx, product_id),
            Handler::Attributes => attributes::get(ctx, product_id),
            Handler::DefaultAttributes => attributes::get_defaults(ctx, product_id),
        }
    }

    /// Apply a write. Add, update and delete all land here; they differ
    /// only in the arguments.
    pub fn write(&self, ctx: &HandlerContext<'_>, args: &WriteArgs) -> Result<bool> {
        match *self {
            Handler::Column(column) => column::update(ctx, column, args),
            Handler::Relationship(relation) => relationship::update(ctx, args.product_id, relation, &args.value),
            Handler::VariationDescription => description::set(ctx, args),
            Handler::ManageStock => stock::set(ctx, args),
            Handler::DownloadableFiles => downloads::update(ctx, args.product_id, &args.value),
            Handler::Attributes => attributes::update(ctx, args.product_id, &args.value),
            Handler::DefaultAttributes => attributes::update_defaults(ctx, args.product_id, &args.value),
        }
    }
}

/// Column cells as legacy values. NULL and empty text carry no value.
pub fn legacy_values(values: Vec<Value>) -> Vec<MetaValue> {
    values
        .into_iter()
        .filter(|value| match value {
            Value::Null => false,
            Value::Text(s) => !s.is_empty(),
            _ => true,
        })
        .map(MetaValue::from)
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::product::MemoryProductRepository;
    use crate::storage::InMemoryStorage;

    /// Owned collaborators for handler unit tests.
    pub struct Fixture {
        pub storage: InMemoryStorage,
        pub cache: ObjectCache,
        pub catalog: Catalog,
        pub hooks: HookRegistry,
        pub products: MemoryProductRepository,
        pub strict_writes: bool,
    }

    impl Fixture {
        pub fn new() -> Self {
            let storage = InMemoryStorage::new();
            let catalog = Catalog::new("wp_");
            catalog.install(&storage).unwrap();
            Self {
                storage,
                cache: ObjectCache::default(),
                catalog,
                hooks: HookRegistry::install(true),
                products: MemoryProductRepository::new(),
                strict_writes: false,
            }
        }

        pub fn ctx(&self) -> HandlerContext<'_> {
            HandlerContext {
                storage: &self.storage,
                cache: &self.cache,
                catalog: &self.catalog,
                hooks: &self.hooks,
                products: &self.products,
                strict_writes: self.strict_writes,
            }
        }

        pub fn insert_product(&self, product_id: ProductId) {
            self.storage
                .execute(&Statement::Insert {
                    table: self.catalog.products.clone(),
                    values: vec![("product_id".into(), product_id.into())],
                })
                .unwrap();
        }

        pub fn insert_post(&self, id: ProductId, post_type: &str, content: &str) {
            self.storage
                .execute(&Statement::Insert {
                    table: self.catalog.posts.clone(),
                    values: vec![
                        ("ID".into(), id.into()),
                        ("post_type".into(), post_type.into()),
                        ("post_content".into(), content.into()),
                    ],
                })
                .unwrap();
        }
    }
}
