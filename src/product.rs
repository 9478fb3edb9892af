//! The product object the attribute handlers delegate to.
//!
//! Only the slice of the product the compatibility layer touches is modeled:
//! the structured attribute list and the default attribute selection. How a
//! product is loaded and saved is behind [`ProductRepository`].

use crate::ProductId;
use crate::core::{MetaValue, Result};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;
use std::sync::RwLock;

lazy_static::lazy_static! {
    static ref TAGS: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref DISALLOWED: Regex = Regex::new(r"[^\p{L}\p{N}\s_-]").unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[\s-]+").unwrap();
}

/// Lowercase, dash-separated slug of a title.
pub fn sanitize_title(title: &str) -> String {
    let stripped = TAGS.replace_all(title, "");
    let lowered = stripped.to_lowercase();
    let cleaned = DISALLOWED.replace_all(&lowered, "");
    SEPARATORS
        .replace_all(cleaned.trim(), "-")
        .trim_matches('-')
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductAttribute {
    pub name: String,
    pub position: i64,
    pub visible: bool,
    pub variation: bool,
    pub options: Vec<String>,
}

impl ProductAttribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: 0,
            visible: false,
            variation: false,
            options: Vec::new(),
        }
    }

    pub fn position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn variation(mut self, variation: bool) -> Self {
        self.variation = variation;
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Global attributes live in a `pa_` taxonomy.
    pub fn is_taxonomy(&self) -> bool {
        self.name.starts_with("pa_")
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Product {
    pub id: ProductId,
    /// Keyed by the sanitized attribute name.
    pub attributes: IndexMap<String, ProductAttribute>,
    pub default_attributes: IndexMap<String, String>,
}

impl Product {
    pub fn new(id: ProductId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn set_attributes(&mut self, attributes: Vec<ProductAttribute>) {
        self.attributes = attributes
            .into_iter()
            .map(|attribute| (sanitize_title(&attribute.name), attribute))
            .collect();
    }

    /// Replace the default selection. Scalar entries are kept as text;
    /// empty ones are dropped, `"0"` included as a real term.
    pub fn set_default_attributes(&mut self, defaults: &MetaValue) {
        self.default_attributes = defaults
            .array_entries()
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, value)| !value.is_array())
            .map(|(key, value)| (key, value.to_legacy_string()))
            .filter(|(_, value)| !value.is_empty())
            .collect();
    }
}

/// Loads and saves product objects.
pub trait ProductRepository: Send + Sync {
    fn find(&self, id: ProductId) -> Result<Option<Product>>;

    fn save(&self, product: &Product) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryProductRepository {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl MemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.products.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProductRepository for MemoryProductRepository {
    fn find(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read()?.get(&id).cloned())
    }

    fn save(&self, product: &Product) -> Result<()> {
        self.products.write()?.insert(product.id, product.clone());
        Ok(())
    }
}
