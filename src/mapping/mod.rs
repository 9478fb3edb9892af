//! Registry of the legacy metadata keys handled by the product tables.
//!
//! Built once on first use and shared for the life of the process. A key
//! missing from the registry is not an error: it belongs to legacy storage.

pub mod handler;

pub use handler::{Handler, KeyMapping, Operation, RelationType, Verb};

use crate::core::MetaValue;
use crate::core::meta::Format;
use crate::storage::ProductColumn;
use indexmap::IndexMap;

lazy_static::lazy_static! {
    static ref MAPPING: Mapping = Mapping::build();
}

/// The process-wide mapping.
pub fn mapping() -> &'static Mapping {
    &MAPPING
}

#[derive(Debug)]
pub struct Mapping {
    keys: IndexMap<&'static str, KeyMapping>,
}

impl Mapping {
    fn build() -> Self {
        use Format::{Float, Integer, Raw, Text};
        use ProductColumn as C;

        let null = || Operation::reset_to(Raw, MetaValue::Null);
        let keys: Vec<(&'static str, KeyMapping)> = vec![
            ("_thumbnail_id", KeyMapping::column(C::ImageId, Integer, Operation::reset_to(Integer, ""))),
            ("_sku", KeyMapping::column(C::Sku, Text, Operation::reset_to(Text, ""))),
            ("_price", KeyMapping::column(C::Price, Float, null())),
            ("_regular_price", KeyMapping::column(C::RegularPrice, Float, null())),
            ("_sale_price", KeyMapping::column(C::SalePrice, Float, null())),
            ("_sale_price_dates_from", KeyMapping::column(C::DateOnSaleFrom, Text, null())),
            ("_sale_price_dates_to", KeyMapping::column(C::DateOnSaleTo, Text, null())),
            ("total_sales", KeyMapping::column(C::TotalSales, Integer, Operation::reset_to(Integer, 0))),
            ("_tax_status", KeyMapping::column(C::TaxStatus, Text, Operation::reset_to(Text, "taxable"))),
            ("_tax_class", KeyMapping::column(C::TaxClass, Text, Operation::reset_to(Text, ""))),
            ("_stock", KeyMapping::column(C::StockQuantity, Integer, null())),
            ("_stock_status", KeyMapping::column(C::StockStatus, Text, Operation::reset_to(Text, "instock"))),
            ("_length", KeyMapping::column(C::Length, Float, null())),
            ("_width", KeyMapping::column(C::Width, Float, null())),
            ("_height", KeyMapping::column(C::Height, Float, null())),
            ("_weight", KeyMapping::column(C::Weight, Float, null())),
            ("_virtual", KeyMapping::column(C::Virtual, Integer, Operation::reset_to(Integer, 0))),
            ("_downloadable", KeyMapping::column(C::Downloadable, Integer, Operation::reset_to(Integer, 0))),
            ("_wc_average_rating", KeyMapping::column(C::AverageRating, Float, Operation::reset_to(Float, 0))),
            (
                "_upsell_ids",
                KeyMapping::resettable(Handler::Relationship(RelationType::Upsell), MetaValue::List(vec![])),
            ),
            (
                "_crosssell_ids",
                KeyMapping::resettable(Handler::Relationship(RelationType::CrossSell), MetaValue::List(vec![])),
            ),
            (
                "_product_image_gallery",
                KeyMapping::resettable(Handler::Relationship(RelationType::Image), MetaValue::List(vec![])),
            ),
            (
                "_children",
                KeyMapping::resettable(Handler::Relationship(RelationType::Grouped), MetaValue::List(vec![])),
            ),
            (
                "_downloadable_files",
                KeyMapping::resettable(Handler::DownloadableFiles, MetaValue::List(vec![])),
            ),
            ("_variation_description", KeyMapping::resettable(Handler::VariationDescription, "")),
            ("_manage_stock", KeyMapping::resettable(Handler::ManageStock, false)),
            (
                "_product_attributes",
                KeyMapping::resettable(Handler::Attributes, MetaValue::List(vec![])),
            ),
            (
                "_default_attributes",
                KeyMapping::resettable(Handler::DefaultAttributes, MetaValue::List(vec![])),
            ),
        ];

        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&KeyMapping> {
        self.keys.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Mapped keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.keys.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &KeyMapping)> + '_ {
        self.keys.iter().map(|(key, mapping)| (*key, mapping))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_is_built_once() {
        assert!(std::ptr::eq(mapping(), mapping()));
    }

    #[test]
    fn test_every_product_column_is_reachable() {
        for column in ProductColumn::ALL {
            assert!(
                mapping()
                    .iter()
                    .any(|(_, m)| m.handler == Handler::Column(column)),
                "{} has no key",
                column.name()
            );
        }
    }

    #[test]
    fn test_key_count() {
        assert_eq!(mapping().len(), 28);
        assert!(!mapping().is_empty());
        assert_eq!(mapping().keys().next(), Some("_thumbnail_id"));
    }

    #[test]
    fn test_unknown_key() {
        assert!(mapping().get("_edit_lock").is_none());
        assert!(!mapping().contains(""));
    }

    #[test]
    fn test_delete_defaults() {
        let stock_status = mapping().get("_stock_status").unwrap();
        assert_eq!(stock_status.delete.value, Some(MetaValue::text("instock")));
        assert_eq!(stock_status.add.format, Format::Text);

        let price = mapping().get("_price").unwrap();
        assert_eq!(price.operation(Verb::Delete).value, Some(MetaValue::Null));
        assert_eq!(price.operation(Verb::Update).value, None);

        let children = mapping().get("_children").unwrap();
        assert_eq!(children.handler, Handler::Relationship(RelationType::Grouped));
        assert_eq!(children.delete.value, Some(MetaValue::List(vec![])));
    }
}
