use super::{StorageEngine, TableSchema};
use crate::core::{Column, DataType, Result, Value};

/// Columns of the normalized product table that legacy keys map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductColumn {
    Sku,
    ImageId,
    Price,
    RegularPrice,
    SalePrice,
    DateOnSaleFrom,
    DateOnSaleTo,
    TotalSales,
    TaxStatus,
    TaxClass,
    StockQuantity,
    StockStatus,
    Length,
    Width,
    Height,
    Weight,
    Virtual,
    Downloadable,
    AverageRating,
}

impl ProductColumn {
    pub const ALL: [ProductColumn; 19] = [
        Self::Sku,
        Self::ImageId,
        Self::Price,
        Self::RegularPrice,
        Self::SalePrice,
        Self::DateOnSaleFrom,
        Self::DateOnSaleTo,
        Self::TotalSales,
        Self::TaxStatus,
        Self::TaxClass,
        Self::StockQuantity,
        Self::StockStatus,
        Self::Length,
        Self::Width,
        Self::Height,
        Self::Weight,
        Self::Virtual,
        Self::Downloadable,
        Self::AverageRating,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sku => "sku",
            Self::ImageId => "image_id",
            Self::Price => "price",
            Self::RegularPrice => "regular_price",
            Self::SalePrice => "sale_price",
            Self::DateOnSaleFrom => "date_on_sale_from",
            Self::DateOnSaleTo => "date_on_sale_to",
            Self::TotalSales => "total_sales",
            Self::TaxStatus => "tax_status",
            Self::TaxClass => "tax_class",
            Self::StockQuantity => "stock_quantity",
            Self::StockStatus => "stock_status",
            Self::Length => "length",
            Self::Width => "width",
            Self::Height => "height",
            Self::Weight => "weight",
            Self::Virtual => "virtual",
            Self::Downloadable => "downloadable",
            Self::AverageRating => "average_rating",
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Sku
            | Self::DateOnSaleFrom
            | Self::DateOnSaleTo
            | Self::TaxStatus
            | Self::TaxClass
            | Self::StockStatus => DataType::Text,
            Self::ImageId | Self::TotalSales | Self::Virtual | Self::Downloadable => DataType::Integer,
            Self::Price
            | Self::RegularPrice
            | Self::SalePrice
            | Self::StockQuantity
            | Self::Length
            | Self::Width
            | Self::Height
            | Self::Weight
            | Self::AverageRating => DataType::Float,
        }
    }

    /// Value a freshly created product row starts with.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Sku | Self::TaxClass => Value::Text(String::new()),
            Self::TaxStatus => Value::Text("taxable".into()),
            Self::StockStatus => Value::Text("instock".into()),
            Self::TotalSales | Self::Virtual | Self::Downloadable => Value::Integer(0),
            Self::AverageRating => Value::Integer(0),
            _ => Value::Null,
        }
    }
}

/// Names of the tables this layer reads and writes, all sharing one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub products: String,
    pub relationships: String,
    pub downloads: String,
    pub posts: String,
    pub postmeta: String,
}

impl Catalog {
    pub fn new(prefix: &str) -> Self {
        Self {
            products: format!("{prefix}wc_products"),
            relationships: format!("{prefix}wc_product_relationships"),
            downloads: format!("{prefix}wc_product_downloads"),
            posts: format!("{prefix}posts"),
            postmeta: format!("{prefix}postmeta"),
        }
    }

    pub fn product_table(&self) -> TableSchema {
        let mut columns = vec![Column::new("product_id", DataType::Integer).not_null()];
        columns.extend(
            ProductColumn::ALL
                .iter()
                .map(|col| Column::new(col.name(), col.data_type()).default_value(col.default_value())),
        );
        TableSchema::new(&self.products, columns).unique_key(&["product_id"])
    }

    pub fn relationship_table(&self) -> TableSchema {
        TableSchema::new(
            &self.relationships,
            vec![
                Column::new("type", DataType::Text).not_null(),
                Column::new("product_id", DataType::Integer).not_null(),
                Column::new("object_id", DataType::Integer).not_null(),
                Column::new("priority", DataType::Integer).not_null().default_value(0i64),
            ],
        )
        .unique_key(&["type", "product_id", "object_id"])
    }

    pub fn download_table(&self) -> TableSchema {
        TableSchema::new(
            &self.downloads,
            vec![
                Column::new("download_id", DataType::Text).not_null(),
                Column::new("product_id", DataType::Integer).not_null(),
                Column::new("name", DataType::Text).default_value(""),
                Column::new("file", DataType::Text).default_value(""),
                Column::new("priority", DataType::Integer).not_null().default_value(0i64),
            ],
        )
        .unique_key(&["product_id", "download_id"])
    }

    pub fn post_table(&self) -> TableSchema {
        TableSchema::new(
            &self.posts,
            vec![
                Column::new("ID", DataType::Integer).not_null(),
                Column::new("post_type", DataType::Text).not_null().default_value("product"),
                Column::new("post_content", DataType::Text).not_null().default_value(""),
            ],
        )
        .unique_key(&["ID"])
    }

    pub fn postmeta_table(&self) -> TableSchema {
        TableSchema::new(
            &self.postmeta,
            vec![
                Column::new("post_id", DataType::Integer).not_null(),
                Column::new("meta_key", DataType::Text).not_null(),
                Column::new("meta_value", DataType::Text),
            ],
        )
    }

    /// Create every table that does not exist yet.
    pub fn install(&self, storage: &dyn StorageEngine) -> Result<()> {
        for schema in [
            self.product_table(),
            self.relationship_table(),
            self.download_table(),
            self.post_table(),
            self.postmeta_table(),
        ] {
            if !storage.table_exists(schema.name()) {
                storage.create_table(schema)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    #[test]
    fn test_install_is_idempotent() {
        let storage = InMemoryStorage::new();
        let catalog = Catalog::new("wp_");
        catalog.install(&storage).unwrap();
        catalog.install(&storage).unwrap();
        assert_eq!(
            storage.list_tables(),
            vec![
                "wp_postmeta",
                "wp_posts",
                "wp_wc_product_downloads",
                "wp_wc_product_relationships",
                "wp_wc_products"
            ]
        );
    }

    #[test]
    fn test_product_defaults_fit_column_types() {
        for column in ProductColumn::ALL {
            assert!(column.data_type().is_compatible(&column.default_value()), "{}", column.name());
        }
    }
}
