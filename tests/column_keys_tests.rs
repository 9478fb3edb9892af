use product_tables::{MetaValue, ProductTables};

fn tables_with(ids: &[i64]) -> ProductTables {
    let tables = ProductTables::in_memory().unwrap();
    for id in ids {
        tables.create_product(*id).unwrap();
    }
    tables
}

#[test]
fn test_sku_scenario() {
    let tables = tables_with(&[7]);
    let meta = tables.metadata();

    assert!(meta.add(7, "_sku", &MetaValue::text("ABC"), false).unwrap());
    assert_eq!(meta.get(7, "_sku", true).unwrap(), MetaValue::text("ABC"));

    assert!(meta.update(7, "_sku", &MetaValue::text("XYZ"), &MetaValue::Null).unwrap());
    assert_eq!(meta.get(7, "_sku", true).unwrap(), MetaValue::text("XYZ"));

    assert!(meta.delete(7, "_sku", &MetaValue::Null, false).unwrap());
    assert_eq!(meta.get(7, "_sku", true).unwrap(), MetaValue::text(""));
    assert_eq!(meta.get(7, "_sku", false).unwrap(), MetaValue::List(vec![]));

    assert!(meta.add(7, "_sku", &MetaValue::text("NEW"), false).unwrap());
    assert_eq!(meta.get(7, "_sku", true).unwrap(), MetaValue::text("NEW"));
    assert!(meta.raw_values(7, "_sku").unwrap().is_empty());
}

#[test]
fn test_column_keys_round_trip() {
    let tables = tables_with(&[7]);
    let meta = tables.metadata();

    let cases: Vec<(&str, MetaValue, MetaValue)> = vec![
        ("_thumbnail_id", MetaValue::text("42"), MetaValue::Int(42)),
        ("_sku", MetaValue::text("SKU-1"), MetaValue::text("SKU-1")),
        ("_price", MetaValue::text("10.5"), MetaValue::Float(10.5)),
        ("_regular_price", MetaValue::text("12"), MetaValue::Float(12.0)),
        ("_sale_price", MetaValue::Float(9.99), MetaValue::Float(9.99)),
        ("_sale_price_dates_from", MetaValue::text("1700000000"), MetaValue::text("1700000000")),
        ("_sale_price_dates_to", MetaValue::text("1800000000"), MetaValue::text("1800000000")),
        ("total_sales", MetaValue::Int(5), MetaValue::Int(5)),
        ("_tax_status", MetaValue::text("shipping"), MetaValue::text("shipping")),
        ("_tax_class", MetaValue::text("reduced-rate"), MetaValue::text("reduced-rate")),
        ("_stock", MetaValue::text("12"), MetaValue::Int(12)),
        ("_stock_status", MetaValue::text("outofstock"), MetaValue::text("outofstock")),
        ("_length", MetaValue::text("1.5"), MetaValue::Float(1.5)),
        ("_width", MetaValue::text("2"), MetaValue::Float(2.0)),
        ("_height", MetaValue::text("3.25"), MetaValue::Float(3.25)),
        ("_weight", MetaValue::text("0.4"), MetaValue::Float(0.4)),
        ("_virtual", MetaValue::Int(1), MetaValue::Int(1)),
        ("_downloadable", MetaValue::Bool(true), MetaValue::Int(1)),
        ("_wc_average_rating", MetaValue::text("4.50"), MetaValue::Float(4.5)),
    ];

    for (key, input, expected) in cases {
        assert!(meta.update(7, key, &input, &MetaValue::Null).unwrap(), "{}", key);
        assert_eq!(meta.get(7, key, true).unwrap(), expected, "{}", key);
        assert_eq!(
            meta.get(7, key, false).unwrap(),
            MetaValue::List(vec![expected.clone()]),
            "{}",
            key
        );
        assert!(meta.raw_values(7, key).unwrap().is_empty(), "{} leaked to postmeta", key);
    }
}

#[test]
fn test_delete_resets_declared_defaults() {
    let tables = tables_with(&[7]);
    let meta = tables.metadata();

    let cases: Vec<(&str, MetaValue, MetaValue)> = vec![
        ("_stock_status", MetaValue::text("outofstock"), MetaValue::text("instock")),
        ("total_sales", MetaValue::Int(9), MetaValue::Int(0)),
        ("_tax_status", MetaValue::text("none"), MetaValue::text("taxable")),
        ("_tax_class", MetaValue::text("zero-rate"), MetaValue::text("")),
        ("_thumbnail_id", MetaValue::Int(5), MetaValue::Int(0)),
        ("_virtual", MetaValue::Int(1), MetaValue::Int(0)),
        ("_downloadable", MetaValue::Int(1), MetaValue::Int(0)),
        ("_wc_average_rating", MetaValue::Float(3.5), MetaValue::Float(0.0)),
        ("_price", MetaValue::Float(3.5), MetaValue::text("")),
        ("_stock", MetaValue::Int(4), MetaValue::text("")),
        ("_sale_price_dates_to", MetaValue::text("1800000000"), MetaValue::text("")),
    ];

    for (key, input, expected) in cases {
        meta.update(7, key, &input, &MetaValue::Null).unwrap();
        assert!(meta.delete(7, key, &MetaValue::Null, false).unwrap(), "{}", key);
        assert_eq!(meta.get(7, key, true).unwrap(), expected, "{}", key);
    }
}

#[test]
fn test_update_with_previous_value() {
    let tables = tables_with(&[7]);
    let meta = tables.metadata();
    meta.update(7, "_price", &MetaValue::text("10"), &MetaValue::Null).unwrap();

    assert!(!meta.update(7, "_price", &MetaValue::text("12"), &MetaValue::text("11")).unwrap());
    assert_eq!(meta.get(7, "_price", true).unwrap(), MetaValue::Float(10.0));

    assert!(meta.update(7, "_price", &MetaValue::text("12"), &MetaValue::text("10")).unwrap());
    assert_eq!(meta.get(7, "_price", true).unwrap(), MetaValue::Float(12.0));
}

#[test]
fn test_delete_with_previous_value() {
    let tables = tables_with(&[7]);
    let meta = tables.metadata();
    meta.add(7, "_sku", &MetaValue::text("ABC"), false).unwrap();

    assert!(!meta.delete(7, "_sku", &MetaValue::text("OTHER"), false).unwrap());
    assert_eq!(meta.get(7, "_sku", true).unwrap(), MetaValue::text("ABC"));

    assert!(meta.delete(7, "_sku", &MetaValue::text("ABC"), false).unwrap());
    assert_eq!(meta.get(7, "_sku", true).unwrap(), MetaValue::text(""));
}

#[test]
fn test_delete_all_resets_every_product() {
    let tables = tables_with(&[1, 2, 3]);
    let meta = tables.metadata();
    meta.update(1, "_stock_status", &MetaValue::text("outofstock"), &MetaValue::Null).unwrap();
    meta.update(2, "_stock_status", &MetaValue::text("outofstock"), &MetaValue::Null).unwrap();
    meta.update(3, "_stock_status", &MetaValue::text("onbackorder"), &MetaValue::Null).unwrap();
    for id in [1, 2, 3] {
        meta.get(id, "_stock_status", true).unwrap();
    }

    assert!(meta.delete(1, "_stock_status", &MetaValue::text("outofstock"), true).unwrap());
    assert_eq!(meta.get(2, "_stock_status", true).unwrap(), MetaValue::text("instock"));
    assert_eq!(meta.get(3, "_stock_status", true).unwrap(), MetaValue::text("onbackorder"));

    assert!(meta.delete(1, "_stock_status", &MetaValue::Null, true).unwrap());
    assert_eq!(meta.get(3, "_stock_status", true).unwrap(), MetaValue::text("instock"));
}

#[test]
fn test_unique_add() {
    let tables = tables_with(&[7]);
    let meta = tables.metadata();

    assert!(meta.add(7, "_sku", &MetaValue::text("FIRST"), true).unwrap());
    assert!(!meta.add(7, "_sku", &MetaValue::text("SECOND"), true).unwrap());
    assert_eq!(meta.get(7, "_sku", true).unwrap(), MetaValue::text("FIRST"));

    // A zero count is an empty value, so a unique add goes through.
    assert!(meta.add(7, "total_sales", &MetaValue::Int(3), true).unwrap());
}

#[test]
fn test_missing_product_row() {
    let tables = tables_with(&[]);
    let meta = tables.metadata();

    assert_eq!(meta.get(99, "_sku", true).unwrap(), MetaValue::text(""));
    assert!(!meta.update(99, "_sku", &MetaValue::text("A"), &MetaValue::Null).unwrap());
    assert!(!meta.add(0, "_sku", &MetaValue::text("A"), false).unwrap());
}
