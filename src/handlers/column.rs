use super::{HandlerContext, WriteArgs};
use crate::ProductId;
use crate::cache::{CacheEntry, GROUP_PRODUCT, keys};
use crate::core::{MetaValue, Result, Value};
use crate::storage::{Condition, ProductColumn, Select, Statement};
use std::collections::HashMap;
use tracing::{Level, event};

/// Raw cells of `column` for the product. Served from the canonical row
/// cache, then from the shadow cache, then from storage; a storage read is
/// added to the shadow entry next to the columns already looked up.
pub fn get(ctx: &HandlerContext<'_>, product_id: ProductId, column: ProductColumn) -> Result<Vec<Value>> {
    if product_id <= 0 {
        return Ok(Vec::new());
    }

    if let Some(CacheEntry::Row(row)) = ctx.cache.get(GROUP_PRODUCT, &keys::product(product_id)) {
        if let Some(value) = row.get(column.name()) {
            return Ok(vec![value.clone()]);
        }
    }

    let shadow_key = keys::compat(product_id);
    let mut shadow = match ctx.cache.get(GROUP_PRODUCT, &shadow_key) {
        Some(CacheEntry::Columns(columns)) => columns,
        _ => HashMap::new(),
    };

    if let Some(values) = shadow.get(column.name()) {
        if !values.is_empty() {
            return Ok(values.clone());
        }
    }

    let values = ctx
        .execute(&Statement::Select(
            Select::from(&ctx.catalog.products)
                .columns(&[column.name()])
                .filter(Condition::eq("product_id", product_id)),
        ))?
        .first_column();

    shadow.insert(column.name().to_string(), values.clone());
    ctx.cache.set(GROUP_PRODUCT, &shadow_key, CacheEntry::Columns(shadow));

    Ok(values)
}

/// Write `column`. With `delete_all` every product row is written, optionally
/// only those currently holding the previous value; otherwise only the
/// product's row, constrained by the previous value when one is given.
pub fn update(ctx: &HandlerContext<'_>, column: ProductColumn, args: &WriteArgs) -> Result<bool> {
    let product_id = args.product_id;
    if product_id <= 0 {
        return Ok(false);
    }

    let value = args.value.to_storage(args.format);
    let prev = args.prev_constraint().map(prev_condition(column));

    let (filter, touched) = if args.delete_all {
        let filter: Vec<Condition> = prev.into_iter().collect();
        let mut select = Select::from(&ctx.catalog.products).columns(&["product_id"]);
        for condition in &filter {
            select = select.filter(condition.clone());
        }
        let touched: Vec<ProductId> = ctx
            .execute(&Statement::Select(select))?
            .first_column()
            .iter()
            .filter_map(Value::as_i64)
            .collect();
        (filter, touched)
    } else {
        let mut filter = vec![Condition::eq("product_id", product_id)];
        filter.extend(prev);
        (filter, vec![product_id])
    };

    let affected = ctx
        .execute(&Statement::Update {
            table: ctx.catalog.products.clone(),
            assignments: vec![(column.name().to_string(), value)],
            filter,
        })?
        .affected_rows;

    event!(
        Level::DEBUG,
        product_id,
        column = column.name(),
        format = args.format.placeholder(),
        delete_all = args.delete_all,
        affected,
        "product column updated"
    );

    if affected == 0 {
        return Ok(false);
    }

    invalidate(ctx, product_id);
    for id in touched {
        if id != product_id {
            invalidate(ctx, id);
        }
    }
    Ok(true)
}

/// Drop both the canonical and the shadow entry of a product.
pub fn invalidate(ctx: &HandlerContext<'_>, product_id: ProductId) {
    ctx.cache.delete(GROUP_PRODUCT, &keys::compat(product_id));
    ctx.cache.delete(GROUP_PRODUCT, &keys::product(product_id));
}

fn prev_condition(column: ProductColumn) -> impl Fn(&MetaValue) -> Condition {
    move |prev| Condition::eq(column.name(), prev.to_legacy_string())
}
