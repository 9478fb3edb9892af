use super::{HandlerContext, WriteArgs, column};
use crate::ProductId;
use crate::core::meta::Format;
use crate::core::{MetaValue, Result, Value};
use crate::storage::{ProductColumn, Select, Statement};

/// Stock is managed iff the stock quantity holds a number.
pub fn get(ctx: &HandlerContext<'_>, product_id: ProductId) -> Result<Vec<MetaValue>> {
    if product_id <= 0 {
        return Ok(Vec::new());
    }
    Ok(vec![MetaValue::Bool(is_managed(ctx, product_id)?)])
}

fn is_managed(ctx: &HandlerContext<'_>, product_id: ProductId) -> Result<bool> {
    let stock = column::get(ctx, product_id, ProductColumn::StockQuantity)?;
    Ok(stock.first().is_some_and(|value| value.is_numeric()))
}

/// Managing stock starts the quantity at 0; unmanaging clears it to NULL.
/// A previous value is compared against the current flag, not against the
/// quantity; with `delete_all` it selects the products to write.
pub fn set(ctx: &HandlerContext<'_>, args: &WriteArgs) -> Result<bool> {
    if args.product_id <= 0 {
        return Ok(false);
    }

    let managed = args.value.as_flag();
    match args.prev_constraint() {
        Some(prev) if args.delete_all => set_where_flag(ctx, prev.as_flag(), managed),
        Some(prev) if prev.as_flag() != is_managed(ctx, args.product_id)? => Ok(false),
        _ => column::update(
            ctx,
            ProductColumn::StockQuantity,
            &quantity(args.product_id, managed).delete_all(args.delete_all),
        ),
    }
}

fn quantity(product_id: ProductId, managed: bool) -> WriteArgs {
    if managed {
        WriteArgs::new(product_id, 0i64).format(Format::Integer)
    } else {
        WriteArgs::new(product_id, MetaValue::Null)
    }
}

/// Bulk write restricted to products whose current flag is `prev`. Rows
/// already holding the target flag are left alone.
fn set_where_flag(ctx: &HandlerContext<'_>, prev: bool, managed: bool) -> Result<bool> {
    if prev == managed {
        return Ok(false);
    }

    let rows = ctx
        .execute(&Statement::Select(
            Select::from(&ctx.catalog.products).columns(&["product_id", ProductColumn::StockQuantity.name()]),
        ))?
        .rows;

    let mut written = false;
    for row in rows {
        let (Some(product_id), Some(stock)) = (row.first().and_then(Value::as_i64), row.get(1)) else {
            continue;
        };
        if stock.is_numeric() == prev {
            written |= column::update(ctx, ProductColumn::StockQuantity, &quantity(product_id, managed))?;
        }
    }
    Ok(written)
}
