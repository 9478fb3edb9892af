use super::HandlerContext;
use crate::ProductId;
use crate::cache::{CacheEntry, GROUP_PRODUCT, keys};
use crate::core::{MetaValue, Result, Row, Value};
use crate::storage::{Condition, Select, SortOrder, Statement};
use indexmap::IndexMap;
use tracing::{Level, event};

const COLUMNS: [&str; 3] = ["download_id", "name", "file"];

/// The product's files as one legacy value: a map from download id to
/// `{id, name, file, previous_hash}`, in priority order.
pub fn get(ctx: &HandlerContext<'_>, product_id: ProductId) -> Result<Vec<MetaValue>> {
    if product_id <= 0 {
        return Ok(Vec::new());
    }

    let key = keys::compat_downloads(product_id);
    let rows = match ctx.cache.get(GROUP_PRODUCT, &key) {
        Some(CacheEntry::Rows(rows)) => rows,
        _ => {
            let rows = ctx
                .execute(&Statement::Select(
                    Select::from(&ctx.catalog.downloads)
                        .columns(&COLUMNS)
                        .filter(Condition::eq("product_id", product_id))
                        .order_by("priority", SortOrder::Asc),
                ))?
                .rows;
            ctx.cache.set(GROUP_PRODUCT, &key, CacheEntry::Rows(rows.clone()));
            rows
        }
    };

    let files: IndexMap<String, MetaValue> = rows.iter().map(file_entry).collect();
    Ok(vec![MetaValue::Map(files)])
}

fn file_entry(row: &Row) -> (String, MetaValue) {
    let cell = |idx: usize| row.get(idx).map(Value::to_string).unwrap_or_default();
    let id = cell(0);
    let entry: IndexMap<String, MetaValue> = [
        ("id".to_string(), MetaValue::text(id.clone())),
        ("name".to_string(), MetaValue::text(cell(1))),
        ("file".to_string(), MetaValue::text(cell(2))),
        ("previous_hash".to_string(), MetaValue::text("")),
    ]
    .into_iter()
    .collect();
    (id, MetaValue::Map(entry))
}

/// Rewrite the product's files from a map keyed by download id. Files that
/// are gone are deleted; every listed file is upserted with priority 1..N
/// in input order.
pub fn update(ctx: &HandlerContext<'_>, product_id: ProductId, value: &MetaValue) -> Result<bool> {
    let Some(entries) = value.array_entries() else {
        return Ok(false);
    };
    if product_id <= 0 {
        return Ok(false);
    }

    let existing: Vec<String> = ctx
        .execute(&Statement::Select(
            Select::from(&ctx.catalog.downloads)
                .columns(&["download_id"])
                .filter(Condition::eq("product_id", product_id))
                .order_by("priority", SortOrder::Asc),
        ))?
        .first_column()
        .iter()
        .map(Value::to_string)
        .collect();

    let deletes = existing
        .iter()
        .filter(|id| !entries.iter().any(|(key, _)| key == *id))
        .map(|download_id| Statement::Delete {
            table: ctx.catalog.downloads.clone(),
            filter: vec![
                Condition::eq("product_id", product_id),
                Condition::eq("download_id", download_id.as_str()),
            ],
        });

    let upserts = entries.iter().enumerate().map(|(idx, (download_id, info))| {
        let field = |name: &str| info.get(name).map(MetaValue::to_legacy_string).unwrap_or_default();
        Statement::Replace {
            table: ctx.catalog.downloads.clone(),
            values: vec![
                ("download_id".into(), download_id.as_str().into()),
                ("product_id".into(), product_id.into()),
                ("name".into(), field("name").into()),
                ("file".into(), field("file").into()),
                ("priority".into(), Value::Integer(idx as i64 + 1)),
            ],
        }
    });

    let outcome = ctx.execute_pass(deletes.chain(upserts));
    invalidate(ctx, product_id);
    outcome?;

    event!(Level::DEBUG, product_id, count = entries.len(), "downloadable files replaced");
    Ok(true)
}

pub fn invalidate(ctx: &HandlerContext<'_>, product_id: ProductId) {
    ctx.cache.delete(GROUP_PRODUCT, &keys::compat_downloads(product_id));
    ctx.cache.delete(GROUP_PRODUCT, &keys::downloads(product_id));
}
