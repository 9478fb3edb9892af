use super::HandlerContext;
use crate::ProductId;
use crate::cache::{CacheEntry, GROUP_PRODUCT, keys};
use crate::core::{MetaValue, Result, Value};
use crate::mapping::RelationType;
use crate::storage::{Condition, Select, SortOrder, Statement};
use tracing::{Level, event};

/// Related ids of one relation type as a single legacy value holding the
/// ordered list.
pub fn get(ctx: &HandlerContext<'_>, product_id: ProductId, relation: RelationType) -> Result<Vec<MetaValue>> {
    if product_id <= 0 {
        return Ok(Vec::new());
    }

    let ids = related_ids(ctx, product_id, relation)?;
    Ok(vec![MetaValue::list(ids)])
}

/// Distinct related ids in priority order, cache first.
pub fn related_ids(ctx: &HandlerContext<'_>, product_id: ProductId, relation: RelationType) -> Result<Vec<i64>> {
    let key = keys::compat_relationship(relation.as_str(), product_id);
    if let Some(CacheEntry::Ids(ids)) = ctx.cache.get(GROUP_PRODUCT, &key) {
        return Ok(ids);
    }

    let ids: Vec<i64> = ctx
        .execute(&Statement::Select(
            select_related(ctx, product_id, relation).distinct(),
        ))?
        .first_column()
        .iter()
        .filter_map(Value::as_i64)
        .collect();

    ctx.cache.set(GROUP_PRODUCT, &key, CacheEntry::Ids(ids.clone()));
    Ok(ids)
}

/// Replace the relation with the ordered list in `value`. Ids that dropped
/// out are deleted, every listed id is upserted with its list position as
/// priority. Reports success once both passes ran.
pub fn update(
    ctx: &HandlerContext<'_>,
    product_id: ProductId,
    relation: RelationType,
    value: &MetaValue,
) -> Result<bool> {
    let Some(items) = value.array_values() else {
        return Ok(false);
    };
    if product_id <= 0 {
        return Ok(false);
    }

    let new_ids: Vec<i64> = items.iter().map(|item| item.as_i64()).collect();

    let existing: Vec<i64> = ctx
        .execute(&Statement::Select(select_related(ctx, product_id, relation)))?
        .first_column()
        .iter()
        .filter_map(Value::as_i64)
        .collect();

    let deletes = existing
        .iter()
        .filter(|id| !new_ids.contains(id))
        .map(|object_id| Statement::Delete {
            table: ctx.catalog.relationships.clone(),
            filter: vec![
                Condition::eq("type", relation.as_str()),
                Condition::eq("product_id", product_id),
                Condition::eq("object_id", *object_id),
            ],
        });

    let upserts = new_ids.iter().enumerate().map(|(priority, object_id)| Statement::Replace {
        table: ctx.catalog.relationships.clone(),
        values: vec![
            ("type".into(), relation.as_str().into()),
            ("product_id".into(), product_id.into()),
            ("object_id".into(), (*object_id).into()),
            ("priority".into(), Value::Integer(priority as i64)),
        ],
    });

    let outcome = ctx.execute_pass(deletes.chain(upserts));
    invalidate(ctx, product_id, relation);
    outcome?;

    event!(
        Level::DEBUG,
        product_id,
        relation = relation.as_str(),
        count = new_ids.len(),
        "relationship replaced"
    );
    Ok(true)
}

pub fn invalidate(ctx: &HandlerContext<'_>, product_id: ProductId, relation: RelationType) {
    ctx.cache.delete(
        GROUP_PRODUCT,
        &keys::compat_relationship(relation.as_str(), product_id),
    );
    ctx.cache.delete(GROUP_PRODUCT, &keys::relationships(product_id));
}

fn select_related(ctx: &HandlerContext<'_>, product_id: ProductId, relation: RelationType) -> Select {
    Select::from(&ctx.catalog.relationships)
        .columns(&["object_id"])
        .filter(Condition::eq("product_id", product_id))
        .filter(Condition::eq("type", relation.as_str()))
        .order_by("priority", SortOrder::Asc)
}
