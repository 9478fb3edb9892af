use super::{HandlerContext, WriteArgs};
use crate::ProductId;
use crate::cache::{CacheEntry, GROUP_POSTS, keys};
use crate::core::{MetaValue, Result, Value};
use crate::storage::{Condition, Select, Statement};
use tracing::{Level, event};

pub const VARIATION_POST_TYPE: &str = "product_variation";

/// Content of the product's post, empty when there is no post.
pub fn get(ctx: &HandlerContext<'_>, product_id: ProductId) -> Result<Vec<MetaValue>> {
    if product_id <= 0 {
        return Ok(Vec::new());
    }
    Ok(vec![MetaValue::Text(post_content(ctx, product_id)?)])
}

fn post_content(ctx: &HandlerContext<'_>, post_id: ProductId) -> Result<String> {
    let key = keys::post(post_id);
    if let Some(CacheEntry::Text(content)) = ctx.cache.get(GROUP_POSTS, &key) {
        return Ok(content);
    }

    let result = ctx.execute(&Statement::Select(
        Select::from(&ctx.catalog.posts)
            .columns(&["post_content"])
            .filter(Condition::eq("ID", post_id)),
    ))?;

    match result.first_column().into_iter().next() {
        Some(value) => {
            let content = value.as_str().unwrap_or_default().to_string();
            ctx.cache.set(GROUP_POSTS, &key, CacheEntry::Text(content.clone()));
            Ok(content)
        }
        None => Ok(String::new()),
    }
}

/// Write the description.
///
/// With `delete_all` the content of every variation post is replaced,
/// restricted to posts holding the previous value when one is given. With a
/// previous value the write only happens if the current content equals it.
pub fn set(ctx: &HandlerContext<'_>, args: &WriteArgs) -> Result<bool> {
    if args.product_id <= 0 {
        return Ok(false);
    }
    let content = args.value.to_legacy_string();

    if args.delete_all {
        let mut filter = vec![Condition::eq("post_type", VARIATION_POST_TYPE)];
        if let Some(prev) = args.prev_constraint() {
            filter.push(Condition::eq("post_content", prev.to_legacy_string()));
        }

        let mut select = Select::from(&ctx.catalog.posts).columns(&["ID"]);
        for condition in &filter {
            select = select.filter(condition.clone());
        }
        let ids: Vec<ProductId> = ctx
            .execute(&Statement::Select(select))?
            .first_column()
            .iter()
            .filter_map(Value::as_i64)
            .collect();

        let affected = ctx
            .execute(&Statement::Update {
                table: ctx.catalog.posts.clone(),
                assignments: vec![("post_content".into(), content.into())],
                filter,
            })?
            .affected_rows;

        event!(Level::DEBUG, affected, "variation descriptions reset");
        if affected == 0 {
            return Ok(false);
        }
        for id in ids {
            invalidate(ctx, id);
        }
        return Ok(true);
    }

    if let Some(prev) = args.prev_constraint() {
        if prev.to_legacy_string() != post_content(ctx, args.product_id)? {
            return Ok(false);
        }
    }

    let affected = ctx
        .execute(&Statement::Update {
            table: ctx.catalog.posts.clone(),
            assignments: vec![("post_content".into(), content.into())],
            filter: vec![Condition::eq("ID", args.product_id)],
        })?
        .affected_rows;

    if affected == 0 {
        return Ok(false);
    }
    invalidate(ctx, args.product_id);
    Ok(true)
}

pub fn invalidate(ctx: &HandlerContext<'_>, post_id: ProductId) {
    ctx.cache.delete(GROUP_POSTS, &keys::post(post_id));
}
