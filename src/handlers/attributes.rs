//! Attribute keys, delegated to the product object.
//!
//! Loading and saving a product can issue metadata calls of its own, so the
//! interception stays suspended from the load until after the save.

use super::HandlerContext;
use crate::ProductId;
use crate::cache::{GROUP_PRODUCT, keys};
use crate::core::{MetaValue, Result};
use crate::product::{ProductAttribute, sanitize_title};
use indexmap::IndexMap;
use tracing::{Level, event};

/// Attributes as one legacy map keyed by attribute slug.
pub fn get(ctx: &HandlerContext<'_>, product_id: ProductId) -> Result<Vec<MetaValue>> {
    if product_id <= 0 {
        return Ok(Vec::new());
    }

    let _suspended = ctx.hooks.suspend();
    let Some(product) = ctx.products.find(product_id)? else {
        return Ok(Vec::new());
    };

    let attributes: IndexMap<String, MetaValue> = product
        .attributes
        .values()
        .map(|attribute| (sanitize_title(&attribute.name), legacy_attribute(attribute)))
        .collect();
    Ok(vec![MetaValue::Map(attributes)])
}

fn legacy_attribute(attribute: &ProductAttribute) -> MetaValue {
    let entry: IndexMap<String, MetaValue> = [
        ("name", MetaValue::text(attribute.name.clone())),
        ("position", MetaValue::Int(attribute.position)),
        ("is_visible", MetaValue::Int(i64::from(attribute.visible))),
        ("is_variation", MetaValue::Int(i64::from(attribute.variation))),
        ("is_taxonomy", MetaValue::Int(i64::from(attribute.is_taxonomy()))),
        ("value", MetaValue::text(attribute.options.join(" | "))),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect();
    MetaValue::Map(entry)
}

fn parse_attribute(entry: &MetaValue) -> Option<ProductAttribute> {
    if !entry.is_array() {
        return None;
    }
    let field = |name: &str| entry.get(name).cloned().unwrap_or_default();

    let options = field("value")
        .to_legacy_string()
        .split('|')
        .map(|option| option.trim().to_string())
        .collect::<Vec<_>>();

    Some(
        ProductAttribute::new(field("name").to_legacy_string())
            .position(field("position").as_i64())
            .visible(field("is_visible").is_truthy())
            .variation(field("is_variation").is_truthy())
            .options(options),
    )
}

/// Replace the attributes from a legacy map or list of attribute entries.
pub fn update(ctx: &HandlerContext<'_>, product_id: ProductId, value: &MetaValue) -> Result<bool> {
    let Some(entries) = value.array_values() else {
        return Ok(false);
    };
    if product_id <= 0 {
        return Ok(false);
    }

    let saved = {
        let _suspended = ctx.hooks.suspend();
        match ctx.products.find(product_id)? {
            Some(mut product) => {
                product.set_attributes(entries.into_iter().filter_map(parse_attribute).collect());
                ctx.products.save(&product)?;
                event!(Level::DEBUG, product_id, count = product.attributes.len(), "attributes saved");
                true
            }
            None => false,
        }
    };

    if saved {
        ctx.cache.delete(GROUP_PRODUCT, &keys::compat_attributes(product_id));
    }
    Ok(saved)
}

/// Default attribute selection as one legacy map.
pub fn get_defaults(ctx: &HandlerContext<'_>, product_id: ProductId) -> Result<Vec<MetaValue>> {
    if product_id <= 0 {
        return Ok(Vec::new());
    }

    let _suspended = ctx.hooks.suspend();
    Ok(ctx
        .products
        .find(product_id)?
        .map(|product| {
            let defaults: IndexMap<String, MetaValue> = product
                .default_attributes
                .into_iter()
                .map(|(key, value)| (key, MetaValue::Text(value)))
                .collect();
            vec![MetaValue::Map(defaults)]
        })
        .unwrap_or_default())
}

pub fn update_defaults(ctx: &HandlerContext<'_>, product_id: ProductId, value: &MetaValue) -> Result<bool> {
    if !value.is_array() || product_id <= 0 {
        return Ok(false);
    }

    let _suspended = ctx.hooks.suspend();
    let Some(mut product) = ctx.products.find(product_id)? else {
        return Ok(false);
    };
    product.set_default_attributes(value);
    ctx.products.save(&product)?;
    Ok(true)
}
