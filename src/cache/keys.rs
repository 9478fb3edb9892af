//! Cache key builders. Keys are deterministic concatenations of a fixed
//! prefix, the domain they cover and the product id.

use crate::ProductId;

pub const GROUP_PRODUCT: &str = "product";
pub const GROUP_POSTS: &str = "posts";

const PREFIX: &str = "woocommerce_product_";
const COMPAT_PREFIX: &str = "woocommerce_product_backwards_compatibility_";

/// Canonical projection of the product row.
pub fn product(product_id: ProductId) -> String {
    format!("{PREFIX}{product_id}")
}

/// Shadow entry filled column by column by the column handler.
pub fn compat(product_id: ProductId) -> String {
    format!("{COMPAT_PREFIX}{product_id}")
}

pub fn compat_relationship(relation_type: &str, product_id: ProductId) -> String {
    format!("{COMPAT_PREFIX}{relation_type}_relationship_{product_id}")
}

pub fn relationships(product_id: ProductId) -> String {
    format!("{PREFIX}relationships_{product_id}")
}

pub fn compat_downloads(product_id: ProductId) -> String {
    format!("{COMPAT_PREFIX}downloadable_files_{product_id}")
}

pub fn downloads(product_id: ProductId) -> String {
    format!("{PREFIX}downloads_{product_id}")
}

pub fn compat_attributes(product_id: ProductId) -> String {
    format!("{COMPAT_PREFIX}attributes_{product_id}")
}

pub fn post(post_id: ProductId) -> String {
    post_id.to_string()
}
