use crate::cache::DEFAULT_CAPACITY;
use crate::storage::catalog::Catalog;

pub const ENV_TABLE_PREFIX: &str = "PRODUCT_TABLES_TABLE_PREFIX";
pub const ENV_CACHE_CAPACITY: &str = "PRODUCT_TABLES_CACHE_CAPACITY";
pub const ENV_ENABLE_BW_COMPAT: &str = "PRODUCT_TABLES_ENABLE_BW_COMPAT";
pub const ENV_DISABLE_BW_COMPAT: &str = "PRODUCT_TABLES_DISABLE_BW_COMPAT";
pub const ENV_STRICT_WRITES: &str = "PRODUCT_TABLES_STRICT_WRITES";

/// Configuration of the compatibility layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatConfig {
    /// Prefix shared by every table name
    pub table_prefix: String,

    /// Maximum number of object cache entries
    pub cache_capacity: usize,

    /// Register the metadata interception at start-up
    pub enable_backward_compatibility: bool,

    /// Report multi-statement writes as failed when any statement fails
    pub strict_writes: bool,
}

impl CompatConfig {
    pub fn new() -> Self {
        Self {
            table_prefix: "wp_".to_string(),
            cache_capacity: DEFAULT_CAPACITY,
            enable_backward_compatibility: true,
            strict_writes: false,
        }
    }

    /// Set the table prefix
    pub fn table_prefix(mut self, prefix: &str) -> Self {
        self.table_prefix = prefix.to_string();
        self
    }

    /// Set the cache capacity
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn enable_backward_compatibility(mut self, enabled: bool) -> Self {
        self.enable_backward_compatibility = enabled;
        self
    }

    pub fn strict_writes(mut self, strict: bool) -> Self {
        self.strict_writes = strict;
        self
    }

    /// Defaults overlaid with `PRODUCT_TABLES_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable.
    /// The disable switch wins over the enable switch.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(prefix) = lookup(ENV_TABLE_PREFIX) {
            config.table_prefix = prefix;
        }
        if let Some(capacity) = lookup(ENV_CACHE_CAPACITY).and_then(|v| v.trim().parse().ok()) {
            config.cache_capacity = capacity;
        }
        if let Some(enabled) = lookup(ENV_ENABLE_BW_COMPAT) {
            config.enable_backward_compatibility = parse_switch(&enabled);
        }
        if lookup(ENV_DISABLE_BW_COMPAT).is_some_and(|v| parse_switch(&v)) {
            config.enable_backward_compatibility = false;
        }
        if let Some(strict) = lookup(ENV_STRICT_WRITES) {
            config.strict_writes = parse_switch(&strict);
        }

        config
    }

    /// Whether the interception should be registered. The
    /// `disable-bw-compat` feature switches it off at compile time.
    pub fn backward_compatibility_enabled(&self) -> bool {
        self.enable_backward_compatibility && !cfg!(feature = "disable-bw-compat")
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(&self.table_prefix)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self
            .table_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(format!("Invalid table prefix '{}'", self.table_prefix));
        }

        if self.cache_capacity == 0 {
            return Err("cache_capacity must be > 0".to_string());
        }

        Ok(())
    }
}

fn parse_switch(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = CompatConfig::default();
        assert_eq!(config.table_prefix, "wp_");
        assert!(config.enable_backward_compatibility);
        assert!(!config.strict_writes);
        assert_eq!(config.catalog().products, "wp_wc_products");
    }

    #[test]
    fn test_builder_pattern() {
        let config = CompatConfig::new()
            .table_prefix("shop_")
            .cache_capacity(16)
            .strict_writes(true);

        assert_eq!(config.catalog().postmeta, "shop_postmeta");
        assert_eq!(config.cache_capacity, 16);
        assert!(config.strict_writes);
    }

    #[test]
    fn test_env_overlay() {
        let config = CompatConfig::from_lookup(lookup(&[
            (ENV_TABLE_PREFIX, "t_"),
            (ENV_CACHE_CAPACITY, "32"),
            (ENV_STRICT_WRITES, "yes"),
        ]));
        assert_eq!(config.table_prefix, "t_");
        assert_eq!(config.cache_capacity, 32);
        assert!(config.strict_writes);
        assert!(config.enable_backward_compatibility);
    }

    #[test]
    fn test_disable_switch_wins() {
        let config = CompatConfig::from_lookup(lookup(&[
            (ENV_ENABLE_BW_COMPAT, "1"),
            (ENV_DISABLE_BW_COMPAT, "true"),
        ]));
        assert!(!config.enable_backward_compatibility);
        assert!(!config.backward_compatibility_enabled());
    }

    #[test]
    fn test_validate() {
        assert!(CompatConfig::new().validate().is_ok());
        assert!(CompatConfig::new().table_prefix("wp`; --").validate().is_err());
        assert!(CompatConfig::new().cache_capacity(0).validate().is_err());
    }
}
