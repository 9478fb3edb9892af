//! JSON scripts of metadata calls, run against a fresh store.
//!
//! ```json
//! {
//!   "products": [7],
//!   "steps": [
//!     {"op": "add", "id": 7, "key": "_sku", "value": "ABC"},
//!     {"op": "get", "id": 7, "key": "_sku", "single": true},
//!     {"op": "delete", "id": 7, "key": "_sku"}
//!   ]
//! }
//! ```

use crate::core::{CompatError, MetaValue, Result};
use crate::{CompatConfig, ProductId, ProductTables};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Products created before the first step.
    #[serde(default)]
    pub products: Vec<ProductId>,
    /// Variations created before the first step.
    #[serde(default)]
    pub variations: Vec<ProductId>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Get {
        id: ProductId,
        key: String,
        #[serde(default)]
        single: bool,
    },
    Add {
        id: ProductId,
        key: String,
        #[serde(default)]
        value: MetaValue,
        #[serde(default)]
        unique: bool,
    },
    Update {
        id: ProductId,
        key: String,
        #[serde(default)]
        value: MetaValue,
        #[serde(default)]
        prev: MetaValue,
    },
    Delete {
        id: ProductId,
        key: String,
        #[serde(default)]
        prev: MetaValue,
        #[serde(default)]
        all: bool,
    },
    /// Values in legacy storage, bypassing interception.
    Raw { id: ProductId, key: String },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Get { .. } => "get",
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Raw { .. } => "raw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub op: &'static str,
    pub id: ProductId,
    pub key: String,
    pub result: MetaValue,
}

impl Script {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|err| CompatError::ExecutionError(format!("{}: {}", path.display(), err)))?;
        Self::from_json(&text)
    }

    /// Run on a fresh in-memory store opened with `config`.
    pub fn run_fresh(&self, config: CompatConfig) -> Result<(ProductTables, Vec<StepOutcome>)> {
        let tables = ProductTables::open(config)?;
        for id in &self.products {
            tables.create_product(*id)?;
        }
        for id in &self.variations {
            tables.create_variation(*id)?;
        }
        let outcomes = self.run(&tables)?;
        Ok((tables, outcomes))
    }

    pub fn run(&self, tables: &ProductTables) -> Result<Vec<StepOutcome>> {
        let meta = tables.metadata();
        self.steps
            .iter()
            .enumerate()
            .map(|(idx, step)| -> Result<StepOutcome> {
                let (id, key, result): (ProductId, &String, MetaValue) = match step {
                    Step::Get { id, key, single } => (*id, key, meta.get(*id, key, *single)?),
                    Step::Add {
                        id,
                        key,
                        value,
                        unique,
                    } => (*id, key, meta.add(*id, key, value, *unique)?.into()),
                    Step::Update { id, key, value, prev } => (*id, key, meta.update(*id, key, value, prev)?.into()),
                    Step::Delete { id, key, prev, all } => (*id, key, meta.delete(*id, key, prev, *all)?.into()),
                    Step::Raw { id, key } => (*id, key, MetaValue::List(meta.raw_values(*id, key)?)),
                };
                Ok(StepOutcome {
                    step: idx + 1,
                    op: step.name(),
                    id,
                    key: key.clone(),
                    result,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        let script = Script::from_json(
            r#"{
                "products": [7],
                "steps": [
                    {"op": "add", "id": 7, "key": "_upsell_ids", "value": [20, 30], "unique": true},
                    {"op": "delete", "id": 7, "key": "_sku", "all": true},
                    {"op": "raw", "id": 7, "key": "_sku"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(script.products, vec![7]);
        assert_eq!(
            script.steps[0],
            Step::Add {
                id: 7,
                key: "_upsell_ids".into(),
                value: MetaValue::list([20, 30]),
                unique: true,
            }
        );
        assert_eq!(
            script.steps[1],
            Step::Delete {
                id: 7,
                key: "_sku".into(),
                prev: MetaValue::Null,
                all: true,
            }
        );
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let parsed = Script::from_json(r#"{"steps": [{"op": "truncate", "id": 1, "key": "_sku"}]}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_run_fresh() {
        let script = Script::from_json(
            r#"{
                "products": [7],
                "steps": [
                    {"op": "add", "id": 7, "key": "_sku", "value": "ABC"},
                    {"op": "get", "id": 7, "key": "_sku", "single": true},
                    {"op": "raw", "id": 7, "key": "_sku"}
                ]
            }"#,
        )
        .unwrap();

        let (_, outcomes) = script.run_fresh(CompatConfig::default()).unwrap();
        let results: Vec<MetaValue> = outcomes.into_iter().map(|o| o.result).collect();
        assert_eq!(
            results,
            vec![MetaValue::Bool(true), MetaValue::text("ABC"), MetaValue::List(vec![])]
        );
    }
}
