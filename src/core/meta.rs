//! Legacy key/value metadata values.
//!
//! Callers of the generic metadata API pass loosely typed values: scalars,
//! lists and string-keyed maps. `MetaValue` models that shape and carries the
//! host's loose conversion rules (truthiness, integer/float parsing, the
//! serialization applied to non-scalar values before they are compared or
//! stored as text).

use super::value::{Value, parse_leading_f64};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum MetaValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<MetaValue>),
    Map(IndexMap<String, MetaValue>),
}

/// How a legacy value is bound into a column, mirroring the `%s`/`%d`/`%f`
/// placeholders of the host's query layer. `Raw` binds the value as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Integer,
    Float,
    Raw,
}

impl Format {
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Text => "%s",
            Self::Integer => "%d",
            Self::Float => "%f",
            Self::Raw => "",
        }
    }
}

impl MetaValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<MetaValue>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Loose boolean cast: `""`, `"0"`, `0`, `0.0`, `false`, null and empty
    /// collections are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Text(s) => !(s.is_empty() || s == "0"),
            Self::List(items) => !items.is_empty(),
            Self::Map(entries) => !entries.is_empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.is_truthy()
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }

    /// Parses flag strings the way product settings are written (`"yes"`,
    /// `"true"`, `"1"`); everything else follows [`MetaValue::is_truthy`].
    pub fn as_flag(&self) -> bool {
        match self {
            Self::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "yes" | "true" | "1" | "on"),
            other => other.is_truthy(),
        }
    }

    /// Loose integer cast (leading number of text, truncated floats).
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Null => 0,
            Self::Bool(b) => i64::from(*b),
            Self::Int(i) => *i,
            Self::Float(f) => *f as i64,
            Self::Text(s) => parse_leading_f64(s) as i64,
            Self::List(items) => i64::from(!items.is_empty()),
            Self::Map(entries) => i64::from(!entries.is_empty()),
        }
    }

    /// Loose float cast.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Float(f) => *f,
            Self::Text(s) => parse_leading_f64(s),
            other => other.as_i64() as f64,
        }
    }

    /// String form used when the value is bound as text.
    pub fn to_legacy_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(true) => "1".to_string(),
            Self::Bool(false) => String::new(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::List(_) | Self::Map(_) => self.serialized_text(),
        }
    }

    fn serialized_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Host serialization rule: non-scalar values become their serialized
    /// text, scalars pass through untouched.
    pub fn maybe_serialize(&self) -> MetaValue {
        match self {
            Self::List(_) | Self::Map(_) => Self::Text(self.serialized_text()),
            other => other.clone(),
        }
    }

    /// Inverse of [`MetaValue::maybe_serialize`] for text read back from
    /// legacy storage.
    pub fn maybe_unserialize(text: &str) -> MetaValue {
        let trimmed = text.trim();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            if let Ok(parsed) = serde_json::from_str::<MetaValue>(trimmed) {
                if parsed.is_array() {
                    return parsed;
                }
            }
        }
        Self::Text(text.to_string())
    }

    /// Entries of a list or map as `(key, value)` pairs in order. List keys
    /// are positions.
    pub fn array_entries(&self) -> Option<Vec<(String, &MetaValue)>> {
        match self {
            Self::List(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| (idx.to_string(), item))
                    .collect(),
            ),
            Self::Map(entries) => Some(entries.iter().map(|(k, v)| (k.clone(), v)).collect()),
            _ => None,
        }
    }

    /// Values of a list or map in order.
    pub fn array_values(&self) -> Option<Vec<&MetaValue>> {
        match self {
            Self::List(items) => Some(items.iter().collect()),
            Self::Map(entries) => Some(entries.values().collect()),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        match self {
            Self::Map(entries) => entries.get(key),
            Self::List(items) => key.parse::<usize>().ok().and_then(|idx| items.get(idx)),
            _ => None,
        }
    }

    /// Binds the value for a column write. NULL always stays NULL.
    pub fn to_storage(&self, format: Format) -> Value {
        if matches!(self, Self::Null) {
            return Value::Null;
        }
        match format {
            Format::Text => Value::Text(self.to_legacy_string()),
            Format::Integer => Value::Integer(self.as_i64()),
            Format::Float => Value::Float(self.as_f64()),
            Format::Raw => match self {
                Self::Null => Value::Null,
                Self::Bool(b) => Value::Integer(i64::from(*b)),
                Self::Int(i) => Value::Integer(*i),
                Self::Float(f) => Value::Float(*f),
                Self::Text(s) => Value::Text(s.clone()),
                Self::List(_) | Self::Map(_) => Value::Text(self.serialized_text()),
            },
        }
    }
}

impl From<Value> for MetaValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Integer(i) => Self::Int(i),
            Value::Float(f) => Self::Float(f),
            Value::Text(s) => Self::Text(s),
            Value::Boolean(b) => Self::Bool(b),
        }
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for MetaValue {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for MetaValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<MetaValue>> for MetaValue {
    fn from(items: Vec<MetaValue>) -> Self {
        Self::List(items)
    }
}

impl From<IndexMap<String, MetaValue>> for MetaValue {
    fn from(entries: IndexMap<String, MetaValue>) -> Self {
        Self::Map(entries)
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Null => write!(f, "null"),
            other => write!(f, "{}", serde_json::to_string(other).unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness_follows_loose_rules() {
        assert!(!MetaValue::text("").is_truthy());
        assert!(!MetaValue::text("0").is_truthy());
        assert!(MetaValue::text("0.0").is_truthy());
        assert!(!MetaValue::Int(0).is_truthy());
        assert!(!MetaValue::List(vec![]).is_truthy());
        assert!(MetaValue::list([MetaValue::Null]).is_truthy());
    }

    #[test]
    fn test_flag_strings() {
        assert!(MetaValue::text("yes").as_flag());
        assert!(!MetaValue::text("no").as_flag());
        assert!(MetaValue::Int(1).as_flag());
        assert!(!MetaValue::Bool(false).as_flag());
    }

    #[test]
    fn test_serialize_only_non_scalars() {
        assert_eq!(MetaValue::Int(5).maybe_serialize(), MetaValue::Int(5));
        assert_eq!(
            MetaValue::list([20, 30]).maybe_serialize(),
            MetaValue::text("[20,30]")
        );
        assert_eq!(MetaValue::maybe_unserialize("[20,30]"), MetaValue::list([20, 30]));
        assert_eq!(MetaValue::maybe_unserialize("[oops"), MetaValue::text("[oops"));
        assert_eq!(MetaValue::maybe_unserialize("12"), MetaValue::text("12"));
    }

    #[test]
    fn test_bind_by_format() {
        assert_eq!(MetaValue::text("11.50").to_storage(Format::Float), Value::Float(11.5));
        assert_eq!(MetaValue::Bool(true).to_storage(Format::Integer), Value::Integer(1));
        assert_eq!(MetaValue::text("").to_storage(Format::Integer), Value::Integer(0));
        assert_eq!(MetaValue::Int(9).to_storage(Format::Text), Value::Text("9".into()));
        assert_eq!(MetaValue::Null.to_storage(Format::Integer), Value::Null);
    }

    #[test]
    fn test_untagged_json_shape() {
        let parsed: MetaValue = serde_json::from_str(r#"{"b": [1, 2.5, "x", null, true]}"#).unwrap();
        let expected: IndexMap<String, MetaValue> = [(
            "b".to_string(),
            MetaValue::List(vec![
                MetaValue::Int(1),
                MetaValue::Float(2.5),
                MetaValue::text("x"),
                MetaValue::Null,
                MetaValue::Bool(true),
            ]),
        )]
        .into_iter()
        .collect();
        assert_eq!(parsed, MetaValue::Map(expected));
    }
}
