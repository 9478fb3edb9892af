//! Typed statements issued against the storage engine.
//!
//! Handlers never build SQL strings; they build a [`Statement`] and the engine
//! executes it. `Display` renders the statement as SQL with escaped
//! identifiers and literals, which is what ends up in the logs.

use crate::core::Value;
use std::fmt;

/// Equality predicate `column = value`. Multiple conditions are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub value: Value,
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub columns: Vec<String>,
    pub filter: Vec<Condition>,
    pub order_by: Option<(String, SortOrder)>,
    pub distinct: bool,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filter: Vec::new(),
            order_by: None,
            distinct: false,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.filter.push(condition);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by = Some((column.into(), order));
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert {
        table: String,
        values: Vec<(String, Value)>,
    },
    Replace {
        table: String,
        values: Vec<(String, Value)>,
    },
    Update {
        table: String,
        assignments: Vec<(String, Value)>,
        filter: Vec<Condition>,
    },
    Delete {
        table: String,
        filter: Vec<Condition>,
    },
}

impl Statement {
    pub fn table(&self) -> &str {
        match self {
            Self::Select(select) => &select.table,
            Self::Insert { table, .. }
            | Self::Replace { table, .. }
            | Self::Update { table, .. }
            | Self::Delete { table, .. } => table,
        }
    }
}

/// Quote an identifier with backticks, dropping any embedded backtick.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', ""))
}

/// Render a value as an SQL literal, escaping quotes and backslashes.
pub fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Text(s) => {
            let mut escaped = String::with_capacity(s.len() + 2);
            escaped.push('\'');
            for c in s.chars() {
                match c {
                    '\'' => escaped.push_str("\\'"),
                    '\\' => escaped.push_str("\\\\"),
                    '\0' => escaped.push_str("\\0"),
                    '\n' => escaped.push_str("\\n"),
                    '\r' => escaped.push_str("\\r"),
                    other => escaped.push(other),
                }
            }
            escaped.push('\'');
            escaped
        }
    }
}

fn write_where(f: &mut fmt::Formatter<'_>, filter: &[Condition]) -> fmt::Result {
    if filter.is_empty() {
        return Ok(());
    }
    let clauses: Vec<String> = filter
        .iter()
        .map(|c| format!("{} = {}", quote_identifier(&c.column), quote_literal(&c.value)))
        .collect();
    write!(f, " WHERE {}", clauses.join(" AND "))
}

fn write_values(f: &mut fmt::Formatter<'_>, values: &[(String, Value)]) -> fmt::Result {
    let columns: Vec<String> = values.iter().map(|(c, _)| quote_identifier(c)).collect();
    let literals: Vec<String> = values.iter().map(|(_, v)| quote_literal(v)).collect();
    write!(f, " ({}) VALUES ({})", columns.join(", "), literals.join(", "))
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(select) => {
                write!(f, "SELECT ")?;
                if select.distinct {
                    write!(f, "DISTINCT ")?;
                }
                if select.columns.is_empty() {
                    write!(f, "*")?;
                } else {
                    let columns: Vec<String> = select.columns.iter().map(|c| quote_identifier(c)).collect();
                    write!(f, "{}", columns.join(", "))?;
                }
                write!(f, " FROM {}", quote_identifier(&select.table))?;
                write_where(f, &select.filter)?;
                if let Some((column, order)) = &select.order_by {
                    let dir = match order {
                        SortOrder::Asc => "ASC",
                        SortOrder::Desc => "DESC",
                    };
                    write!(f, " ORDER BY {} {}", quote_identifier(column), dir)?;
                }
                Ok(())
            }
            Self::Insert { table, values } => {
                write!(f, "INSERT INTO {}", quote_identifier(table))?;
                write_values(f, values)
            }
            Self::Replace { table, values } => {
                write!(f, "REPLACE INTO {}", quote_identifier(table))?;
                write_values(f, values)
            }
            Self::Update {
                table,
                assignments,
                filter,
            } => {
                let sets: Vec<String> = assignments
                    .iter()
                    .map(|(c, v)| format!("{} = {}", quote_identifier(c), quote_literal(v)))
                    .collect();
                write!(f, "UPDATE {} SET {}", quote_identifier(table), sets.join(", "))?;
                write_where(f, filter)
            }
            Self::Delete { table, filter } => {
                write!(f, "DELETE FROM {}", quote_identifier(table))?;
                write_where(f, filter)
            }
        }
    }
}
