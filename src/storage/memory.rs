use super::engine::StorageEngine;
use super::statement::{Select, SortOrder, Statement};
use super::{Table, TableSchema};
use crate::core::{CompatError, Result, Row};
use crate::result::QueryResult;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{Level, event};

/// In-memory relational backend. Each statement runs under the table map's
/// lock, which gives single-statement atomicity and nothing more.
pub struct InMemoryStorage {
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Row count of a table
    pub fn row_count(&self, table_name: &str) -> Result<usize> {
        let tables = self.tables.read()?;
        tables
            .get(table_name)
            .map(Table::row_count)
            .ok_or_else(|| CompatError::TableNotFound(table_name.to_string()))
    }

    fn select(table: &Table, select: &Select) -> Result<QueryResult> {
        let mut rows = table.scan(&select.filter)?;

        if let Some((column, order)) = &select.order_by {
            let idx = table.column_index(column)?;
            rows.sort_by(|a, b| {
                let ord = a[idx].compare(&b[idx]);
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        let columns: Vec<String> = if select.columns.is_empty() {
            table
                .schema()
                .schema()
                .columns()
                .iter()
                .map(|c| c.name.clone())
                .collect()
        } else {
            select.columns.clone()
        };
        let indexes = columns
            .iter()
            .map(|c| table.column_index(c))
            .collect::<Result<Vec<_>>>()?;

        let mut projected: Vec<Row> = Vec::with_capacity(rows.len());
        for row in rows {
            let out: Row = indexes.iter().map(|idx| row[*idx].clone()).collect();
            // DISTINCT keeps the first occurrence so ORDER BY survives.
            if select.distinct && projected.contains(&out) {
                continue;
            }
            projected.push(out);
        }

        Ok(QueryResult::new(columns, projected))
    }
}

impl StorageEngine for InMemoryStorage {
    fn create_table(&self, schema: TableSchema) -> Result<()> {
        let mut tables = self.tables.write()?;
        let name = schema.name().to_string();

        if tables.contains_key(&name) {
            return Err(CompatError::TableExists(name));
        }

        tables.insert(name, Table::new(schema));
        Ok(())
    }

    fn execute(&self, statement: &Statement) -> Result<QueryResult> {
        event!(Level::DEBUG, sql = %statement, "storage statement");

        if let Statement::Select(select) = statement {
            let tables = self.tables.read()?;
            let table = tables
                .get(&select.table)
                .ok_or_else(|| CompatError::TableNotFound(select.table.clone()))?;
            return Self::select(table, select);
        }

        let mut tables = self.tables.write()?;
        let name = statement.table();
        let table = tables
            .get_mut(name)
            .ok_or_else(|| CompatError::TableNotFound(name.to_string()))?;

        let affected = match statement {
            Statement::Insert { values, .. } => {
                let row = table.build_row(values)?;
                table.insert(row)?;
                1
            }
            Statement::Replace { values, .. } => {
                let row = table.build_row(values)?;
                table.replace(row)?
            }
            Statement::Update {
                assignments, filter, ..
            } => table.update(filter, assignments)?,
            Statement::Delete { filter, .. } => table.delete(filter)?,
            Statement::Select(_) => unreachable!("reads are handled above"),
        };

        event!(Level::TRACE, affected, "storage statement applied");
        Ok(QueryResult::affected(affected))
    }

    fn table_exists(&self, name: &str) -> bool {
        self.tables
            .read()
            .map(|tables| tables.contains_key(name))
            .unwrap_or(false)
    }

    fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .read()
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DataType, Value};
    use crate::storage::statement::Condition;

    fn storage() -> InMemoryStorage {
        let storage = InMemoryStorage::new();
        storage
            .create_table(
                TableSchema::new(
                    "items",
                    vec![
                        Column::new("id", DataType::Integer).not_null(),
                        Column::new("name", DataType::Text),
                        Column::new("priority", DataType::Integer),
                    ],
                )
                .unique_key(&["id"]),
            )
            .unwrap();
        storage
    }

    fn insert(storage: &InMemoryStorage, id: i64, name: &str, priority: i64) {
        storage
            .execute(&Statement::Insert {
                table: "items".into(),
                values: vec![
                    ("id".into(), id.into()),
                    ("name".into(), name.into()),
                    ("priority".into(), priority.into()),
                ],
            })
            .unwrap();
    }

    #[test]
    fn test_create_table_twice_fails() {
        let storage = storage();
        let result = storage.create_table(TableSchema::new("items", vec![]));
        assert!(matches!(result, Err(CompatError::TableExists(_))));
    }

    #[test]
    fn test_select_ordered_distinct() {
        let storage = storage();
        insert(&storage, 1, "b", 2);
        insert(&storage, 2, "a", 1);
        insert(&storage, 3, "b", 0);

        let result = storage
            .execute(&Statement::Select(
                Select::from("items")
                    .columns(&["name"])
                    .order_by("priority", SortOrder::Asc)
                    .distinct(),
            ))
            .unwrap();
        assert_eq!(
            result.first_column(),
            vec![Value::Text("b".into()), Value::Text("a".into())]
        );
    }

    #[test]
    fn test_update_reports_matched_rows() {
        let storage = storage();
        insert(&storage, 1, "a", 0);

        let result = storage
            .execute(&Statement::Update {
                table: "items".into(),
                assignments: vec![("name".into(), "z".into())],
                filter: vec![Condition::eq("id", 1i64), Condition::eq("name", "a")],
            })
            .unwrap();
        assert_eq!(result.affected_rows, 1);

        let miss = storage
            .execute(&Statement::Update {
                table: "items".into(),
                assignments: vec![("name".into(), "y".into())],
                filter: vec![Condition::eq("id", 1i64), Condition::eq("name", "a")],
            })
            .unwrap();
        assert_eq!(miss.affected_rows, 0);
    }

    #[test]
    fn test_missing_table() {
        let storage = storage();
        let result = storage.execute(&Statement::Delete {
            table: "ghost".into(),
            filter: vec![],
        });
        assert!(matches!(result, Err(CompatError::TableNotFound(_))));
    }
}
