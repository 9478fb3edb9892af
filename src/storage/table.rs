use crate::core::{Column, CompatError, Result, Row, Schema, Value};
use std::collections::BTreeMap;

use super::statement::Condition;

#[derive(Debug, Clone)]
pub struct Table {
    schema: TableSchema,
    rows: BTreeMap<usize, Row>,
    next_row_id: usize,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_row_id: 0,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Build a full row from named values, filling the rest from defaults.
    pub fn build_row(&self, values: &[(String, Value)]) -> Result<Row> {
        let mut row = self.schema.schema().default_row();
        for (name, value) in values {
            let idx = self.column_index(name)?;
            row[idx] = self.schema.schema().columns()[idx].data_type.coerce(value.clone());
        }
        Ok(row)
    }

    pub fn insert(&mut self, row: Row) -> Result<usize> {
        self.validate_row(&row)?;
        if let Some(existing) = self.find_key_conflict(&row, None) {
            return Err(CompatError::ConstraintViolation(format!(
                "Duplicate key in '{}' (row {})",
                self.schema.name(),
                existing
            )));
        }
        Ok(self.push_row(row))
    }

    /// Insert-or-replace on the unique key. Returns the number of rows touched
    /// (1 for a plain insert, 2 when an existing row was replaced).
    pub fn replace(&mut self, row: Row) -> Result<usize> {
        self.validate_row(&row)?;
        let mut affected = 1;
        while let Some(existing) = self.find_key_conflict(&row, None) {
            self.rows.remove(&existing);
            affected += 1;
        }
        self.push_row(row);
        Ok(affected)
    }

    /// Apply `assignments` to every row matching `filter`. Returns the number of
    /// matched rows.
    pub fn update(&mut self, filter: &[Condition], assignments: &[(String, Value)]) -> Result<usize> {
        let resolved_filter = self.resolve_filter(filter)?;
        let mut resolved_assignments = Vec::with_capacity(assignments.len());
        for (name, value) in assignments {
            let idx = self.column_index(name)?;
            let coerced = self.schema.schema().columns()[idx].data_type.coerce(value.clone());
            resolved_assignments.push((idx, coerced));
        }

        let ids: Vec<usize> = self
            .rows
            .iter()
            .filter(|(_, row)| Self::matches(row, &resolved_filter))
            .map(|(id, _)| *id)
            .collect();

        for id in &ids {
            let mut new_row = self.rows[id].clone();
            for (idx, value) in &resolved_assignments {
                new_row[*idx] = value.clone();
            }
            self.validate_row(&new_row)?;
            if self.find_key_conflict(&new_row, Some(*id)).is_some() {
                return Err(CompatError::ConstraintViolation(format!(
                    "Update would duplicate a key in '{}'",
                    self.schema.name()
                )));
            }
            self.rows.insert(*id, new_row);
        }

        Ok(ids.len())
    }

    pub fn delete(&mut self, filter: &[Condition]) -> Result<usize> {
        let resolved = self.resolve_filter(filter)?;
        let before = self.rows.len();
        self.rows.retain(|_, row| !Self::matches(row, &resolved));
        Ok(before - self.rows.len())
    }

    /// Rows matching `filter`, in insertion order.
    pub fn scan(&self, filter: &[Condition]) -> Result<Vec<Row>> {
        let resolved = self.resolve_filter(filter)?;
        Ok(self
            .rows
            .values()
            .filter(|row| Self::matches(row, &resolved))
            .cloned()
            .collect())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.schema
            .schema()
            .find_column_index(name)
            .ok_or_else(|| CompatError::ColumnNotFound(name.to_string(), self.schema.name().to_string()))
    }

    fn push_row(&mut self, row: Row) -> usize {
        let id = self.next_row_id;
        self.next_row_id += 1;
        self.rows.insert(id, row);
        id
    }

    fn resolve_filter(&self, filter: &[Condition]) -> Result<Vec<(usize, Value)>> {
        filter
            .iter()
            .map(|condition| {
                let idx = self.column_index(&condition.column)?;
                let data_type = self.schema.schema().columns()[idx].data_type;
                Ok((idx, data_type.coerce(condition.value.clone())))
            })
            .collect()
    }

    // `column = NULL` never matches, as in SQL.
    fn matches(row: &Row, filter: &[(usize, Value)]) -> bool {
        filter
            .iter()
            .all(|(idx, value)| !value.is_null() && !row[*idx].is_null() && &row[*idx] == value)
    }

    fn find_key_conflict(&self, row: &Row, ignore_id: Option<usize>) -> Option<usize> {
        let key_indexes = self.schema.key_indexes();
        if key_indexes.is_empty() {
            return None;
        }
        self.rows
            .iter()
            .filter(|(id, _)| Some(**id) != ignore_id)
            .find(|(_, existing)| key_indexes.iter().all(|idx| existing[*idx] == row[*idx]))
            .map(|(id, _)| *id)
    }

    fn validate_row(&self, row: &Row) -> Result<()> {
        let columns = self.schema.schema().columns();
        if row.len() != columns.len() {
            return Err(CompatError::ExecutionError(format!(
                "Expected {} columns, got {}",
                columns.len(),
                row.len()
            )));
        }
        for (column, value) in columns.iter().zip(row.iter()) {
            column.validate(value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    schema: Schema,
    unique_key: Vec<String>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            schema: Schema::new(columns),
            unique_key: Vec::new(),
        }
    }

    /// Declare the (possibly composite) key that `REPLACE` upserts on.
    pub fn unique_key(mut self, columns: &[&str]) -> Self {
        self.unique_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn key_indexes(&self) -> Vec<usize> {
        self.unique_key
            .iter()
            .filter_map(|name| self.schema.find_column_index(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    fn relationships() -> Table {
        Table::new(
            TableSchema::new(
                "rel",
                vec![
                    Column::new("type", DataType::Text).not_null(),
                    Column::new("product_id", DataType::Integer).not_null(),
                    Column::new("object_id", DataType::Integer).not_null(),
                    Column::new("priority", DataType::Integer).default_value(0i64),
                ],
            )
            .unique_key(&["type", "product_id", "object_id"]),
        )
    }

    fn row(table: &Table, object_id: i64, priority: i64) -> Row {
        table
            .build_row(&[
                ("type".into(), "upsell".into()),
                ("product_id".into(), 1i64.into()),
                ("object_id".into(), object_id.into()),
                ("priority".into(), priority.into()),
            ])
            .unwrap()
    }

    #[test]
    fn test_insert_rejects_duplicate_key() {
        let mut table = relationships();
        let first = row(&table, 20, 0);
        table.insert(first.clone()).unwrap();
        assert!(matches!(table.insert(first), Err(CompatError::ConstraintViolation(_))));
    }

    #[test]
    fn test_replace_overwrites_on_key() {
        let mut table = relationships();
        assert_eq!(table.replace(row(&table, 20, 0)).unwrap(), 1);
        assert_eq!(table.replace(row(&table, 20, 5)).unwrap(), 2);
        assert_eq!(table.row_count(), 1);
        let rows = table.scan(&[]).unwrap();
        assert_eq!(rows[0][3], Value::Integer(5));
    }

    #[test]
    fn test_update_and_delete_with_filter() {
        let mut table = relationships();
        table.insert(row(&table, 20, 0)).unwrap();
        table.insert(row(&table, 30, 1)).unwrap();

        let filter = [Condition::eq("object_id", "30")];
        let updated = table.update(&filter, &[("priority".into(), Value::Integer(9))]).unwrap();
        assert_eq!(updated, 1);

        assert_eq!(table.delete(&[Condition::eq("object_id", 20i64)]).unwrap(), 1);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_null_condition_never_matches() {
        let mut table = relationships();
        table.insert(row(&table, 20, 0)).unwrap();
        assert!(table.scan(&[Condition::eq("priority", Value::Null)]).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let table = relationships();
        assert!(matches!(
            table.scan(&[Condition::eq("nope", 1i64)]),
            Err(CompatError::ColumnNotFound(_, _))
        ));
    }
}
