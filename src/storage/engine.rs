use super::statement::Statement;
use super::table::TableSchema;
use crate::core::Result;
use crate::result::QueryResult;

/// Storage engine trait - the relational backend the handlers talk to.
///
/// Every statement is a single, synchronous, single-attempt operation; there
/// are no transactions at this level.
pub trait StorageEngine: Send + Sync {
    /// Create a new table with the given schema
    fn create_table(&self, schema: TableSchema) -> Result<()>;

    /// Execute one statement
    fn execute(&self, statement: &Statement) -> Result<QueryResult>;

    /// Check if a table exists
    fn table_exists(&self, name: &str) -> bool;

    /// List all table names
    fn list_tables(&self) -> Vec<String>;
}
