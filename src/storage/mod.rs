pub mod catalog;
pub mod engine;
pub mod memory;
pub mod statement;
pub mod table;

pub use catalog::{Catalog, ProductColumn};
pub use engine::StorageEngine;
pub use memory::InMemoryStorage;
pub use statement::{Condition, Select, SortOrder, Statement};
pub use table::{Table, TableSchema};
