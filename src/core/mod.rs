pub mod error;
pub mod meta;
pub mod types;
pub mod value;

pub use error::{CompatError, Result};
pub use meta::MetaValue;
pub use types::{Column, Row, Schema};
pub use value::{DataType, Value};
