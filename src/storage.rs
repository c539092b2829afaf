//! In-memory table storage: column kinds, schemas, rows, filters, the row
//! store itself and the snapshot codec.
pub mod column;
pub mod encoding;
pub mod filter;
pub mod row;
pub mod schema;
pub mod table;

pub use column::{ColumnType, ColumnValue};
pub use encoding::Tables;
pub use filter::Filter;
pub use row::{Row, Values};
pub use schema::{ColumnSchema, TableSchema, ID_COLUMN};
pub use table::Table;
