//! Tabular data model: typed cells, decoded groups and canonical tables.

mod canonical;
mod group;
mod schema;
mod value;

pub use canonical::{Table, TableKind};
pub use group::{GroupMap, GroupTable};
pub use schema::{ColumnKind, ColumnRole, ColumnSchema, TableSchema};
pub use value::Value;
