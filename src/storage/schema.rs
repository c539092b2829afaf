use super::column::ColumnType;
use crate::errors::Error;
use bincode::{Decode, Encode};

/// Name of the store-assigned row identifier column.
pub const ID_COLUMN: &str = "_id";

/// Ordered column declarations of a table. Fixed at creation.
#[derive(Encode, Decode, Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub columns: Vec<ColumnSchema>,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub type_: ColumnType,
}

impl TableSchema {
    /// Builds a schema, rejecting empty column lists, duplicate names and the
    /// reserved identifier column.
    pub fn new(columns: Vec<ColumnSchema>) -> Result<TableSchema, Error> {
        if columns.is_empty() {
            return Err(err!(Schema, "Table must have at least one column"));
        }
        for (i, column) in columns.iter().enumerate() {
            if column.name == ID_COLUMN {
                return Err(err!(Schema, "Column name '{}' is reserved", ID_COLUMN));
            }
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(err!(Schema, "Duplicate column '{}'", column.name));
            }
        }
        Ok(TableSchema { columns })
    }

    pub fn from_pairs<S: Into<String>>(pairs: Vec<(S, ColumnType)>) -> Result<TableSchema, Error> {
        TableSchema::new(
            pairs
                .into_iter()
                .map(|(name, type_)| ColumnSchema {
                    name: name.into(),
                    type_,
                })
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_schema_is_rejected() {
        let err = TableSchema::new(vec![]).unwrap_err();
        assert_eq!(err.code(), 5000);
    }

    #[test]
    fn test_duplicate_and_reserved_columns_are_rejected() {
        let dup = TableSchema::from_pairs(vec![
            ("name", ColumnType::String),
            ("name", ColumnType::Integer),
        ]);
        assert!(matches!(dup, Err(Error::Schema(_))));

        let reserved = TableSchema::from_pairs(vec![("_id", ColumnType::Integer)]);
        assert!(matches!(reserved, Err(Error::Schema(_))));
    }

    #[test]
    fn test_columns_keep_declaration_order() {
        let schema = TableSchema::from_pairs(vec![
            ("name", ColumnType::String),
            ("price", ColumnType::Float),
            ("stock", ColumnType::Integer),
        ])
        .unwrap();
        assert_eq!(schema.names(), vec!["name", "price", "stock"]);
        assert_eq!(schema.get("price").map(|c| c.type_), Some(ColumnType::Float));
        assert!(!schema.contains("_id"));
    }
}
