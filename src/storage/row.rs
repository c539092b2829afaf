use super::column::ColumnValue;
use super::schema::ID_COLUMN;
use bincode::{Decode, Encode};
use std::collections::BTreeMap;

/// Column name to value mapping used for write payloads and filters.
pub type Values = BTreeMap<String, ColumnValue>;

/// A stored row. The identifier lives outside `values` so that no payload
/// can ever set or overwrite it.
#[derive(Encode, Decode, Debug, Clone, PartialEq)]
pub struct Row {
    id: u64,
    values: Values,
}

impl Row {
    pub(crate) fn new(id: u64, values: Values) -> Self {
        Row { id, values }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.values.get(column)
    }

    /// Returns the display form of a column, including the identifier column.
    pub fn get_column(&self, column: &str) -> Option<String> {
        if column == ID_COLUMN {
            return Some(self.id.to_string());
        }
        Some(self.values.get(column)?.to_string())
    }

    /// Overwrites the given columns in place, leaving the others untouched.
    pub(crate) fn merge(&mut self, data: &Values) {
        for (column, value) in data {
            self.values.insert(column.clone(), value.clone());
        }
    }
}
