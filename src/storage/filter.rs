use super::column::ColumnValue;
use super::row::{Row, Values};
use super::schema::ID_COLUMN;

/// Conjunction of column equality conditions. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Values,
}

impl Filter {
    pub fn new(conditions: Values) -> Self {
        Filter { conditions }
    }

    pub fn all() -> Self {
        Filter::default()
    }

    /// Adds an equality condition, replacing any earlier one on the same column.
    pub fn and<V: Into<ColumnValue>>(mut self, column: &str, value: V) -> Self {
        self.conditions.insert(column.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &Values {
        &self.conditions
    }

    /// A row matches when every condition names a column present in the row
    /// with an equal value. Absent columns never match.
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|(column, expected)| {
            if column == ID_COLUMN {
                return i64::try_from(row.id())
                    .map(|id| ColumnValue::Int(id).matches(expected))
                    .unwrap_or(false);
            }
            row.get(column)
                .map_or(false, |actual| actual.matches(expected))
        })
    }
}

impl From<Values> for Filter {
    fn from(conditions: Values) -> Self {
        Filter::new(conditions)
    }
}
