//! JSON import and export of table rows.
use crate::database::Database;
use crate::errors::Error;
use crate::storage::{ColumnType, ColumnValue, Filter, Row, TableSchema, Values, ID_COLUMN};
use serde_json::{Map, Number, Value};
use std::path::Path;
use tracing::info;

/// Writes every row of `table`, `_id` included, to `path` as a JSON array.
pub fn export_table(db: &Database, table: &str, path: &Path) -> Result<usize, Error> {
    let rows = db.select(table, &Filter::all(), None)?;
    let document = Value::Array(rows.iter().map(row_to_json).collect());
    std::fs::write(path, serde_json::to_vec_pretty(&document)?)?;
    info!(table, rows = rows.len(), path = %path.display(), "Exported table.");
    Ok(rows.len())
}

/// Inserts every object of the JSON array at `path` into `table`, dropping
/// any `_id` field. Stops at the first rejected row; earlier rows stay.
pub fn import_table(db: &mut Database, table: &str, path: &Path) -> Result<usize, Error> {
    let schema = db.describe(table)?.schema;
    let text = std::fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&text)?;
    let items = match document {
        Value::Array(items) => items,
        _ => return Err(err!(Encoding, "Import document must be a JSON array of objects")),
    };

    let mut count = 0;
    for (i, item) in items.into_iter().enumerate() {
        let object = match item {
            Value::Object(object) => object,
            _ => return Err(err!(Encoding, "Import item {} is not an object", i)),
        };
        db.insert(table, json_to_values(object, &schema)?)?;
        count += 1;
    }
    info!(table, rows = count, path = %path.display(), "Imported table.");
    Ok(count)
}

pub fn row_to_json(row: &Row) -> Value {
    let mut object = Map::new();
    object.insert(ID_COLUMN.to_string(), Value::from(row.id()));
    for (column, value) in row.values() {
        object.insert(column.clone(), value_to_json(value));
    }
    Value::Object(object)
}

fn value_to_json(value: &ColumnValue) -> Value {
    match value {
        ColumnValue::Str(v) => Value::String(v.clone()),
        ColumnValue::Int(v) => Value::from(*v),
        ColumnValue::Float(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
        ColumnValue::Bool(v) => Value::Bool(*v),
    }
}

fn json_to_values(object: Map<String, Value>, schema: &TableSchema) -> Result<Values, Error> {
    let mut values = Values::new();
    for (column, value) in object {
        if column == ID_COLUMN {
            continue;
        }
        let declared = schema.get(&column).map(|c| c.type_);
        let value = match value {
            Value::Null => continue,
            Value::Bool(b) => ColumnValue::Bool(b),
            Value::String(s) => ColumnValue::Str(s),
            Value::Number(n) => match (declared, n.as_i64(), n.as_f64()) {
                (Some(ColumnType::Float), _, Some(f)) => ColumnValue::Float(f),
                (_, Some(i), _) => ColumnValue::Int(i),
                (_, None, Some(f)) => ColumnValue::Float(f),
                _ => return Err(err!(Encoding, "Unsupported number {} in column '{}'", n, column)),
            },
            Value::Array(_) | Value::Object(_) => {
                return Err(err!(Encoding, "Column '{}' holds a nested value", column))
            }
        };
        values.insert(column, value);
    }
    Ok(values)
}
