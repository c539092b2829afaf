use super::filter::Filter;
use super::row::{Row, Values};
use super::schema::{TableSchema, ID_COLUMN};
use crate::errors::Error;
use bincode::{Decode, Encode};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// A single table: its schema, its rows keyed by `_id`, and the identifier
/// sequence.
///
/// Invariants:
/// - every row is stored under its own `_id`;
/// - `next_id` is greater than every `_id` ever assigned, deleted rows included;
/// - every column of every stored row is declared in `schema`.
#[derive(Encode, Decode, Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    schema: TableSchema,
    rows: BTreeMap<u64, Row>,
    next_id: u64,
}

impl Table {
    pub fn create(name: &str, schema: TableSchema) -> Result<Table, Error> {
        if schema.columns.is_empty() {
            return Err(err!(Schema, "Table '{}' must have at least one column", name));
        }
        Ok(Table {
            name: name.to_string(),
            schema,
            rows: BTreeMap::new(),
            next_id: 1,
        })
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Stores a new row and returns its assigned `_id`. Columns the caller
    /// omits stay absent.
    pub fn insert(&mut self, data: Values) -> Result<u64, Error> {
        self.check_columns(data.keys())?;

        let row_id = self.next_id;
        debug!(table = self.name, row_id, "Inserting a row...");
        self.rows.insert(row_id, Row::new(row_id, data));
        self.next_id += 1;
        Ok(row_id)
    }

    /// Returns copies of matching rows in ascending `_id` order.
    ///
    /// A `limit` of zero yields nothing; a negative or absent `limit` yields
    /// every match.
    pub fn select(&self, filter: &Filter, limit: Option<i64>) -> Vec<Row> {
        let limit = limit.and_then(|l| usize::try_from(l).ok());
        let matching = self.rows.values().filter(|row| filter.matches(row));
        match limit {
            Some(n) => matching.take(n).cloned().collect(),
            None => matching.cloned().collect(),
        }
    }

    /// Overwrites the given columns of every matching row and returns how
    /// many rows matched. A reserved `_id` key in `data` is ignored.
    pub fn update(&mut self, mut data: Values, filter: &Filter) -> Result<usize, Error> {
        data.remove(ID_COLUMN);
        self.check_columns(data.keys())?;

        let ids = self.matching_ids(filter);
        for id in &ids {
            if let Some(row) = self.rows.get_mut(id) {
                row.merge(&data);
            }
        }
        trace!(table = self.name, rows = ids.len(), "Updated rows.");
        Ok(ids.len())
    }

    /// Removes every matching row and returns how many were removed.
    pub fn delete(&mut self, filter: &Filter) -> usize {
        let ids = self.matching_ids(filter);
        for id in &ids {
            self.rows.remove(id);
        }
        trace!(table = self.name, rows = ids.len(), "Deleted rows.");
        ids.len()
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Checks the identifier invariants of a table read back from storage.
    pub(crate) fn check_integrity(&self) -> Result<(), Error> {
        for (key, row) in &self.rows {
            if *key == 0 || *key != row.id() {
                return Err(err!(
                    Encoding,
                    "Table '{}' stores row {} under key {}",
                    self.name,
                    row.id(),
                    key
                ));
            }
        }
        let last = self.rows.keys().next_back().copied().unwrap_or(0);
        if self.next_id <= last || self.next_id == 0 {
            return Err(err!(
                Encoding,
                "Table '{}' has next id {} but holds row {}",
                self.name,
                self.next_id,
                last
            ));
        }
        Ok(())
    }

    fn matching_ids(&self, filter: &Filter) -> Vec<u64> {
        self.rows
            .values()
            .filter(|row| filter.matches(row))
            .map(Row::id)
            .collect()
    }

    fn check_columns<'a, I: Iterator<Item = &'a String>>(&self, columns: I) -> Result<(), Error> {
        for column in columns {
            if !self.schema.contains(column) {
                return Err(err!(
                    Column,
                    "Column '{}' does not exist in table '{}'",
                    column,
                    self.name
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::column::{ColumnType, ColumnValue};

    fn products() -> Table {
        let schema = TableSchema::from_pairs(vec![
            ("name", ColumnType::String),
            ("price", ColumnType::Float),
            ("stock", ColumnType::Integer),
        ])
        .unwrap();
        Table::create("products", schema).unwrap()
    }

    fn values(pairs: &[(&str, ColumnValue)]) -> Values {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut table = products();
        let a = table.insert(values(&[("name", "A".into())])).unwrap();
        let b = table.insert(values(&[("name", "B".into())])).unwrap();
        assert_eq!((a, b), (1, 2));

        table.delete(&Filter::all().and("_id", 2i64));
        let c = table.insert(values(&[("name", "C".into())])).unwrap();
        assert_eq!(c, 3);
        assert_eq!(table.next_id(), 4);
    }

    #[test]
    fn test_insert_rejects_undeclared_column() {
        let mut table = products();
        let err = table
            .insert(values(&[("name", "A".into()), ("color", "red".into())]))
            .unwrap_err();
        assert!(matches!(err, Error::Column(_)));
        assert_eq!(table.count(), 0);
        assert_eq!(table.next_id(), 1);
    }

    #[test]
    fn test_insert_rejects_identifier_in_payload() {
        let mut table = products();
        let err = table.insert(values(&[("_id", 99i64.into())])).unwrap_err();
        assert!(matches!(err, Error::Column(_)));
    }

    #[test]
    fn test_partial_rows_are_permitted() {
        let mut table = products();
        let id = table.insert(values(&[("name", "Pen".into())])).unwrap();
        let rows = table.select(&Filter::all(), None);
        assert_eq!(rows[0].id(), id);
        assert_eq!(rows[0].get("price"), None);
    }

    #[test]
    fn test_select_limit() {
        let mut table = products();
        for name in ["A", "B", "C"] {
            table.insert(values(&[("name", name.into())])).unwrap();
        }
        assert_eq!(table.select(&Filter::all(), Some(0)).len(), 0);
        assert_eq!(table.select(&Filter::all(), Some(2)).len(), 2);
        assert_eq!(table.select(&Filter::all(), Some(-1)).len(), 3);
        assert_eq!(table.select(&Filter::all(), None).len(), 3);

        let ids: Vec<u64> = table.select(&Filter::all(), None).iter().map(Row::id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_select_returns_copies() {
        let mut table = products();
        table.insert(values(&[("name", "A".into())])).unwrap();
        let mut rows = table.select(&Filter::all(), None);
        rows[0].merge(&values(&[("name", "Z".into())]));

        let fresh = table.select(&Filter::all(), None);
        assert_eq!(fresh[0].get("name"), Some(&ColumnValue::from("A")));
    }

    #[test]
    fn test_update_changes_only_given_columns() {
        let mut table = products();
        table
            .insert(values(&[("name", "X".into()), ("price", 1.5.into()), ("stock", 3i64.into())]))
            .unwrap();
        table
            .insert(values(&[("name", "Y".into()), ("price", 2.5.into())]))
            .unwrap();

        let n = table
            .update(values(&[("price", 10.0.into())]), &Filter::all().and("name", "X"))
            .unwrap();
        assert_eq!(n, 1);

        let x = &table.select(&Filter::all().and("name", "X"), None)[0];
        assert_eq!(x.id(), 1);
        assert_eq!(x.get("price"), Some(&ColumnValue::Float(10.0)));
        assert_eq!(x.get("stock"), Some(&ColumnValue::Int(3)));
        let y = &table.select(&Filter::all().and("name", "Y"), None)[0];
        assert_eq!(y.get("price"), Some(&ColumnValue::Float(2.5)));
    }

    #[test]
    fn test_update_without_matches_is_not_an_error() {
        let mut table = products();
        table.insert(values(&[("name", "X".into())])).unwrap();
        let n = table
            .update(values(&[("stock", 1i64.into())]), &Filter::all().and("name", "nope"))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_update_validates_columns_and_ignores_identifier() {
        let mut table = products();
        table.insert(values(&[("name", "X".into())])).unwrap();

        let err = table
            .update(values(&[("color", "red".into())]), &Filter::all())
            .unwrap_err();
        assert!(matches!(err, Error::Column(_)));

        let n = table
            .update(values(&[("_id", 50i64.into()), ("stock", 9i64.into())]), &Filter::all())
            .unwrap();
        assert_eq!(n, 1);
        let row = &table.select(&Filter::all(), None)[0];
        assert_eq!(row.id(), 1);
        assert_eq!(row.get("stock"), Some(&ColumnValue::Int(9)));
    }

    #[test]
    fn test_delete_counts_removed_rows() {
        let mut table = products();
        for (name, stock) in [("A", 1i64), ("B", 1), ("C", 2)] {
            table
                .insert(values(&[("name", name.into()), ("stock", stock.into())]))
                .unwrap();
        }
        assert_eq!(table.delete(&Filter::all().and("stock", 1i64)), 2);
        assert_eq!(table.delete(&Filter::all().and("stock", 7i64)), 0);
        assert_eq!(table.count(), 1);
    }

    #[test]
    fn test_integrity_rejects_misfiled_rows_and_stale_counter() {
        let mut table = products();
        table.insert(values(&[("name", "A".into())])).unwrap();
        table.insert(values(&[("name", "B".into())])).unwrap();
        assert!(table.check_integrity().is_ok());

        let mut misfiled = table.clone();
        let row = misfiled.rows.remove(&2).unwrap();
        misfiled.rows.insert(5, row);
        misfiled.next_id = 6;
        assert!(matches!(misfiled.check_integrity(), Err(Error::Encoding(_))));

        let mut stale = table.clone();
        stale.next_id = 2;
        assert!(matches!(stale.check_integrity(), Err(Error::Encoding(_))));

        let mut empty = products();
        empty.next_id = 0;
        assert!(empty.check_integrity().is_err());
    }

    #[test]
    fn test_snapshot_with_misfiled_row_is_rejected() {
        use crate::storage::encoding::{decode_snapshot, encode_snapshot, Tables};

        let mut table = products();
        table.insert(values(&[("name", "A".into())])).unwrap();
        let row = table.rows.remove(&1).unwrap();
        table.rows.insert(3, row);
        table.next_id = 4;

        let bytes = encode_snapshot(&Tables::from([("products".to_string(), table)])).unwrap();
        assert!(matches!(decode_snapshot(&bytes), Err(Error::Encoding(_))));
    }
}
