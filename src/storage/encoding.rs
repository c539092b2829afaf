use super::table::Table;
use crate::errors::Error;
use bincode::{config, Decode, Encode};
use std::collections::BTreeMap;

/// All tables of a database keyed by name.
pub type Tables = BTreeMap<String, Table>;

pub const SNAPSHOT_MAGIC: [u8; 4] = *b"MDBS";
pub const SNAPSHOT_VERSION: u16 = 1;

/// Upper bound on what a snapshot may claim while decoding. A corrupt
/// length prefix fails against it instead of driving an allocation.
pub const SNAPSHOT_LIMIT: usize = 512 * 1024 * 1024;

#[derive(Encode, Decode, Debug, PartialEq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u16,
}

/// Encodes the full table set: schemas, rows and identifier counters.
pub fn encode_snapshot(tables: &Tables) -> Result<Vec<u8>, Error> {
    let header = SnapshotHeader {
        magic: SNAPSHOT_MAGIC,
        version: SNAPSHOT_VERSION,
    };
    let mut bytes = bincode::encode_to_vec(&header, config::standard())?;
    bytes.extend(bincode::encode_to_vec(tables, config::standard())?);
    Ok(bytes)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<Tables, Error> {
    let limited = config::standard().with_limit::<SNAPSHOT_LIMIT>();
    let (header, offset): (SnapshotHeader, usize) = bincode::decode_from_slice(bytes, limited)?;
    if header.magic != SNAPSHOT_MAGIC {
        return Err(err!(Encoding, "Not a snapshot file (bad magic {:?})", header.magic));
    }
    if header.version != SNAPSHOT_VERSION {
        return Err(err!(
            Encoding,
            "Unsupported snapshot version {} (expected {})",
            header.version,
            SNAPSHOT_VERSION
        ));
    }

    let (tables, read): (Tables, usize) =
        bincode::decode_from_slice(&bytes[offset..], limited)?;
    if offset + read != bytes.len() {
        return Err(err!(
            Encoding,
            "Snapshot has {} trailing bytes",
            bytes.len() - offset - read
        ));
    }
    for (name, table) in &tables {
        if name != &table.name {
            return Err(err!(Encoding, "Snapshot table '{}' is stored as '{}'", table.name, name));
        }
        table.check_integrity()?;
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::column::{ColumnType, ColumnValue};
    use crate::storage::filter::Filter;
    use crate::storage::row::Values;
    use crate::storage::schema::TableSchema;

    fn sample() -> Tables {
        let schema = TableSchema::from_pairs(vec![
            ("name", ColumnType::String),
            ("price", ColumnType::Float),
            ("active", ColumnType::Boolean),
        ])
        .unwrap();
        let mut table = Table::create("items", schema).unwrap();
        for (name, price) in [("A", 1.25), ("B", 2.5), ("C", 4.0)] {
            table
                .insert(Values::from([
                    ("name".to_string(), ColumnValue::from(name)),
                    ("price".to_string(), ColumnValue::Float(price)),
                    ("active".to_string(), ColumnValue::Bool(true)),
                ]))
                .unwrap();
        }
        table.delete(&Filter::all().and("name", "C"));
        Tables::from([("items".to_string(), table)])
    }

    #[test]
    fn test_snapshot_reproduces_tables_and_counters() {
        let tables = sample();
        let decoded = decode_snapshot(&encode_snapshot(&tables).unwrap()).unwrap();
        assert_eq!(decoded, tables);
        assert_eq!(decoded["items"].next_id(), 4);
        assert_eq!(decoded["items"].count(), 2);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_snapshot(b"definitely not a snapshot").unwrap_err();
        assert_eq!(err.code(), 6000);
    }

    #[test]
    fn test_decode_rejects_truncated_and_trailing_bytes() {
        let bytes = encode_snapshot(&sample()).unwrap();
        assert!(decode_snapshot(&bytes[..bytes.len() - 3]).is_err());

        let mut extended = bytes.clone();
        extended.push(0);
        assert!(decode_snapshot(&extended).is_err());
    }

    #[test]
    fn test_decode_rejects_oversized_length_prefix() {
        let header = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
        };
        let mut bytes = bincode::encode_to_vec(&header, config::standard()).unwrap();
        // One table whose name claims u64::MAX / 2 bytes.
        bytes.push(1);
        bytes.push(0xFD);
        bytes.extend_from_slice(&(u64::MAX / 2).to_le_bytes());
        bytes.extend_from_slice(b"products");

        assert!(matches!(decode_snapshot(&bytes), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_decode_rejects_rewound_counter() {
        let mut bytes = encode_snapshot(&sample()).unwrap();
        // `next_id` is the last field of the last table: 4 becomes 2, the highest live id.
        let last = bytes.len() - 1;
        assert_eq!(bytes[last], 4);
        bytes[last] = 2;

        assert!(matches!(decode_snapshot(&bytes), Err(Error::Encoding(_))));
    }
}
