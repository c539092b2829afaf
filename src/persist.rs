//! Snapshot and metadata persistence.
//!
//! The catalog never touches files itself; it calls a [`Persistence`]
//! implementation after each mutation. [`FileStore`] keeps one snapshot and
//! one metadata document per database directory.
use crate::errors::Error;
use crate::storage::encoding::{self, Tables};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info};

pub const SNAPSHOT_FILE: &str = "database.bin";
pub const METADATA_FILE: &str = "metadata.json";

pub trait Persistence {
    /// Returns the stored tables, or `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Tables>, Error>;

    /// Replaces the stored snapshot with the given tables.
    fn save(&self, tables: &Tables) -> Result<(), Error>;

    /// Replaces the metadata summary. Never read back.
    fn write_metadata(&self, metadata: &Metadata) -> Result<(), Error>;

    fn location(&self) -> &Path;
}

/// Outcome of loading a database on open.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// No snapshot existed; the database starts empty.
    Fresh,
    /// A snapshot was loaded.
    Loaded { tables: usize },
    /// A snapshot existed but was unreadable; the database started empty.
    Recovered { reason: String },
}

/// Derived, write-only summary of a database.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Metadata {
    pub database_name: String,
    pub created: String,
    pub tables: BTreeMap<String, TableMetadata>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TableMetadata {
    #[serde(serialize_with = "serialize_columns")]
    pub columns: Vec<(String, String)>,
    pub row_count: usize,
}

impl Metadata {
    pub fn new(database_name: &str, tables: &Tables) -> Result<Metadata, Error> {
        Ok(Metadata {
            database_name: database_name.to_string(),
            created: OffsetDateTime::now_utc().format(&Rfc3339)?,
            tables: tables
                .iter()
                .map(|(name, table)| {
                    let columns = table
                        .schema()
                        .columns
                        .iter()
                        .map(|c| (c.name.clone(), c.type_.to_string()))
                        .collect();
                    (
                        name.clone(),
                        TableMetadata {
                            columns,
                            row_count: table.count(),
                        },
                    )
                })
                .collect(),
        })
    }
}

// Columns are written as a JSON object in declaration order.
fn serialize_columns<S: Serializer>(columns: &[(String, String)], s: S) -> Result<S::Ok, S::Error> {
    s.collect_map(columns.iter().map(|(name, type_)| (name, type_)))
}

/// File-backed persistence rooted at one database directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens a store at `dir`, creating the directory if needed.
    pub fn open(dir: PathBuf) -> Result<FileStore, Error> {
        std::fs::create_dir_all(&dir)?;
        Ok(FileStore { dir })
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    /// Writes `bytes` to a temporary file next to `path`, then moves it over
    /// `path`, so a failed write never leaves a partial file behind.
    fn replace_file(&self, path: &Path, bytes: &[u8]) -> Result<(), Error> {
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;
        file.persist(path)?;
        Ok(())
    }
}

impl Persistence for FileStore {
    fn load(&self) -> Result<Option<Tables>, Error> {
        let path = self.snapshot_path();
        if !path.exists() {
            debug!(path = %path.display(), "No snapshot found.");
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        let tables = encoding::decode_snapshot(&bytes)?;
        info!(path = %path.display(), tables = tables.len(), "Loaded snapshot.");
        Ok(Some(tables))
    }

    fn save(&self, tables: &Tables) -> Result<(), Error> {
        let bytes = encoding::encode_snapshot(tables)?;
        self.replace_file(&self.snapshot_path(), &bytes)?;
        debug!(bytes = bytes.len(), tables = tables.len(), "Saved snapshot.");
        Ok(())
    }

    fn write_metadata(&self, metadata: &Metadata) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(metadata)?;
        self.replace_file(&self.metadata_path(), &json)
    }

    fn location(&self) -> &Path {
        &self.dir
    }
}
