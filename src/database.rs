use crate::errors::Error;
use crate::persist::{FileStore, LoadStatus, Metadata, Persistence};
use crate::storage::{Filter, Row, Table, TableSchema, Tables, Values};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// A named set of tables backed by a [`Persistence`] implementation.
///
/// Every mutating call saves the full table set before returning. A failed
/// save does not fail the call: the in-memory tables stay authoritative and
/// the failure is kept until [`Database::take_save_error`] collects it.
pub struct Database {
    pub name: String,
    tables: Tables,
    store: Box<dyn Persistence>,
    load_status: LoadStatus,
    save_error: Option<Error>,
}

/// Result of [`Database::describe`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescription {
    pub name: String,
    pub schema: TableSchema,
    pub row_count: usize,
}

/// Result of [`Database::info`].
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseInfo {
    pub name: String,
    pub path: PathBuf,
    pub tables: Vec<String>,
    pub total_tables: usize,
    pub total_rows: usize,
}

impl Database {
    /// Opens the database stored in `dir`, creating the directory on first use.
    pub fn open(name: &str, dir: PathBuf) -> Result<Database, Error> {
        let store = FileStore::open(dir)?;
        Ok(Database::with_store(name, Box::new(store)))
    }

    /// Opens a database over an arbitrary store. An unreadable snapshot is
    /// reported through [`LoadStatus::Recovered`] and the database starts empty.
    pub fn with_store(name: &str, store: Box<dyn Persistence>) -> Database {
        let (tables, load_status) = match store.load() {
            Ok(Some(tables)) => {
                let count = tables.len();
                (tables, LoadStatus::Loaded { tables: count })
            }
            Ok(None) => (Tables::new(), LoadStatus::Fresh),
            Err(e) => {
                error!(database = name, "Failed to load snapshot, starting empty. {}", e);
                (
                    Tables::new(),
                    LoadStatus::Recovered {
                        reason: e.to_string(),
                    },
                )
            }
        };
        info!(database = name, status = ?load_status, "Opened database.");

        let mut db = Database {
            name: name.to_string(),
            tables,
            store,
            load_status,
            save_error: None,
        };
        db.write_metadata();
        db
    }

    pub fn path(&self) -> &Path {
        self.store.location()
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    /// Returns and clears the most recent persistence failure, if any.
    pub fn take_save_error(&mut self) -> Option<Error> {
        self.save_error.take()
    }

    pub fn create_table(&mut self, name: &str, schema: TableSchema) -> Result<(), Error> {
        if self.tables.contains_key(name) {
            return Err(err!(TableExists, "Table '{}' already exists", name));
        }
        let table = Table::create(name, schema)?;
        self.tables.insert(name.to_string(), table);
        info!(database = self.name, table = name, "Created table.");

        self.save();
        self.write_metadata();
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<(), Error> {
        if self.tables.remove(name).is_none() {
            return Err(self.not_found(name));
        }
        info!(database = self.name, table = name, "Dropped table.");

        self.save();
        self.write_metadata();
        Ok(())
    }

    pub fn list_tables(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn describe(&self, name: &str) -> Result<TableDescription, Error> {
        let table = self.find_table(name)?;
        Ok(TableDescription {
            name: table.name.clone(),
            schema: table.schema().clone(),
            row_count: table.count(),
        })
    }

    pub fn insert(&mut self, table: &str, data: Values) -> Result<u64, Error> {
        let id = self.find_table_mut(table)?.insert(data)?;
        self.save();
        Ok(id)
    }

    pub fn select(
        &self,
        table: &str,
        filter: &Filter,
        limit: Option<i64>,
    ) -> Result<Vec<Row>, Error> {
        Ok(self.find_table(table)?.select(filter, limit))
    }

    pub fn update(&mut self, table: &str, data: Values, filter: &Filter) -> Result<usize, Error> {
        let count = self.find_table_mut(table)?.update(data, filter)?;
        self.save();
        Ok(count)
    }

    pub fn delete(&mut self, table: &str, filter: &Filter) -> Result<usize, Error> {
        let count = self.find_table_mut(table)?.delete(filter);
        self.save();
        Ok(count)
    }

    pub fn info(&self) -> DatabaseInfo {
        DatabaseInfo {
            name: self.name.clone(),
            path: self.path().to_path_buf(),
            tables: self.list_tables(),
            total_tables: self.tables.len(),
            total_rows: self.tables.values().map(Table::count).sum(),
        }
    }

    fn find_table(&self, name: &str) -> Result<&Table, Error> {
        self.tables.get(name).ok_or_else(|| self.not_found(name))
    }

    fn find_table_mut(&mut self, name: &str) -> Result<&mut Table, Error> {
        let database = &self.name;
        self.tables
            .get_mut(name)
            .ok_or_else(|| err!(TableNotFound, "Table '{}.{}' does not exist", database, name))
    }

    fn not_found(&self, name: &str) -> Error {
        err!(TableNotFound, "Table '{}.{}' does not exist", self.name, name)
    }

    fn save(&mut self) {
        match self.store.save(&self.tables) {
            Ok(_) => {
                debug!(database = self.name, "Saved database.");
                self.save_error = None;
            }
            Err(e) => {
                warn!(database = self.name, "Failed to save database. {}", e);
                self.save_error = Some(e);
            }
        }
    }

    fn write_metadata(&mut self) {
        let result = Metadata::new(&self.name, &self.tables)
            .and_then(|metadata| self.store.write_metadata(&metadata));
        if let Err(e) = result {
            warn!(database = self.name, "Failed to write metadata. {}", e);
            if self.save_error.is_none() {
                self.save_error = Some(e);
            }
        }
    }
}

/// Lists the databases present under `data_dir`.
pub fn show_databases(data_dir: &Path) -> Result<Vec<String>, Error> {
    if !data_dir.exists() {
        return Ok(Vec::new());
    }
    let mut res = Vec::new();
    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            res.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    res.sort();
    Ok(res)
}
