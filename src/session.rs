use uuid::Uuid;

use crate::config::Config;
use crate::database::Database;
use crate::errors;
use crate::sql::validator;
use tracing::info;

pub struct Session {
    pub id: Uuid,
    pub config: Config,
    pub database: Database,
}

impl Session {
    /// Opens a session on the configured database.
    pub fn open(config: Config) -> Result<Self, errors::Error> {
        let database = open_database(&config, &config.database)?;
        Ok(Session {
            id: Uuid::new_v4(),
            config,
            database,
        })
    }

    /// Switches to another database, creating it on first use.
    pub fn use_database(&mut self, name: &str) -> Result<(), errors::Error> {
        let database = open_database(&self.config, name)?;
        info!(session_id = %self.id, from = self.database.name, to = name, "Switching database.");
        self.database = database;
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), errors::Error> {
        info!(session_id = %self.id, database = self.database.name, "Closing session.");
        match self.database.take_save_error() {
            Some(e) => Err(err!(
                Other,
                "Last save of '{}' did not complete: {}",
                self.database.name,
                e
            )),
            None => Ok(()),
        }
    }
}

fn open_database(config: &Config, name: &str) -> Result<Database, errors::Error> {
    let name = validator::validate_identifier(name)?;
    Database::open(&name, config.database_dir(&name))
}
