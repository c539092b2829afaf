use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "databases";
pub const DEFAULT_DATABASE: &str = "default";

/// Runtime settings shared by the session and the shell.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory holding one subdirectory per database.
    pub data_dir: PathBuf,
    /// Database opened when the session starts.
    pub database: String,
}

impl Config {
    pub fn database_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}
