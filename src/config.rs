// Runtime configuration - command-line flags with environment fallbacks

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::error::Result;
use crate::storage::{DbStorage, FileStorage, Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    /// Single JSON document
    File,
    /// SQLite database
    Db,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "hbnb")]
#[command(about = "Console and web views for the HBNB rental data store")]
pub struct HbnbConfig {
    #[arg(long, env = "HBNB_TYPE_STORAGE", value_enum, default_value = "file")]
    pub storage: StorageKind,

    #[arg(long, env = "HBNB_FILE_PATH", default_value = "file.json")]
    pub file_path: PathBuf,

    #[arg(long, env = "HBNB_SQLITE_PATH", default_value = "hbnb.db")]
    pub db_path: PathBuf,

    /// `test` drops every table when the database is opened
    #[arg(long = "env", env = "HBNB_ENV")]
    pub environment: Option<String>,

    #[arg(long, env = "HBNB_VERBOSE", help = "Enable debug logging")]
    pub verbose: bool,

    /// Listen address for the web views
    #[arg(long, env = "HBNB_WEB_BIND", default_value = "0.0.0.0:5000")]
    pub bind: String,
}

impl HbnbConfig {
    pub fn is_test_env(&self) -> bool {
        self.environment.as_deref() == Some("test")
    }

    /// Build the configured backend and load its current contents.
    pub fn open_storage(&self) -> Result<Box<dyn Storage>> {
        let mut storage: Box<dyn Storage> = match self.storage {
            StorageKind::File => {
                tracing::info!(path = %self.file_path.display(), "using file storage");
                Box::new(FileStorage::open(self.file_path.clone()))
            }
            StorageKind::Db => {
                tracing::info!(path = %self.db_path.display(), "using database storage");
                let mut db = DbStorage::open(&self.db_path)?;
                if self.is_test_env() {
                    tracing::warn!("test environment: dropping all tables");
                    db.drop_all()?;
                }
                Box::new(db)
            }
        };

        storage.reload()?;
        Ok(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ClassName, State};
    use tempfile::TempDir;

    #[test]
    fn test_flags() {
        let config = HbnbConfig::try_parse_from([
            "hbnb",
            "--storage",
            "db",
            "--db-path",
            "/tmp/x.db",
            "--env",
            "test",
            "--verbose",
        ])
        .unwrap();

        assert_eq!(config.storage, StorageKind::Db);
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert!(config.is_test_env());
        assert!(config.verbose);
    }

    #[test]
    fn test_rejects_unknown_backend() {
        assert!(HbnbConfig::try_parse_from(["hbnb", "--storage", "redis"]).is_err());
    }

    #[test]
    fn test_open_file_storage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let config = HbnbConfig::try_parse_from([
            "hbnb",
            "--storage",
            "file",
            "--file-path",
            path.to_str().unwrap(),
        ])
        .unwrap();

        let mut storage = config.open_storage().unwrap();
        assert!(!storage.enforces_references());
        storage.new(State::new("Ohio").into()).unwrap();
        storage.save().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_test_env_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hbnb.db");
        let args = ["hbnb", "--storage", "db", "--db-path", path.to_str().unwrap()];

        let config = HbnbConfig::try_parse_from(args).unwrap();
        let mut storage = config.open_storage().unwrap();
        storage.new(State::new("Ohio").into()).unwrap();
        storage.save().unwrap();
        storage.close().unwrap();
        drop(storage);

        let reopened = config.open_storage().unwrap();
        assert_eq!(reopened.count(ClassName::State).unwrap(), 1);
        drop(reopened);

        let config = HbnbConfig::try_parse_from(args.into_iter().chain(["--env", "test"])).unwrap();
        let storage = config.open_storage().unwrap();
        assert!(storage.enforces_references());
        assert_eq!(storage.count(ClassName::State).unwrap(), 0);
    }
}
