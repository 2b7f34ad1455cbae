use std::path::{Path, PathBuf};

use log::info;
use rusqlite::Connection;

use crate::{
    config::Database,
    storage::{error::StorageError, schema},
};

pub const DEFAULT_DB_PATH: &str = "tag_genius.db";

fn open_in_memory() -> Result<rusqlite::Connection, rusqlite::Error> {
    Connection::open_in_memory()
}

fn open_from_file(path: &Path) -> Result<rusqlite::Connection, StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Connection::open(path)?)
}

/// Path of the database file, `None` for an in-memory database
pub fn db_path(config: &Database) -> Option<PathBuf> {
    if config.in_memory {
        None
    } else {
        Some(
            config
                .path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
        )
    }
}

/// Opens the configured database and makes sure the tables exist.
///
/// Existing rows are kept, see [`schema::reset`] for the destructive variant.
pub fn open(config: &Database) -> Result<rusqlite::Connection, StorageError> {
    let db = match db_path(config) {
        None => {
            info!("Opening in-memory database");
            open_in_memory()?
        }
        Some(path) => {
            info!("Opening database at {}", path.to_string_lossy());
            open_from_file(&path)?
        }
    };
    schema::init(&db)?;
    Ok(db)
}
