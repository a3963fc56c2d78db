use rusqlite::Connection;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use log::debug;
use crate::config::Config;
use crate::db::migrations::MigrationManager;

/// Database connection manager
pub struct DbConnection;

impl DbConnection {
    /// Get the default database path
    pub fn default_path() -> Result<PathBuf> {
        Ok(Config::config_dir()?.join("orders.db"))
    }

    /// Get database path from configuration or default
    pub fn resolve_path(config: &Config) -> Result<PathBuf> {
        match &config.data_location {
            Some(path) => Ok(path.clone()),
            None => Self::default_path(),
        }
    }

    /// Connect to the configured database, creating it and parent directories if needed
    pub fn connect(config: &Config) -> Result<Connection> {
        let db_path = Self::resolve_path(config)?;
        Self::connect_at(&db_path)
    }

    pub fn connect_at(db_path: &Path) -> Result<Connection> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        debug!("Opening snapshot store at {}", db_path.display());
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }

    /// Connect to an in-memory database (for testing)
    pub fn connect_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory database")?;

        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }
}
