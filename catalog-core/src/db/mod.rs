//! Relational store for the catalog.
//!
//! A single SQLite connection guarded by a mutex. Package rows own their
//! dependency, feature and feature-dependency rows through `ON DELETE CASCADE`.

mod packages;
mod schema;

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;

pub use packages::{InsertReport, RowFailure, RowTable};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("package '{0}' already exists")]
    Duplicate(String),

    #[error("package '{name}': star count {stars} exceeds the storable range")]
    StarsOutOfRange { name: String, stars: u64 },

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored version list is not valid JSON: {0}")]
    Versions(#[from] serde_json::Error),

    #[error("database connection lock poisoned")]
    Poisoned,
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        tracing::debug!("Opening database at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Open a connection string; `:memory:` selects an in-memory database.
    pub fn open_url(url: &str) -> Result<Self, StoreError> {
        if url == ":memory:" {
            Self::open_memory()
        } else {
            Self::open(url)
        }
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<(), StoreError> {
        self.with_connection(|conn| {
            conn.execute_batch(schema::SCHEMA)?;
            Ok(())
        })
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_connection<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let conn = self.conn.lock().map_err(|_| E::from(StoreError::Poisoned))?;
        f(&conn)
    }
}
