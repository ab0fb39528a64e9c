//! `DuckDB` connection management.
//!
//! A single root handle owns the database; every store operation clones a
//! short-lived connection from it and drops it when done.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use ::duckdb::Connection;

/// Hands out connections that share one underlying `DuckDB` instance.
#[derive(Clone)]
pub struct DuckDbConnectionManager {
    root: Arc<Mutex<Connection>>,
}

impl DuckDbConnectionManager {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database file cannot be opened or configured.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ::duckdb::Error> {
        let root = Connection::open(path.into())?;
        configure_connection(&root)?;
        Ok(Self::from_root(root))
    }

    /// Open a private in-memory database. Cloned connections see the same data.
    ///
    /// # Errors
    /// Returns an error if `DuckDB` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, ::duckdb::Error> {
        let root = Connection::open_in_memory()?;
        configure_connection(&root)?;
        Ok(Self::from_root(root))
    }

    fn from_root(root: Connection) -> Self {
        Self {
            root: Arc::new(Mutex::new(root)),
        }
    }

    /// Acquire a connection for a single operation.
    ///
    /// # Errors
    /// Returns an error if `DuckDB` refuses to open another connection.
    pub fn acquire(&self) -> Result<Connection, ::duckdb::Error> {
        let root = self.root.lock().unwrap_or_else(PoisonError::into_inner);
        root.try_clone()
    }
}

fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquired_connections_share_the_same_database() {
        let manager = DuckDbConnectionManager::open_in_memory().expect("open in memory");

        let writer = manager.acquire().expect("writer");
        writer
            .execute_batch("CREATE TABLE shared (value INTEGER); INSERT INTO shared VALUES (7);")
            .expect("seed shared table");
        drop(writer);

        let reader = manager.acquire().expect("reader");
        let value: i64 = reader
            .query_row("SELECT value FROM shared", [], |row| row.get(0))
            .expect("read shared table");
        assert_eq!(value, 7);
    }
}
