//! Device-local key-value store.
//!
//! Holds the offline queue and the last loaded snapshot so the app can start
//! without a connection.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::schema;
use crate::error::{Error, Result};

/// String key-value store backed by `SQLite`.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl LocalStore {
    /// Open or create a local store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = super::open_database(&path, schema::LOCAL_SCHEMA)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory local store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = super::open_memory_database(schema::LOCAL_SCHEMA)?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("local store connection poisoned"))
    }

    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        read(&conn, key)
    }

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        write(&conn, key, value)
    }

    /// Remove a value. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(removed > 0)
    }

    /// Read and decode a JSON value.
    ///
    /// A value that no longer decodes is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let conn = self.lock()?;
        Ok(decode(key, read(&conn, key)?))
    }

    /// Encode and write a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the database operation fails.
    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.put(key, &text)
    }

    /// Read, modify and write back a JSON value while holding the store.
    ///
    /// Starts from `T::default()` when the key is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the database operation fails.
    pub fn update_json<T, R>(&self, key: &str, f: impl FnOnce(&mut T) -> R) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let conn = self.lock()?;
        let mut value: T = decode(key, read(&conn, key)?).unwrap_or_default();
        let result = f(&mut value);
        write(&conn, key, &serde_json::to_string(&value)?)?;
        Ok(result)
    }
}

fn read(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

fn write(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        r"
        INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        ",
        [key, value],
    )?;
    debug!(key, bytes = value.len(), "stored local value");
    Ok(())
}

fn decode<T: DeserializeOwned>(key: &str, text: Option<String>) -> Option<T> {
    let text = text?;
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, "discarding undecodable local value: {e}");
            None
        }
    }
}
