//! Document storage for acerto.
//!
//! Records live as JSON documents grouped by collection path, the way a
//! hosted document database lays them out. [`DocumentStore`] is the seam the
//! rest of the crate talks to; [`SqliteDocumentStore`] is the implementation
//! shipped with the binary. [`LocalStore`] is the small device-local
//! key-value store that keeps the offline queue and cached snapshots.

pub mod local;
pub mod migrations;
pub mod schema;
mod sqlite;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

pub use local::LocalStore;
pub use sqlite::{SqliteDocumentStore, StoreStats};

/// Path of a collection inside an account scope.
#[must_use]
pub fn collection_path(account: &str, collection: &str) -> String {
    format!("accounts/{account}/{collection}")
}

/// Kind of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAction {
    /// Create or replace the whole document.
    Set,
    /// Merge top-level fields into an existing document.
    Update,
    /// Remove the document.
    Delete,
}

/// One write against the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Write {
    /// What to do.
    pub action: WriteAction,
    /// Collection path.
    pub path: String,
    /// Document id.
    pub id: String,
    /// Document body or patch; `null` for deletes.
    #[serde(default)]
    pub payload: Value,
}

impl Write {
    /// Create or replace a document.
    #[must_use]
    pub fn set(path: impl Into<String>, id: impl Into<String>, payload: Value) -> Self {
        Self {
            action: WriteAction::Set,
            path: path.into(),
            id: id.into(),
            payload,
        }
    }

    /// Merge fields into a document.
    #[must_use]
    pub fn update(path: impl Into<String>, id: impl Into<String>, patch: Value) -> Self {
        Self {
            action: WriteAction::Update,
            path: path.into(),
            id: id.into(),
            payload: patch,
        }
    }

    /// Remove a document.
    #[must_use]
    pub fn delete(path: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            action: WriteAction::Delete,
            path: path.into(),
            id: id.into(),
            payload: Value::Null,
        }
    }
}

/// Document database.
///
/// Single-document writes default to a one-element batch, so an
/// implementation only has to provide reads and [`commit_batch`].
///
/// [`commit_batch`]: DocumentStore::commit_batch
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Fetch one document.
    async fn get(&self, path: &str, id: &str) -> Result<Option<Value>>;

    /// Fetch every document of a collection, ordered by id.
    async fn list(&self, path: &str) -> Result<Vec<Value>>;

    /// Apply all writes or none of them.
    ///
    /// An update of a missing document fails the batch with
    /// [`Error::NotFound`].
    async fn commit_batch(&self, writes: &[Write]) -> Result<()>;

    /// Create or replace a document.
    async fn set(&self, path: &str, id: &str, data: Value) -> Result<()> {
        self.commit_batch(&[Write::set(path, id, data)]).await
    }

    /// Shallow-merge `patch` into an existing document.
    async fn update(&self, path: &str, id: &str, patch: Value) -> Result<()> {
        self.commit_batch(&[Write::update(path, id, patch)]).await
    }

    /// Remove a document. Removing a missing document is not an error.
    async fn delete(&self, path: &str, id: &str) -> Result<()> {
        self.commit_batch(&[Write::delete(path, id)]).await
    }
}

/// Merge top-level fields of `patch` into `target`.
///
/// # Errors
///
/// Returns a validation error if either side is not a JSON object.
pub fn merge_shallow(target: &mut Value, patch: &Value) -> Result<()> {
    let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) else {
        return Err(Error::validation("payload", "update needs a JSON object"));
    };
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
    Ok(())
}

/// Open a `SQLite` database file with the given schema.
///
/// Creates parent directories, enables WAL and brings the schema up to date.
pub(crate) fn open_database(path: &Path, statements: &[&str]) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    debug!("Opening database at {}", path.display());
    let conn = Connection::open(path).map_err(|source| Error::DatabaseOpen {
        path: path.to_path_buf(),
        source,
    })?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    migrations::initialize_schema(&conn, statements)?;
    Ok(conn)
}

/// Open an in-memory `SQLite` database with the given schema.
pub(crate) fn open_memory_database(statements: &[&str]) -> Result<Connection> {
    let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
        path: PathBuf::from(":memory:"),
        source,
    })?;
    migrations::initialize_schema(&conn, statements)?;
    Ok(conn)
}
