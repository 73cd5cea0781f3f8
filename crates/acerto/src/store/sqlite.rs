use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info};

use super::{merge_shallow, schema, DocumentStore, Write, WriteAction};
use crate::error::{Error, Result};

/// Document store backed by a `SQLite` file.
///
/// Each document is one row keyed by collection path and id, with the body
/// kept as JSON text. Batches run inside a transaction.
#[derive(Debug)]
pub struct SqliteDocumentStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Open or create a document database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = super::open_database(&path, schema::DOCUMENT_SCHEMA)?;
        info!("Document store opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = super::open_memory_database(schema::DOCUMENT_SCHEMA)?;
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
            .map_err(|_| Error::internal("document store connection poisoned"))
    }

    fn get_sync(&self, path: &str, id: &str) -> Result<Option<Value>> {
        let conn = self.lock()?;
        read_document(&conn, path, id)
    }

    fn list_sync(&self, path: &str) -> Result<Vec<Value>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT data FROM documents WHERE path = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map([path], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.iter()
            .map(|data| serde_json::from_str(data).map_err(Error::from))
            .collect()
    }

    fn commit_sync(&self, writes: &[Write]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for write in writes {
            apply_write(&tx, write)?;
        }
        tx.commit()?;
        debug!(writes = writes.len(), "committed batch");
        Ok(())
    }

    /// Get statistics about the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT path, COUNT(*) FROM documents GROUP BY path ORDER BY path")?;
        let collections = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let total_documents = collections.iter().map(|(_, n)| n).sum();

        let db_size_bytes = if self.path.as_os_str() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            total_documents,
            collections,
            db_size_bytes,
        })
    }
}

fn read_document(conn: &Connection, path: &str, id: &str) -> Result<Option<Value>> {
    let data: Option<String> = conn
        .query_row(
            "SELECT data FROM documents WHERE path = ?1 AND id = ?2",
            [path, id],
            |row| row.get(0),
        )
        .optional()?;
    data.map(|d| serde_json::from_str(&d).map_err(Error::from))
        .transpose()
}

fn write_document(conn: &Connection, path: &str, id: &str, data: &Value) -> Result<()> {
    conn.execute(
        r"
        INSERT INTO documents (path, id, data, updated_at)
        VALUES (?1, ?2, ?3, datetime('now'))
        ON CONFLICT(path, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
        ",
        params![path, id, serde_json::to_string(data)?],
    )?;
    Ok(())
}

fn apply_write(conn: &Connection, write: &Write) -> Result<()> {
    match write.action {
        WriteAction::Set => write_document(conn, &write.path, &write.id, &write.payload),
        WriteAction::Update => {
            let mut current = read_document(conn, &write.path, &write.id)?
                .ok_or_else(|| Error::not_found(&write.path, &write.id))?;
            merge_shallow(&mut current, &write.payload)?;
            write_document(conn, &write.path, &write.id, &current)
        }
        WriteAction::Delete => {
            conn.execute(
                "DELETE FROM documents WHERE path = ?1 AND id = ?2",
                [&write.path, &write.id],
            )?;
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, path: &str, id: &str) -> Result<Option<Value>> {
        self.get_sync(path, id)
    }

    async fn list(&self, path: &str) -> Result<Vec<Value>> {
        self.list_sync(path)
    }

    async fn commit_batch(&self, writes: &[Write]) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        self.commit_sync(writes)
    }
}

/// Statistics about the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Total number of documents.
    pub total_documents: i64,
    /// Document count per collection path.
    pub collections: Vec<(String, i64)>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn create_test_store() -> SqliteDocumentStore {
        SqliteDocumentStore::open_in_memory().expect("failed to create test store")
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = create_test_store();
        store.set("c", "1", json!({"name": "Bar"})).await.unwrap();

        let doc = store.get("c", "1").await.unwrap();
        assert_eq!(doc, Some(json!({"name": "Bar"})));
        assert_eq!(store.get("c", "2").await.unwrap(), None);
        assert_eq!(store.get("other", "1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_replaces_whole_document() {
        let store = create_test_store();
        store.set("c", "1", json!({"a": 1, "b": 2})).await.unwrap();
        store.set("c", "1", json!({"a": 3})).await.unwrap();
        assert_eq!(store.get("c", "1").await.unwrap(), Some(json!({"a": 3})));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = create_test_store();
        store.set("c", "1", json!({"a": 1, "b": 2})).await.unwrap();
        store.update("c", "1", json!({"b": 5, "c": 6})).await.unwrap();
        assert_eq!(
            store.get("c", "1").await.unwrap(),
            Some(json!({"a": 1, "b": 5, "c": 6}))
        );
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = create_test_store();
        let err = store.update("c", "nope", json!({"a": 1})).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = create_test_store();
        store.set("c", "1", json!({})).await.unwrap();
        store.delete("c", "1").await.unwrap();
        assert_eq!(store.get("c", "1").await.unwrap(), None);
        store.delete("c", "1").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_ordered_by_id_and_scoped_to_path() {
        let store = create_test_store();
        store.set("c", "b", json!({"n": "b"})).await.unwrap();
        store.set("c", "a", json!({"n": "a"})).await.unwrap();
        store.set("e", "z", json!({"n": "z"})).await.unwrap();

        let docs = store.list("c").await.unwrap();
        assert_eq!(docs, vec![json!({"n": "a"}), json!({"n": "b"})]);
        assert!(store.list("none").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_is_atomic() {
        let store = create_test_store();
        store.set("c", "1", json!({"v": 1})).await.unwrap();

        let batch = vec![
            Write::update("c", "1", json!({"v": 2})),
            Write::set("c", "2", json!({"v": 1})),
            Write::update("c", "missing", json!({"v": 1})),
        ];
        assert!(store.commit_batch(&batch).await.is_err());

        assert_eq!(store.get("c", "1").await.unwrap(), Some(json!({"v": 1})));
        assert_eq!(store.get("c", "2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_batch_applies_in_order() {
        let store = create_test_store();
        let batch = vec![
            Write::set("c", "1", json!({"v": 1})),
            Write::update("c", "1", json!({"w": 2})),
            Write::set("c", "2", json!({})),
            Write::delete("c", "2"),
        ];
        store.commit_batch(&batch).await.unwrap();
        assert_eq!(store.get("c", "1").await.unwrap(), Some(json!({"v": 1, "w": 2})));
        assert_eq!(store.get("c", "2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stats() {
        let store = create_test_store();
        store.set("a", "1", json!({})).await.unwrap();
        store.set("a", "2", json!({})).await.unwrap();
        store.set("b", "1", json!({})).await.unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_documents, 3);
        assert_eq!(
            stats.collections,
            vec![("a".to_string(), 2), ("b".to_string(), 1)]
        );
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[tokio::test]
    async fn test_open_file_persists() {
        let path = std::env::temp_dir().join(format!("acerto-docs-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        {
            let store = SqliteDocumentStore::open(&path).unwrap();
            store.set("c", "1", json!({"k": true})).await.unwrap();
            assert_eq!(store.path(), path.as_path());
        }
        let store = SqliteDocumentStore::open(&path).unwrap();
        assert_eq!(store.get("c", "1").await.unwrap(), Some(json!({"k": true})));
        assert!(store.stats().unwrap().db_size_bytes > 0);
        drop(store);
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }
}
