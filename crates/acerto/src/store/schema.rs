//! `SQLite` schema definitions for acerto.
//!
//! Two databases share these definitions: the document database, which
//! stands in for the hosted document store, and the local database, which
//! holds the offline queue and cached snapshots.

/// SQL statement to create the documents table.
pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    path TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (path, id)
)
";

/// SQL statement to create an index on `path` for collection listing.
pub const CREATE_PATH_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_path ON documents(path)
";

/// SQL statement to create the local key-value table.
pub const CREATE_KV_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Schema of the document database, in order.
pub const DOCUMENT_SCHEMA: &[&str] = &[
    CREATE_DOCUMENTS_TABLE,
    CREATE_PATH_INDEX,
    CREATE_METADATA_TABLE,
];

/// Schema of the local database, in order.
pub const LOCAL_SCHEMA: &[&str] = &[CREATE_KV_TABLE, CREATE_METADATA_TABLE];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        for schema in [DOCUMENT_SCHEMA, LOCAL_SCHEMA] {
            assert!(!schema.is_empty());
            for stmt in schema {
                assert!(!stmt.is_empty());
            }
        }
    }

    #[test]
    fn test_documents_table_keyed_by_path_and_id() {
        assert!(CREATE_DOCUMENTS_TABLE.contains("path TEXT NOT NULL"));
        assert!(CREATE_DOCUMENTS_TABLE.contains("data TEXT NOT NULL"));
        assert!(CREATE_DOCUMENTS_TABLE.contains("PRIMARY KEY (path, id)"));
    }

    #[test]
    fn test_both_schemas_carry_metadata() {
        assert!(DOCUMENT_SCHEMA.contains(&CREATE_METADATA_TABLE));
        assert!(LOCAL_SCHEMA.contains(&CREATE_METADATA_TABLE));
    }
}
