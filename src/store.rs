// 🗄️ Local durable key-value store
//
// The build list lives under one fixed key as a JSON array. SQLite (WAL mode)
// backs the durable store; an in-memory map backs tests and throwaway sessions.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

/// Key the build list is stored under
pub const BUILD_KEY: &str = "pc-build";

/// Minimal key-value contract the persistence layer needs
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `path`, creating parent directories
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    /// When the value under `key` was last written
    pub fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let stamp: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(stamp
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }
}

fn setup_database(conn: &Connection) -> Result<()> {
    // In-memory databases ignore WAL and report "memory"; that's fine
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one value
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.values.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sqlite_set_get_remove() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        assert_eq!(store.get(BUILD_KEY).unwrap(), None);

        store.set(BUILD_KEY, "[]").unwrap();
        assert_eq!(store.get(BUILD_KEY).unwrap().as_deref(), Some("[]"));
        assert!(store.updated_at(BUILD_KEY).unwrap().is_some());

        store.set(BUILD_KEY, r#"[{"category":"UPS"}]"#).unwrap();
        assert_eq!(
            store.get(BUILD_KEY).unwrap().as_deref(),
            Some(r#"[{"category":"UPS"}]"#)
        );

        store.remove(BUILD_KEY).unwrap();
        assert_eq!(store.get(BUILD_KEY).unwrap(), None);
        assert!(store.updated_at(BUILD_KEY).unwrap().is_none());
    }

    #[test]
    fn test_sqlite_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("build.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set(BUILD_KEY, "[1]").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(BUILD_KEY).unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::with_value(BUILD_KEY, "x");
        assert_eq!(store.get(BUILD_KEY).unwrap().as_deref(), Some("x"));

        store.remove(BUILD_KEY).unwrap();
        assert_eq!(store.get(BUILD_KEY).unwrap(), None);
    }
}
