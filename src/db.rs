use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::storage::{Storage, StorageError};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl Storage for Database {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value, now],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_item_overwrites_existing_value() {
        let db = Database::open_in_memory().expect("open");
        db.migrate().expect("migrate");

        db.set_item("reelshelf_favorites", "[]").expect("first write");
        db.set_item("reelshelf_favorites", r#"[{"imdbID":"tt1"}]"#)
            .expect("second write");

        assert_eq!(
            db.get_item("reelshelf_favorites").expect("read").as_deref(),
            Some(r#"[{"imdbID":"tt1"}]"#)
        );
    }

    #[test]
    fn remove_item_is_idempotent() {
        let db = Database::open_in_memory().expect("open");
        db.migrate().expect("migrate");

        db.remove_item("missing").expect("remove missing key");
        db.set_item("k", "v").expect("write");
        db.remove_item("k").expect("remove");
        assert_eq!(db.get_item("k").expect("read"), None);
    }

    #[test]
    fn data_survives_reopen_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("reelshelf.db");
        {
            let db = Database::open(&path).expect("open");
            db.migrate().expect("migrate");
            db.set_item("k", "persisted").expect("write");
        }
        let db = Database::open(&path).expect("reopen");
        db.migrate().expect("migrate twice");
        assert_eq!(db.get_item("k").expect("read").as_deref(), Some("persisted"));
    }

    #[test]
    fn reads_before_migration_report_backend_error() {
        let db = Database::open_in_memory().expect("open");
        let err = db.get_item("k").expect_err("table does not exist yet");
        assert!(matches!(err, StorageError::Backend(_)));
    }
}
