use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use time::OffsetDateTime;

use super::{entry_size, schema, KeyValueStore, StoreError};
use crate::config::StorageOptions;

/// Durable key-value store backed by a single SQLite table.
#[derive(Clone)]
pub struct SqliteStore {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl SqliteStore {
    pub fn open(options: &StorageOptions) -> Result<Self> {
        let db_path = &options.database_path;
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("opening database {}", db_path.display()))?;
        prepare_connection(&conn, options)?;
        schema::apply(&conn)?;
        tracing::debug!(path = %db_path.display(), "key-value store ready");
        Ok(Self {
            db_path: Arc::new(db_path.clone()),
            options: Arc::new(options.clone()),
        })
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&*self.db_path)?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(conn)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.connect()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let quota = self.options.quota_bytes;
        if quota > 0 {
            let required = used_bytes_except(&tx, key)? + entry_size(key, value);
            if required > quota {
                return Err(StoreError::QuotaExceeded { quota, required });
            }
        }
        let now = OffsetDateTime::now_utc().unix_timestamp();
        tx.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Bytes held by every entry other than `key`.
fn used_bytes_except(conn: &Connection, key: &str) -> rusqlite::Result<u64> {
    let used: i64 = conn.query_row(
        "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
         FROM kv WHERE key != ?1",
        params![key],
        |row| row.get(0),
    )?;
    Ok(used.max(0) as u64)
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )
    .context("setting wal_autocheckpoint")?;
    Ok(())
}
