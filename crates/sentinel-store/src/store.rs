// crates/sentinel-store/src/store.rs
// ============================================================================
// Module: KvStore
// Description: The durable, thread-safe K/V store.
// Purpose: Transactional keyed storage of structured values with metadata
//          and timestamps, on a SQLite single-writer/read-pool engine,
//          generalized down to one generic table.
// Dependencies: rusqlite, serde_json, time, tokio, tracing, sentinel-core,
//               sentinel-config
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::params;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use sentinel_config::StoreConfig;
use sentinel_core::StoreEntry;
use sentinel_core::StoreKey;
use sentinel_core::ValidationError;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::StoreError;

/// Durable, thread-safe keyed storage for opaque structured values.
///
/// One writer connection behind a mutex; a small round-robin pool of
/// read-only connections for concurrent queries. The table name is
/// configurable so multiple logical stores can share one database file.
pub struct KvStore {
    table_name: String,
    write_connection: Arc<Mutex<Connection>>,
    read_connections: Arc<Vec<Mutex<Connection>>>,
    read_cursor: Arc<AtomicUsize>,
}

impl KvStore {
    /// Opens (creating if absent) a K/V store backed by the SQLite file at
    /// `path`, with `read_pool_size` read-only connections.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] or [`StoreError::Db`] if the database
    /// cannot be opened or its schema initialized.
    pub fn open(path: &Path, config: &StoreConfig, read_pool_size: usize) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| StoreError::Io(err.to_string()))?;
            }
        }

        let mut write_connection = open_connection(path, config)?;
        initialize_schema(&mut write_connection, &config.table_name)?;

        let mut read_connections = Vec::with_capacity(read_pool_size.max(1));
        for _ in 0..read_pool_size.max(1) {
            let mut read_connection = open_connection(path, config)?;
            initialize_schema(&mut read_connection, &config.table_name)?;
            read_connections.push(Mutex::new(read_connection));
        }

        Ok(Self {
            table_name: config.table_name.clone(),
            write_connection: Arc::new(Mutex::new(write_connection)),
            read_connections: Arc::new(read_connections),
            read_cursor: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn read_connection(&self) -> &Mutex<Connection> {
        let len = self.read_connections.len();
        let index = self.read_cursor.fetch_add(1, Ordering::Relaxed) % len;
        &self.read_connections[index]
    }

    /// Inserts or updates `key`, preserving its original `created_at` on
    /// update and always refreshing `updated_at`.
    ///
    /// # Errors
    /// Returns [`ValidationError`] if `key` is empty, or [`StoreError::Db`]
    /// on an engine failure.
    pub async fn set(
        &self,
        key: impl Into<String> + Send,
        value: serde_json::Map<String, serde_json::Value>,
        metadata: Option<BTreeMap<String, String>>,
    ) -> Result<(), StoreError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ValidationError::Empty { field: "key" }.into());
        }
        let table = self.table_name.clone();
        let metadata = metadata.unwrap_or_default();
        let write_connection = Arc::clone(&self.write_connection);

        tokio::task::spawn_blocking(move || {
            let connection = write_connection.lock().map_err(|_| StoreError::Poisoned)?;
            let now = OffsetDateTime::now_utc();
            let now_text = format_timestamp(now)?;

            let existing_created_at: Option<String> = connection
                .query_row(
                    &format!("SELECT created_at FROM {table} WHERE key = ?1"),
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;

            let created_at_text = existing_created_at.unwrap_or_else(|| now_text.clone());
            let value_text = serde_json::to_string(&value)
                .map_err(|err| StoreError::Db(format!("value serialization failed: {err}")))?;
            let metadata_text = serde_json::to_string(&metadata)
                .map_err(|err| StoreError::Db(format!("metadata serialization failed: {err}")))?;

            connection.execute(
                &format!(
                    "INSERT INTO {table} (key, value, created_at, updated_at, metadata) \
                     VALUES (?1, ?2, ?3, ?4, ?5) \
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
                     updated_at = excluded.updated_at, metadata = excluded.metadata"
                ),
                params![key, value_text, created_at_text, now_text, metadata_text],
            )?;
            Ok(())
        })
        .await
        .map_err(|err| StoreError::Db(format!("writer task join failed: {err}")))?
    }

    /// Returns the current value for `key`, or `None` if it is absent.
    ///
    /// # Errors
    /// Returns [`StoreError::Db`] on an engine failure, or
    /// [`StoreError::Corrupt`] if the stored value cannot be decoded.
    pub async fn get(
        &self,
        key: impl Into<String> + Send,
    ) -> Result<Option<serde_json::Map<String, serde_json::Value>>, StoreError> {
        let key = key.into();
        let table = self.table_name.clone();
        let connection = Arc::clone(&self.read_connections);
        let cursor = Arc::clone(&self.read_cursor);

        tokio::task::spawn_blocking(move || {
            let index = cursor.fetch_add(1, Ordering::Relaxed) % connection.len();
            let guard = connection[index].lock().map_err(|_| StoreError::Poisoned)?;
            let row: Option<String> = guard
                .query_row(&format!("SELECT value FROM {table} WHERE key = ?1"), params![key], |row| {
                    row.get(0)
                })
                .optional()?;
            row.map(|text| {
                serde_json::from_str(&text).map_err(|err| StoreError::Corrupt {
                    key: key.clone(),
                    reason: err.to_string(),
                })
            })
            .transpose()
        })
        .await
        .map_err(|err| StoreError::Db(format!("reader task join failed: {err}")))?
    }

    /// Deletes `key`. Idempotent: deleting a missing key is not an error.
    ///
    /// # Errors
    /// Returns [`StoreError::Db`] on an engine failure.
    pub async fn delete(&self, key: impl Into<String> + Send) -> Result<(), StoreError> {
        let key = key.into();
        let table = self.table_name.clone();
        let write_connection = Arc::clone(&self.write_connection);

        tokio::task::spawn_blocking(move || {
            let connection = write_connection.lock().map_err(|_| StoreError::Poisoned)?;
            connection.execute(&format!("DELETE FROM {table} WHERE key = ?1"), params![key])?;
            Ok(())
        })
        .await
        .map_err(|err| StoreError::Db(format!("writer task join failed: {err}")))?
    }

    /// Returns every key with the given lexical `prefix` (`""` matches all).
    ///
    /// # Errors
    /// Returns [`StoreError::Db`] on an engine failure.
    pub async fn list_keys(&self, prefix: impl Into<String> + Send) -> Result<Vec<String>, StoreError> {
        let prefix = prefix.into();
        let table = self.table_name.clone();
        let connection = Arc::clone(&self.read_connections);
        let cursor = Arc::clone(&self.read_cursor);

        tokio::task::spawn_blocking(move || {
            let index = cursor.fetch_add(1, Ordering::Relaxed) % connection.len();
            let guard = connection[index].lock().map_err(|_| StoreError::Poisoned)?;
            let like_pattern = format!("{}%", escape_like(&prefix));
            let mut statement =
                guard.prepare(&format!("SELECT key FROM {table} WHERE key LIKE ?1 ESCAPE '\\' ORDER BY key ASC"))?;
            let rows = statement.query_map(params![like_pattern], |row| row.get::<_, String>(0))?;
            let mut keys = Vec::new();
            for row in rows {
                keys.push(row?);
            }
            Ok(keys)
        })
        .await
        .map_err(|err| StoreError::Db(format!("reader task join failed: {err}")))?
    }

    /// Returns every entry in the store, in ascending key order.
    ///
    /// # Errors
    /// Returns [`StoreError::Db`] on an engine failure, or
    /// [`StoreError::Corrupt`] if a stored row cannot be decoded.
    pub async fn list_all(&self) -> Result<Vec<StoreEntry>, StoreError> {
        let table = self.table_name.clone();
        let connection = Arc::clone(&self.read_connections);
        let cursor = Arc::clone(&self.read_cursor);

        tokio::task::spawn_blocking(move || {
            let index = cursor.fetch_add(1, Ordering::Relaxed) % connection.len();
            let guard = connection[index].lock().map_err(|_| StoreError::Poisoned)?;
            let mut statement = guard.prepare(&format!(
                "SELECT key, value, created_at, updated_at, metadata FROM {table} ORDER BY key ASC"
            ))?;
            let rows = statement.query_map(params![], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?;

            let mut entries = Vec::new();
            for row in rows {
                let (key, value, created_at, updated_at, metadata) = row?;
                entries.push(decode_entry(key, &value, &created_at, &updated_at, &metadata)?);
            }
            Ok(entries)
        })
        .await
        .map_err(|err| StoreError::Db(format!("reader task join failed: {err}")))?
    }

    /// Returns every entry for which `predicate` returns `true`.
    ///
    /// Implemented as an in-memory filter over [`KvStore::list_all`]; this
    /// store is sized for small pattern/HITL-scale data, not bulk scans.
    ///
    /// # Errors
    /// Propagates any [`StoreError`] from [`KvStore::list_all`].
    pub async fn query<F>(&self, predicate: F) -> Result<Vec<StoreEntry>, StoreError>
    where
        F: Fn(&StoreEntry) -> bool + Send + 'static,
    {
        let entries = self.list_all().await?;
        Ok(entries.into_iter().filter(predicate).collect())
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn format_timestamp(value: OffsetDateTime) -> Result<String, StoreError> {
    value
        .format(&Rfc3339)
        .map_err(|err| StoreError::Db(format!("timestamp formatting failed: {err}")))
}

fn parse_timestamp(raw: &str, key: &str) -> Result<OffsetDateTime, StoreError> {
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|err| StoreError::Corrupt {
        key: key.to_owned(),
        reason: format!("invalid timestamp: {err}"),
    })
}

fn decode_entry(
    key: String,
    value: &str,
    created_at: &str,
    updated_at: &str,
    metadata: &str,
) -> Result<StoreEntry, StoreError> {
    let decoded_value: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(value).map_err(|err| StoreError::Corrupt {
            key: key.clone(),
            reason: err.to_string(),
        })?;
    let decoded_metadata: BTreeMap<String, String> =
        serde_json::from_str(metadata).map_err(|err| StoreError::Corrupt {
            key: key.clone(),
            reason: err.to_string(),
        })?;
    let created_at = parse_timestamp(created_at, &key)?;
    let updated_at = parse_timestamp(updated_at, &key)?;
    Ok(StoreEntry {
        key: StoreKey::new(key),
        value: decoded_value,
        metadata: decoded_metadata,
        created_at,
        updated_at,
    })
}

fn open_connection(path: &Path, config: &StoreConfig) -> Result<Connection, StoreError> {
    let flags =
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(path, flags)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

fn apply_pragmas(connection: &Connection, config: &StoreConfig) -> Result<(), StoreError> {
    connection.execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))?;
    connection.busy_timeout(std::time::Duration::from_millis(u64::from(config.busy_timeout_ms)))?;
    Ok(())
}

fn initialize_schema(connection: &mut Connection, table: &str) -> Result<(), StoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            metadata TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_{table}_key_prefix ON {table} (key);"
    ))?;
    tx.commit()?;
    Ok(())
}
