// crates/sentinel-bus/src/engine.rs
// ============================================================================
// Module: bus engine
// Description: Connection setup and schema for the durable `messages` table.
// Purpose: Mirror the K/V store's connection-management shape (validated
//          pragmas, transaction-wrapped schema init) for the bus's own
//          table, since the two durable substrates share an engine but not
//          a schema.
// Dependencies: rusqlite, sentinel-config
// ============================================================================

use std::path::Path;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use sentinel_config::BusConfig;

use crate::error::BusError;

pub(crate) fn open_connection(path: &Path, config: &BusConfig) -> Result<Connection, BusError> {
    let flags =
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(path, flags)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

fn apply_pragmas(connection: &Connection, config: &BusConfig) -> Result<(), BusError> {
    connection.execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))?;
    connection.busy_timeout(std::time::Duration::from_millis(u64::from(config.busy_timeout_ms)))?;
    Ok(())
}

pub(crate) fn initialize_schema(connection: &mut Connection) -> Result<(), BusError> {
    let tx = connection.transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            queue_name TEXT NOT NULL,
            payload TEXT NOT NULL,
            priority INTEGER NOT NULL,
            correlation_id TEXT,
            created_at TEXT NOT NULL,
            processed_at TEXT,
            status TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_messages_queue_status_priority
            ON messages (queue_name, status, priority DESC, created_at ASC);
        CREATE INDEX IF NOT EXISTS idx_messages_correlation ON messages (correlation_id);",
    )?;
    tx.commit()?;
    Ok(())
}
