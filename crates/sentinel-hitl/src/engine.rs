// crates/sentinel-hitl/src/engine.rs
// ============================================================================
// Module: hitl engine
// Description: Connection setup and schema for the durable `hitl_questions`
//              table.
// Purpose: Same engine as the K/V store and the bus, a separate schema
//          purpose-built for the question lifecycle.
// Dependencies: rusqlite
// ============================================================================

use std::path::Path;

use rusqlite::Connection;
use rusqlite::OpenFlags;

use crate::error::HitlError;

/// Default SQLite `busy_timeout`, matching the other durable substrates'
/// baseline; the HITL table carries no tunable config of its own.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

pub(crate) fn open_connection(path: &Path) -> Result<Connection, HitlError> {
    let flags =
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(path, flags)?;
    connection.execute_batch("PRAGMA journal_mode = WAL;")?;
    connection.busy_timeout(std::time::Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(connection)
}

pub(crate) fn initialize_schema(connection: &mut Connection) -> Result<(), HitlError> {
    let tx = connection.transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS hitl_questions (
            question_id TEXT PRIMARY KEY,
            question_text TEXT NOT NULL,
            context TEXT NOT NULL,
            options TEXT NOT NULL,
            timeout_seconds INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            status TEXT NOT NULL,
            response TEXT,
            answered_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_hitl_status_created ON hitl_questions (status, created_at);
        CREATE INDEX IF NOT EXISTS idx_hitl_expires ON hitl_questions (expires_at);",
    )?;
    tx.commit()?;
    Ok(())
}
