// crates/sentinel-core/src/store_entry.rs
// ============================================================================
// Module: StoreEntry
// Description: The durable row shape returned by the K/V store's full-scan
//              and query operations.
// Purpose: Carry timestamps and metadata alongside a stored value without
//          forcing every caller through a table-specific row type.
// Dependencies: serde, serde_json, time, sentinel-core::ids
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::ids::StoreKey;

/// A single durable entry in the K/V store.
///
/// # Invariants
/// - `created_at` never changes after the first successful `set` for `key`.
/// - `updated_at >= created_at` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEntry {
    /// The entry's primary key.
    pub key: StoreKey,
    /// The stored structured value.
    pub value: serde_json::Map<String, serde_json::Value>,
    /// Free-form string metadata, indexed alongside the value for scans.
    pub metadata: BTreeMap<String, String>,
    /// Timestamp of the first successful `set` for this key.
    pub created_at: OffsetDateTime,
    /// Timestamp of the most recent `set` for this key.
    pub updated_at: OffsetDateTime,
}
