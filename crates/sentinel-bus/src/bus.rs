// crates/sentinel-bus/src/bus.rs
// ============================================================================
// Module: MessageBus
// Description: Durable pub/sub with priority ordering and in-process
//              multi-subscriber fan-out.
// Purpose: Give every agent a restart-durable, priority-ordered queue with
//          at-least-once delivery, while keeping live fan-out cheap and
//          non-blocking for publishers.
// Dependencies: rusqlite, tokio, tokio-stream, tracing, sentinel-core,
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
use sentinel_config::BusConfig;
use sentinel_core::CorrelationId;
use sentinel_core::Message;
use sentinel_core::MessageId;
use sentinel_core::MessageStatus;
use sentinel_core::ValidationError;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::mpsc;

use crate::engine;
use crate::error::BusError;
use crate::registry::SubscriberRegistry;
use crate::stats::BusStats;
use crate::subscription::Subscription;

/// Durable, priority-ordered, multi-subscriber message bus.
pub struct MessageBus {
    write_connection: Arc<Mutex<Connection>>,
    read_connections: Arc<Vec<Mutex<Connection>>>,
    read_cursor: Arc<AtomicUsize>,
    registry: Arc<SubscriberRegistry>,
    mailbox_capacity: usize,
    default_batch_size: usize,
}

impl MessageBus {
    /// Opens (creating if absent) a message bus backed by the SQLite file
    /// at `path`.
    ///
    /// # Errors
    /// Returns [`BusError::Io`] or [`BusError::Db`] if the database cannot
    /// be opened or its schema initialized.
    pub fn open(path: &Path, config: &BusConfig, read_pool_size: usize) -> Result<Self, BusError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| BusError::Io(err.to_string()))?;
            }
        }

        let mut write_connection = engine::open_connection(path, config)?;
        engine::initialize_schema(&mut write_connection)?;

        let mut read_connections = Vec::with_capacity(read_pool_size.max(1));
        for _ in 0..read_pool_size.max(1) {
            let mut read_connection = engine::open_connection(path, config)?;
            engine::initialize_schema(&mut read_connection)?;
            read_connections.push(Mutex::new(read_connection));
        }

        Ok(Self {
            write_connection: Arc::new(Mutex::new(write_connection)),
            read_connections: Arc::new(read_connections),
            read_cursor: Arc::new(AtomicUsize::new(0)),
            registry: Arc::new(SubscriberRegistry::default()),
            mailbox_capacity: config.mailbox_capacity,
            default_batch_size: config.batch_size,
        })
    }

    /// Publishes `payload` to `queue`, returning the new row's id.
    ///
    /// Safe under concurrent publishers: the insert is a single statement
    /// against the shared writer connection.
    ///
    /// # Errors
    /// Returns [`ValidationError`] if `queue` is empty, or [`BusError::Db`]
    /// on an engine failure.
    pub async fn publish(
        &self,
        queue: impl Into<String> + Send,
        payload: serde_json::Value,
        priority: i64,
        correlation_id: Option<CorrelationId>,
    ) -> Result<MessageId, BusError> {
        let queue = queue.into();
        if queue.trim().is_empty() {
            return Err(ValidationError::Empty { field: "queue" }.into());
        }
        let write_connection = Arc::clone(&self.write_connection);
        let registry = Arc::clone(&self.registry);
        let queue_for_notify = queue.clone();
        let correlation_text = correlation_id.as_ref().map(CorrelationId::as_str).map(str::to_owned);

        let message = tokio::task::spawn_blocking(move || -> Result<Message, BusError> {
            let connection = write_connection.lock().map_err(|_| BusError::Poisoned)?;
            let now = OffsetDateTime::now_utc();
            let now_text = format_timestamp(now)?;
            let payload_text = serde_json::to_string(&payload)
                .map_err(|err| BusError::Db(format!("payload serialization failed: {err}")))?;

            connection.execute(
                "INSERT INTO messages (queue_name, payload, priority, correlation_id, created_at, processed_at, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5, NULL, 'pending')",
                params![queue, payload_text, priority, correlation_text, now_text],
            )?;
            let id = MessageId::new(connection.last_insert_rowid());

            Ok(Message {
                id,
                queue_name: queue,
                payload,
                priority,
                correlation_id,
                created_at: now,
                processed_at: None,
                status: MessageStatus::Pending,
            })
        })
        .await
        .map_err(|err| BusError::Db(format!("writer task join failed: {err}")))??;

        self.registry.notify(&queue_for_notify, &message);
        Ok(message.id)
    }

    /// Subscribes to `queue`: drains the durable `pending` backlog (up to
    /// `batch_size`, ordered `priority DESC, created_at ASC`), then yields
    /// each subsequently published message as it arrives.
    ///
    /// # Errors
    /// Returns [`BusError::Db`] if the initial backlog drain fails.
    pub async fn subscribe(
        &self,
        queue: impl Into<String> + Send,
        batch_size: Option<usize>,
    ) -> Result<Subscription, BusError> {
        let queue = queue.into();
        let batch_size = batch_size.unwrap_or(self.default_batch_size);
        let read_connections = Arc::clone(&self.read_connections);
        let read_cursor = Arc::clone(&self.read_cursor);
        let queue_for_drain = queue.clone();

        let backlog = tokio::task::spawn_blocking(move || -> Result<Vec<Message>, BusError> {
            let index = read_cursor.fetch_add(1, Ordering::Relaxed) % read_connections.len();
            let guard = read_connections[index].lock().map_err(|_| BusError::Poisoned)?;
            drain_pending(&guard, &queue_for_drain, batch_size)
        })
        .await
        .map_err(|err| BusError::Db(format!("reader task join failed: {err}")))??;

        let (sender, receiver) = mpsc::channel(self.mailbox_capacity.max(1));
        let subscriber_id = self.registry.register(&queue, sender);

        Ok(Subscription::new(backlog, receiver, Arc::clone(&self.registry), queue, subscriber_id))
    }

    /// Marks `message_id` as processed. Idempotent: acknowledging an
    /// already-processed row is not an error.
    ///
    /// # Errors
    /// Returns [`BusError::Db`] on an engine failure.
    pub async fn ack(&self, message_id: MessageId) -> Result<(), BusError> {
        let write_connection = Arc::clone(&self.write_connection);

        tokio::task::spawn_blocking(move || {
            let connection = write_connection.lock().map_err(|_| BusError::Poisoned)?;
            let now_text = format_timestamp(OffsetDateTime::now_utc())?;
            connection.execute(
                "UPDATE messages SET status = 'processed', processed_at = ?1 \
                 WHERE id = ?2 AND status = 'pending'",
                params![now_text, message_id.get()],
            )?;
            Ok(())
        })
        .await
        .map_err(|err| BusError::Db(format!("writer task join failed: {err}")))?
    }

    /// Returns the number of `pending` rows for `queue`.
    ///
    /// # Errors
    /// Returns [`BusError::Db`] on an engine failure.
    pub async fn get_pending_count(&self, queue: impl Into<String> + Send) -> Result<i64, BusError> {
        let queue = queue.into();
        let read_connections = Arc::clone(&self.read_connections);
        let read_cursor = Arc::clone(&self.read_cursor);

        tokio::task::spawn_blocking(move || {
            let index = read_cursor.fetch_add(1, Ordering::Relaxed) % read_connections.len();
            let guard = read_connections[index].lock().map_err(|_| BusError::Poisoned)?;
            let count: i64 = guard.query_row(
                "SELECT COUNT(*) FROM messages WHERE queue_name = ?1 AND status = 'pending'",
                params![queue],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(|err| BusError::Db(format!("reader task join failed: {err}")))?
    }

    /// Returns every row for `correlation_id`, ordered by `created_at ASC`.
    ///
    /// # Errors
    /// Returns [`BusError::Db`] on an engine failure, or
    /// [`BusError::Corrupt`] if a row cannot be decoded.
    pub async fn get_by_correlation(&self, correlation_id: &CorrelationId) -> Result<Vec<Message>, BusError> {
        let correlation_text = correlation_id.as_str().to_owned();
        let read_connections = Arc::clone(&self.read_connections);
        let read_cursor = Arc::clone(&self.read_cursor);

        tokio::task::spawn_blocking(move || {
            let index = read_cursor.fetch_add(1, Ordering::Relaxed) % read_connections.len();
            let guard = read_connections[index].lock().map_err(|_| BusError::Poisoned)?;
            let mut statement = guard.prepare(
                "SELECT id, queue_name, payload, priority, correlation_id, created_at, processed_at, status \
                 FROM messages WHERE correlation_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = statement.query_map(params![correlation_text], row_to_raw)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(decode_message(row?)?);
            }
            Ok(messages)
        })
        .await
        .map_err(|err| BusError::Db(format!("reader task join failed: {err}")))?
    }

    /// Returns durable row counts and live subscriber counts across every
    /// queue.
    ///
    /// # Errors
    /// Returns [`BusError::Db`] on an engine failure.
    pub async fn get_stats(&self) -> Result<BusStats, BusError> {
        let read_connections = Arc::clone(&self.read_connections);
        let read_cursor = Arc::clone(&self.read_cursor);
        let registry = Arc::clone(&self.registry);

        tokio::task::spawn_blocking(move || {
            let index = read_cursor.fetch_add(1, Ordering::Relaxed) % read_connections.len();
            let guard = read_connections[index].lock().map_err(|_| BusError::Poisoned)?;

            let total_messages: i64 = guard.query_row("SELECT COUNT(*) FROM messages", params![], |row| row.get(0))?;

            let mut by_status = BTreeMap::new();
            let mut statement = guard.prepare("SELECT status, COUNT(*) FROM messages GROUP BY status")?;
            let rows = statement.query_map(params![], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
            for row in rows {
                let (status, count) = row?;
                by_status.insert(status, usize::try_from(count).unwrap_or(usize::MAX));
            }

            let mut by_queue: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
            let mut statement =
                guard.prepare("SELECT queue_name, status, COUNT(*) FROM messages GROUP BY queue_name, status")?;
            let rows = statement.query_map(params![], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
            })?;
            for row in rows {
                let (queue, status, count) = row?;
                by_queue.entry(queue).or_default().insert(status, usize::try_from(count).unwrap_or(usize::MAX));
            }

            Ok(BusStats {
                total_messages: usize::try_from(total_messages).unwrap_or(usize::MAX),
                by_status,
                by_queue,
                active_subscribers: registry.active_counts(),
            })
        })
        .await
        .map_err(|err| BusError::Db(format!("reader task join failed: {err}")))?
    }
}

fn drain_pending(connection: &Connection, queue: &str, batch_size: usize) -> Result<Vec<Message>, BusError> {
    let mut statement = connection.prepare(
        "SELECT id, queue_name, payload, priority, correlation_id, created_at, processed_at, status \
         FROM messages WHERE queue_name = ?1 AND status = 'pending' \
         ORDER BY priority DESC, created_at ASC LIMIT ?2",
    )?;
    let limit = i64::try_from(batch_size).unwrap_or(i64::MAX);
    let rows = statement.query_map(params![queue, limit], row_to_raw)?;
    let mut messages = Vec::new();
    for row in rows {
        messages.push(decode_message(row?)?);
    }
    Ok(messages)
}

/// Raw column tuple pulled straight off a `messages` row, before JSON and
/// timestamp decoding.
type RawRow = (i64, String, String, i64, Option<String>, String, Option<String>, String);

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn decode_message(raw: RawRow) -> Result<Message, BusError> {
    let (id, queue_name, payload, priority, correlation_id, created_at, processed_at, status) = raw;

    let payload: serde_json::Value = serde_json::from_str(&payload).map_err(|err| BusError::Corrupt {
        id,
        reason: err.to_string(),
    })?;
    let created_at = parse_timestamp(&created_at, id)?;
    let processed_at = processed_at.map(|text| parse_timestamp(&text, id)).transpose()?;
    let status = match status.as_str() {
        "pending" => MessageStatus::Pending,
        "processed" => MessageStatus::Processed,
        other => {
            return Err(BusError::Corrupt {
                id,
                reason: format!("unrecognized status {other:?}"),
            })
        }
    };

    Ok(Message {
        id: MessageId::new(id),
        queue_name,
        payload,
        priority,
        correlation_id: correlation_id.map(CorrelationId::new),
        created_at,
        processed_at,
        status,
    })
}

fn format_timestamp(value: OffsetDateTime) -> Result<String, BusError> {
    value.format(&Rfc3339).map_err(|err| BusError::Db(format!("timestamp formatting failed: {err}")))
}

fn parse_timestamp(raw: &str, id: i64) -> Result<OffsetDateTime, BusError> {
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|err| BusError::Corrupt {
        id,
        reason: format!("invalid timestamp: {err}"),
    })
}
