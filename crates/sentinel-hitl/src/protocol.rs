// crates/sentinel-hitl/src/protocol.rs
// ============================================================================
// Module: HitlProtocol
// Description: Async human-in-the-loop question/response lifecycle,
//              persisted across restarts and mirrored onto the message bus.
// Purpose: Give ARCHITECT and external callers a durable "ask a human and
//          await the answer" primitive that survives process restarts and
//          honors a precise timeout.
// Dependencies: rusqlite, tokio, uuid, sentinel-bus, sentinel-config,
//               sentinel-core
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::params;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use sentinel_bus::MessageBus;
use sentinel_config::HitlConfig;
use sentinel_core::HitlQuestion;
use sentinel_core::HitlResponse;
use sentinel_core::HitlStatus;
use sentinel_core::QuestionId;
use sentinel_core::ValidationError;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::engine;
use crate::error::HitlError;
use crate::stats::HitlStats;
use crate::waiters::WaiterRegistry;

const MIRROR_PRIORITY: i64 = 5;

/// Async human-in-the-loop question/response protocol.
///
/// Questions are durable rows in their own `hitl_questions` table (same
/// engine as [`sentinel_store::KvStore`], separate schema) and are mirrored
/// as messages onto a bus queue so external UIs can observe the backlog
/// without polling this crate directly.
pub struct HitlProtocol {
    write_connection: Arc<Mutex<Connection>>,
    read_connections: Arc<Vec<Mutex<Connection>>>,
    read_cursor: Arc<AtomicUsize>,
    waiters: Arc<WaiterRegistry>,
    bus: Arc<MessageBus>,
    queue_name: String,
    default_timeout_seconds: u64,
}

impl HitlProtocol {
    /// Opens (creating if absent) the HITL question table backed by the
    /// SQLite file at `path`, mirroring questions onto `bus`.
    ///
    /// # Errors
    /// Returns [`HitlError::Io`] or [`HitlError::Db`] if the database
    /// cannot be opened or its schema initialized.
    pub fn open(
        path: &Path,
        config: &HitlConfig,
        bus: Arc<MessageBus>,
        read_pool_size: usize,
    ) -> Result<Self, HitlError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| HitlError::Io(err.to_string()))?;
            }
        }

        let mut write_connection = engine::open_connection(path)?;
        engine::initialize_schema(&mut write_connection)?;

        let mut read_connections = Vec::with_capacity(read_pool_size.max(1));
        for _ in 0..read_pool_size.max(1) {
            let mut read_connection = engine::open_connection(path)?;
            engine::initialize_schema(&mut read_connection)?;
            read_connections.push(Mutex::new(read_connection));
        }

        Ok(Self {
            write_connection: Arc::new(Mutex::new(write_connection)),
            read_connections: Arc::new(read_connections),
            read_cursor: Arc::new(AtomicUsize::new(0)),
            waiters: Arc::new(WaiterRegistry::new()),
            bus,
            queue_name: config.queue_name.clone(),
            default_timeout_seconds: config.default_timeout_seconds,
        })
    }

    /// Asks `question`, returning its generated id immediately.
    ///
    /// Inserts a `pending` row and mirrors it onto the bus; the caller
    /// must use [`HitlProtocol::wait_response`] to observe the answer.
    ///
    /// # Errors
    /// Returns [`ValidationError`] if `question` is empty, or
    /// [`HitlError::Db`]/[`HitlError::Bus`] on a downstream failure.
    pub async fn ask_async(
        &self,
        question: impl Into<String> + Send,
        context: Option<BTreeMap<String, String>>,
        options: Option<Vec<String>>,
        timeout_seconds: Option<u64>,
    ) -> Result<QuestionId, HitlError> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(ValidationError::Empty { field: "question" }.into());
        }
        let context = context.unwrap_or_default();
        let options = options.unwrap_or_default();
        let timeout_seconds = timeout_seconds.unwrap_or(self.default_timeout_seconds).max(1);

        let question_id = QuestionId::new(uuid::Uuid::new_v4().to_string());
        let write_connection = Arc::clone(&self.write_connection);
        let id_for_write = question_id.clone();
        let question_for_write = question.clone();
        let context_for_write = context.clone();
        let options_for_write = options.clone();

        let expires_at = tokio::task::spawn_blocking(move || -> Result<OffsetDateTime, HitlError> {
            let connection = write_connection.lock().map_err(|_| HitlError::Poisoned)?;
            let now = OffsetDateTime::now_utc();
            let expires_at = now + Duration::from_secs(timeout_seconds);
            let now_text = format_timestamp(now)?;
            let expires_text = format_timestamp(expires_at)?;
            let context_text = serde_json::to_string(&context_for_write)
                .map_err(|err| HitlError::Db(format!("context serialization failed: {err}")))?;
            let options_text = serde_json::to_string(&options_for_write)
                .map_err(|err| HitlError::Db(format!("options serialization failed: {err}")))?;

            connection.execute(
                "INSERT INTO hitl_questions \
                 (question_id, question_text, context, options, timeout_seconds, \
                  created_at, expires_at, status, response, answered_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending', NULL, NULL)",
                params![
                    id_for_write.as_str(),
                    question_for_write,
                    context_text,
                    options_text,
                    i64::try_from(timeout_seconds).unwrap_or(i64::MAX),
                    now_text,
                    expires_text,
                ],
            )?;
            Ok(expires_at)
        })
        .await
        .map_err(|err| HitlError::Db(format!("writer task join failed: {err}")))??;

        let mirror_payload = serde_json::json!({
            "question_id": question_id.as_str(),
            "question": question,
            "context": context,
            "options": options,
            "expires_at": format_timestamp(expires_at)?,
        });
        self.bus.publish(self.queue_name.clone(), mirror_payload, MIRROR_PRIORITY, None).await?;

        Ok(question_id)
    }

    /// Awaits the answer to `question_id`, up to `timeout`.
    ///
    /// Returns immediately if the question is already answered. Otherwise
    /// registers a one-shot waiter and suspends until
    /// [`HitlProtocol::submit_response`] fires it or `timeout` elapses; the
    /// waiter is always removed on exit, including on cancellation.
    ///
    /// # Errors
    /// Returns [`HitlError::NotFound`] if no such question exists,
    /// [`HitlError::Timeout`] if `timeout` elapses first.
    pub async fn wait_response(&self, question_id: &QuestionId, timeout: Duration) -> Result<HitlResponse, HitlError> {
        if let Some(question) = self.load_question(question_id).await? {
            if question.status == HitlStatus::Answered {
                return response_from_answered(&question);
            }
        } else {
            return Err(HitlError::NotFound(question_id.as_str().to_owned()));
        }

        let receiver = self.waiters.register(question_id.as_str());

        // Close the race where the answer landed between the load above and
        // the registration just now.
        if let Some(question) = self.load_question(question_id).await? {
            if question.status == HitlStatus::Answered {
                self.waiters.remove(question_id.as_str());
                return response_from_answered(&question);
            }
        }

        let outcome = tokio::time::timeout(timeout, receiver).await;
        self.waiters.remove(question_id.as_str());

        match outcome {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(HitlError::NotFound(question_id.as_str().to_owned())),
            Err(_) => Err(HitlError::Timeout),
        }
    }

    /// Submits `answer` for `question_id`, moving it to `answered` and
    /// waking any registered waiter.
    ///
    /// # Errors
    /// Returns [`ValidationError`] if `answer` is empty,
    /// [`HitlError::NotFound`] if the question does not exist or is no
    /// longer pending.
    pub async fn submit_response(
        &self,
        question_id: &QuestionId,
        answer: impl Into<String> + Send,
    ) -> Result<(), HitlError> {
        let answer = answer.into();
        if answer.trim().is_empty() {
            return Err(ValidationError::Empty { field: "answer" }.into());
        }
        let write_connection = Arc::clone(&self.write_connection);
        let id_text = question_id.as_str().to_owned();
        let answer_for_write = answer.clone();

        let answered_at = tokio::task::spawn_blocking(move || -> Result<OffsetDateTime, HitlError> {
            let connection = write_connection.lock().map_err(|_| HitlError::Poisoned)?;
            let now = OffsetDateTime::now_utc();
            let now_text = format_timestamp(now)?;
            let updated = connection.execute(
                "UPDATE hitl_questions SET status = 'answered', response = ?1, answered_at = ?2 \
                 WHERE question_id = ?3 AND status = 'pending'",
                params![answer_for_write, now_text, id_text],
            )?;
            if updated == 0 {
                return Err(HitlError::NotFound(id_text));
            }
            Ok(now)
        })
        .await
        .map_err(|err| HitlError::Db(format!("writer task join failed: {err}")))??;

        let response = HitlResponse { question_id: question_id.clone(), answer, answered_at };
        self.waiters.fire(response);
        Ok(())
    }

    /// Convenience wrapper: asks a yes/no `action`, awaits the answer, and
    /// parses it case-insensitively (`yes|y|true|1` is approval).
    ///
    /// # Errors
    /// Propagates any [`HitlError`] from `ask_async`/`wait_response`.
    pub async fn approve(
        &self,
        action: impl Into<String> + Send,
        details: Option<BTreeMap<String, String>>,
        timeout_seconds: Option<u64>,
    ) -> Result<bool, HitlError> {
        let timeout_seconds = timeout_seconds.unwrap_or(self.default_timeout_seconds).max(1);
        let question_id = self
            .ask_async(action, details, Some(vec!["yes".to_owned(), "no".to_owned()]), Some(timeout_seconds))
            .await?;
        let response = self.wait_response(&question_id, Duration::from_secs(timeout_seconds)).await?;
        Ok(response.is_approval())
    }

    /// Returns pending, unexpired questions, ordered by `created_at ASC`.
    ///
    /// # Errors
    /// Returns [`HitlError::Db`] on an engine failure.
    pub async fn get_pending(&self, limit: usize) -> Result<Vec<HitlQuestion>, HitlError> {
        let read_connections = Arc::clone(&self.read_connections);
        let read_cursor = Arc::clone(&self.read_cursor);

        tokio::task::spawn_blocking(move || {
            let index = read_cursor.fetch_add(1, Ordering::Relaxed) % read_connections.len();
            let guard = read_connections[index].lock().map_err(|_| HitlError::Poisoned)?;
            let now_text = format_timestamp(OffsetDateTime::now_utc())?;
            let mut statement = guard.prepare(
                "SELECT question_id, question_text, context, options, timeout_seconds, \
                        created_at, expires_at, status, response, answered_at \
                 FROM hitl_questions WHERE status = 'pending' AND expires_at > ?1 \
                 ORDER BY created_at ASC LIMIT ?2",
            )?;
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let rows = statement.query_map(params![now_text, limit], row_to_raw)?;
            let mut questions = Vec::new();
            for row in rows {
                questions.push(decode_question(row?)?);
            }
            Ok(questions)
        })
        .await
        .map_err(|err| HitlError::Db(format!("reader task join failed: {err}")))?
    }

    /// Moves every `pending` row whose `expires_at` has passed to
    /// `expired`, returning the number of rows updated. Never touches
    /// already-`answered` rows.
    ///
    /// # Errors
    /// Returns [`HitlError::Db`] on an engine failure.
    pub async fn expire_old_questions(&self) -> Result<u64, HitlError> {
        let write_connection = Arc::clone(&self.write_connection);

        let expired = tokio::task::spawn_blocking(move || {
            let connection = write_connection.lock().map_err(|_| HitlError::Poisoned)?;
            let now_text = format_timestamp(OffsetDateTime::now_utc())?;
            let updated = connection.execute(
                "UPDATE hitl_questions SET status = 'expired' \
                 WHERE status = 'pending' AND expires_at <= ?1",
                params![now_text],
            )?;
            Ok(u64::try_from(updated).unwrap_or(u64::MAX))
        })
        .await
        .map_err(|err| HitlError::Db(format!("writer task join failed: {err}")))??;

        if expired > 0 {
            tracing::debug!(expired, "swept overdue pending questions");
        }
        Ok(expired)
    }

    /// Returns aggregate counters across the question backlog.
    ///
    /// # Errors
    /// Returns [`HitlError::Db`] on an engine failure.
    pub async fn get_stats(&self) -> Result<HitlStats, HitlError> {
        let read_connections = Arc::clone(&self.read_connections);
        let read_cursor = Arc::clone(&self.read_cursor);

        tokio::task::spawn_blocking(move || {
            let index = read_cursor.fetch_add(1, Ordering::Relaxed) % read_connections.len();
            let guard = read_connections[index].lock().map_err(|_| HitlError::Poisoned)?;

            let total_questions: i64 =
                guard.query_row("SELECT COUNT(*) FROM hitl_questions", params![], |row| row.get(0))?;
            let pending: i64 = guard.query_row(
                "SELECT COUNT(*) FROM hitl_questions WHERE status = 'pending'",
                params![],
                |row| row.get(0),
            )?;
            let answered: i64 = guard.query_row(
                "SELECT COUNT(*) FROM hitl_questions WHERE status = 'answered'",
                params![],
                |row| row.get(0),
            )?;
            let expired: i64 = guard.query_row(
                "SELECT COUNT(*) FROM hitl_questions WHERE status = 'expired'",
                params![],
                |row| row.get(0),
            )?;
            let accepted: i64 = guard.query_row(
                "SELECT COUNT(*) FROM hitl_questions WHERE status = 'answered' \
                 AND LOWER(TRIM(response)) IN ('yes', 'y', 'true', '1')",
                params![],
                |row| row.get(0),
            )?;

            let acceptance_rate = if answered > 0 {
                f64_from_i64(accepted) / f64_from_i64(answered)
            } else {
                0.0
            };

            Ok(HitlStats {
                total_questions: u64::try_from(total_questions).unwrap_or(u64::MAX),
                pending: u64::try_from(pending).unwrap_or(u64::MAX),
                answered: u64::try_from(answered).unwrap_or(u64::MAX),
                expired: u64::try_from(expired).unwrap_or(u64::MAX),
                acceptance_rate,
            })
        })
        .await
        .map_err(|err| HitlError::Db(format!("reader task join failed: {err}")))?
    }

    async fn load_question(&self, question_id: &QuestionId) -> Result<Option<HitlQuestion>, HitlError> {
        let read_connections = Arc::clone(&self.read_connections);
        let read_cursor = Arc::clone(&self.read_cursor);
        let id_text = question_id.as_str().to_owned();

        tokio::task::spawn_blocking(move || {
            let index = read_cursor.fetch_add(1, Ordering::Relaxed) % read_connections.len();
            let guard = read_connections[index].lock().map_err(|_| HitlError::Poisoned)?;
            let row = guard
                .query_row(
                    "SELECT question_id, question_text, context, options, timeout_seconds, \
                            created_at, expires_at, status, response, answered_at \
                     FROM hitl_questions WHERE question_id = ?1",
                    params![id_text],
                    row_to_raw,
                )
                .optional()?;
            row.map(decode_question).transpose()
        })
        .await
        .map_err(|err| HitlError::Db(format!("reader task join failed: {err}")))?
    }
}

fn response_from_answered(question: &HitlQuestion) -> Result<HitlResponse, HitlError> {
    let answer = question.response.clone().ok_or_else(|| HitlError::Corrupt {
        question_id: question.question_id.as_str().to_owned(),
        reason: "answered row missing a response".to_owned(),
    })?;
    let answered_at = question.answered_at.ok_or_else(|| HitlError::Corrupt {
        question_id: question.question_id.as_str().to_owned(),
        reason: "answered row missing answered_at".to_owned(),
    })?;
    Ok(HitlResponse { question_id: question.question_id.clone(), answer, answered_at })
}

fn f64_from_i64(value: i64) -> f64 {
    #[allow(clippy::cast_precision_loss, reason = "question counts never approach f64's precision limit")]
    let out = value as f64;
    out
}

/// Raw column tuple pulled straight off a `hitl_questions` row, before JSON
/// and timestamp decoding.
type RawRow = (String, String, String, String, i64, String, String, String, Option<String>, Option<String>);

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
        row.get(8)?,
        row.get(9)?,
    ))
}

fn decode_question(raw: RawRow) -> Result<HitlQuestion, HitlError> {
    let (question_id, question, context, options, timeout_seconds, created_at, expires_at, status, response, answered_at) =
        raw;

    let context: BTreeMap<String, String> = serde_json::from_str(&context).map_err(|err| HitlError::Corrupt {
        question_id: question_id.clone(),
        reason: err.to_string(),
    })?;
    let options: Vec<String> = serde_json::from_str(&options).map_err(|err| HitlError::Corrupt {
        question_id: question_id.clone(),
        reason: err.to_string(),
    })?;
    let created_at = parse_timestamp(&created_at, &question_id)?;
    let expires_at = parse_timestamp(&expires_at, &question_id)?;
    let answered_at = answered_at.map(|text| parse_timestamp(&text, &question_id)).transpose()?;
    let status = match status.as_str() {
        "pending" => HitlStatus::Pending,
        "answered" => HitlStatus::Answered,
        "expired" => HitlStatus::Expired,
        other => {
            return Err(HitlError::Corrupt {
                question_id,
                reason: format!("unrecognized status {other:?}"),
            })
        }
    };

    Ok(HitlQuestion {
        question_id: QuestionId::new(question_id),
        question,
        context,
        options,
        timeout_seconds: u64::try_from(timeout_seconds).unwrap_or(0),
        created_at,
        expires_at,
        status,
        response,
        answered_at,
    })
}

fn format_timestamp(value: OffsetDateTime) -> Result<String, HitlError> {
    value.format(&Rfc3339).map_err(|err| HitlError::Db(format!("timestamp formatting failed: {err}")))
}

fn parse_timestamp(raw: &str, question_id: &str) -> Result<OffsetDateTime, HitlError> {
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|err| HitlError::Corrupt {
        question_id: question_id.to_owned(),
        reason: format!("invalid timestamp: {err}"),
    })
}
