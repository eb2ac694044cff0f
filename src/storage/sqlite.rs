//! `SQLite` feedback store.
//!
//! All multi-row logical updates run inside one transaction: a crash
//! mid-batch can never leave partial aggregate state. Reads aggregate with
//! `LOWER(entity)` so lookups are case-insensitive everywhere.

use crate::models::{
    AccuracyStats, Application, ApplicationStatus, FeedbackContext, FeedbackEntry, ScoreBreakdown,
    SuggestionEvent, Suppression, TimelineEntry,
};
use crate::{Error, Result};
use rusqlite::{params, Connection};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Helper to acquire mutex lock with poison recovery.
///
/// If the mutex is poisoned (a panic in a previous critical section), we
/// recover the inner value and log a warning. The connection state is still
/// valid; a poisoned lock must not cascade into every later call.
fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Escapes SQL LIKE wildcards in a string.
///
/// Folder names flow into LIKE prefixes; a folder literally named `100%`
/// must not match everything. Uses `\` as the escape character (requires
/// `ESCAPE '\'` in the LIKE clause).
fn escape_like_wildcards(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' | '_' | '\\' => {
                result.push('\\');
                result.push(c);
            },
            _ => result.push(c),
        }
    }
    result
}

/// Converts an `SQLite` aggregate (always `i64` on the wire) to a count.
/// Counts are never negative; a nonsensical value clamps to zero.
fn to_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

/// Whether a rusqlite error is an FTS5 query syntax problem.
fn is_fts_syntax_error(e: &rusqlite::Error) -> bool {
    let msg = e.to_string().to_lowercase();
    msg.contains("fts5")
        || msg.contains("malformed match")
        || msg.contains("unterminated string")
        || msg.contains("syntax error")
}

/// SQLite-backed feedback store.
pub struct SqliteStore {
    /// Connection to the `SQLite` database.
    conn: Mutex<Connection>,
    /// Path to the database (None for in-memory).
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::operation("create_data_dir", e))?;
            }
        }
        let conn = Connection::open(&db_path).map_err(|e| Error::operation("open_sqlite", e))?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| Error::operation("open_sqlite_memory", e))?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Initializes the schema.
    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);

        // WAL for concurrent readers; journal_mode returns a string, so the
        // result is ignored rather than batched.
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.pragma_update(None, "synchronous", "NORMAL");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS feedback (
                id TEXT PRIMARY KEY,
                entity TEXT NOT NULL,
                context TEXT NOT NULL,
                note_path TEXT NOT NULL,
                correct INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_feedback_entity ON feedback(LOWER(entity));
            CREATE INDEX IF NOT EXISTS idx_feedback_note_path ON feedback(note_path);
            CREATE INDEX IF NOT EXISTS idx_feedback_created_at ON feedback(created_at DESC);

            CREATE TABLE IF NOT EXISTS suppressions (
                entity TEXT PRIMARY KEY,
                false_positive_rate REAL NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS applications (
                entity TEXT NOT NULL,
                note_path TEXT NOT NULL,
                status TEXT NOT NULL,
                applied_at INTEGER NOT NULL,
                UNIQUE(entity, note_path)
            );
            CREATE INDEX IF NOT EXISTS idx_applications_note ON applications(note_path);

            CREATE TABLE IF NOT EXISTS suggestion_events (
                entity TEXT NOT NULL,
                note_path TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                total_score REAL NOT NULL,
                breakdown_json TEXT,
                threshold REAL NOT NULL,
                passed INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_entity
                ON suggestion_events(LOWER(entity), timestamp DESC);

            CREATE VIRTUAL TABLE IF NOT EXISTS feedback_fts USING fts5(
                id,
                entity,
                note_path,
                context
            );",
        )
        .map_err(|e| Error::operation("initialize_schema", e))?;

        Ok(())
    }

    // ---- feedback -------------------------------------------------------

    /// Appends one feedback entry. Never updates or deletes prior rows.
    ///
    /// # Errors
    ///
    /// Propagates the write failure; feedback recording is not best-effort.
    pub fn record_feedback(&self, entry: &FeedbackEntry) -> Result<()> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| Error::operation("record_feedback", e))?;
        tx.execute(
            "INSERT INTO feedback (id, entity, context, note_path, correct, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id,
                entry.entity,
                entry.context.as_str(),
                entry.note_path,
                i64::from(entry.correct),
                entry.created_at,
            ],
        )
        .map_err(|e| Error::operation("record_feedback", e))?;
        tx.execute(
            "INSERT INTO feedback_fts (id, entity, note_path, context)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id,
                entry.entity,
                entry.note_path,
                entry.context.as_str()
            ],
        )
        .map_err(|e| Error::operation("record_feedback", e))?;
        tx.commit()
            .map_err(|e| Error::operation("record_feedback", e))?;
        metrics::counter!("feedback_recorded_total").increment(1);
        Ok(())
    }

    /// Per-entity accuracy aggregates across all feedback, keyed by
    /// lowercase entity name. Empty map on zero rows, never an error.
    pub fn feedback_stats(&self) -> Result<HashMap<String, AccuracyStats>> {
        self.stats_where("", &[])
    }

    /// Per-entity aggregates restricted to notes inside a folder.
    pub fn folder_feedback_stats(&self, folder: &str) -> Result<HashMap<String, AccuracyStats>> {
        let prefix = format!("{}/%", escape_like_wildcards(folder.trim_end_matches('/')));
        self.stats_where("WHERE note_path LIKE ?1 ESCAPE '\\'", &[&prefix])
    }

    fn stats_where(
        &self,
        clause: &str,
        args: &[&dyn rusqlite::types::ToSql],
    ) -> Result<HashMap<String, AccuracyStats>> {
        let conn = acquire_lock(&self.conn);
        let sql = format!(
            "SELECT LOWER(entity), SUM(correct), COUNT(*) FROM feedback {clause} GROUP BY LOWER(entity)"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::operation("feedback_stats", e))?;
        let rows = stmt
            .query_map(args, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .map_err(|e| Error::operation("feedback_stats", e))?;

        let mut stats = HashMap::new();
        for row in rows {
            let (entity, correct, total) = row.map_err(|e| Error::operation("feedback_stats", e))?;
            stats.insert(
                entity,
                AccuracyStats {
                    correct: to_count(correct),
                    total: to_count(total),
                },
            );
        }
        Ok(stats)
    }

    /// All-time aggregate for one entity.
    pub fn entity_stats(&self, entity: &str) -> Result<AccuracyStats> {
        let conn = acquire_lock(&self.conn);
        conn.query_row(
            "SELECT COALESCE(SUM(correct), 0), COUNT(*) FROM feedback WHERE LOWER(entity) = LOWER(?1)",
            params![entity],
            |row| {
                Ok(AccuracyStats {
                    correct: to_count(row.get(0)?),
                    total: to_count(row.get(1)?),
                })
            },
        )
        .map_err(|e| Error::operation("entity_stats", e))
    }

    /// Folder-restricted aggregate for one entity.
    pub fn entity_folder_stats(&self, entity: &str, folder: &str) -> Result<AccuracyStats> {
        let prefix = format!("{}/%", escape_like_wildcards(folder.trim_end_matches('/')));
        let conn = acquire_lock(&self.conn);
        conn.query_row(
            "SELECT COALESCE(SUM(correct), 0), COUNT(*) FROM feedback
             WHERE LOWER(entity) = LOWER(?1) AND note_path LIKE ?2 ESCAPE '\\'",
            params![entity, prefix],
            |row| {
                Ok(AccuracyStats {
                    correct: to_count(row.get(0)?),
                    total: to_count(row.get(1)?),
                })
            },
        )
        .map_err(|e| Error::operation("entity_folder_stats", e))
    }

    /// Feedback entries for one entity since a timestamp, newest first.
    pub fn entity_feedback(&self, entity: &str, since: i64) -> Result<Vec<FeedbackEntry>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(
                "SELECT id, entity, context, note_path, correct, created_at FROM feedback
                 WHERE LOWER(entity) = LOWER(?1) AND created_at >= ?2
                 ORDER BY created_at DESC",
            )
            .map_err(|e| Error::operation("entity_feedback", e))?;
        let rows = stmt
            .query_map(params![entity, since], Self::feedback_from_row)
            .map_err(|e| Error::operation("entity_feedback", e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::operation("entity_feedback", e))
    }

    /// Full-text search over feedback rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for malformed match syntax; other
    /// persistence errors propagate as [`Error::OperationFailed`].
    pub fn search_feedback(&self, query: &str, limit: usize) -> Result<Vec<FeedbackEntry>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(
                "SELECT f.id, f.entity, f.context, f.note_path, f.correct, f.created_at
                 FROM feedback_fts fts
                 JOIN feedback f ON f.id = fts.id
                 WHERE feedback_fts MATCH ?1
                 ORDER BY f.created_at DESC
                 LIMIT ?2",
            )
            .map_err(|e| Error::operation("search_feedback", e))?;
        #[allow(clippy::cast_possible_wrap)]
        let rows = stmt.query_map(params![query, limit as i64], Self::feedback_from_row);
        let rows = match rows {
            Ok(rows) => rows,
            Err(e) if is_fts_syntax_error(&e) => {
                return Err(Error::InvalidInput(format!("invalid query '{query}': {e}")));
            },
            Err(e) => return Err(Error::operation("search_feedback", e)),
        };
        match rows.collect::<rusqlite::Result<Vec<_>>>() {
            Ok(entries) => Ok(entries),
            Err(e) if is_fts_syntax_error(&e) => {
                Err(Error::InvalidInput(format!("invalid query '{query}': {e}")))
            },
            Err(e) => Err(Error::operation("search_feedback", e)),
        }
    }

    fn feedback_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FeedbackEntry> {
        Ok(FeedbackEntry {
            id: row.get(0)?,
            entity: row.get(1)?,
            context: FeedbackContext::parse(&row.get::<_, String>(2)?),
            note_path: row.get(3)?,
            correct: row.get::<_, i64>(4)? != 0,
            created_at: row.get(5)?,
        })
    }

    // ---- applications ---------------------------------------------------

    /// Marks each entity as applied for a note. One transaction, explicit
    /// read-modify-write per (entity, note) pair; re-insertion flips a
    /// `removed` row back to `applied`.
    pub fn upsert_applications(&self, note_path: &str, entities: &[String], now: i64) -> Result<()> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| Error::operation("upsert_applications", e))?;
        for entity in entities {
            let existing: Option<String> = tx
                .query_row(
                    "SELECT status FROM applications
                     WHERE LOWER(entity) = LOWER(?1) AND note_path = ?2",
                    params![entity, note_path],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(Error::operation("upsert_applications", other)),
                })?;
            if existing.is_some() {
                tx.execute(
                    "UPDATE applications SET status = 'applied', applied_at = ?3
                     WHERE LOWER(entity) = LOWER(?1) AND note_path = ?2",
                    params![entity, note_path, now],
                )
                .map_err(|e| Error::operation("upsert_applications", e))?;
            } else {
                tx.execute(
                    "INSERT INTO applications (entity, note_path, status, applied_at)
                     VALUES (?1, ?2, 'applied', ?3)",
                    params![entity, note_path, now],
                )
                .map_err(|e| Error::operation("upsert_applications", e))?;
            }
        }
        tx.commit()
            .map_err(|e| Error::operation("upsert_applications", e))
    }

    /// Applications currently `applied` for a note.
    pub fn applied_for_note(&self, note_path: &str) -> Result<Vec<Application>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(
                "SELECT entity, note_path, status, applied_at FROM applications
                 WHERE note_path = ?1 AND status = 'applied'",
            )
            .map_err(|e| Error::operation("applied_for_note", e))?;
        let rows = stmt
            .query_map(params![note_path], Self::application_from_row)
            .map_err(|e| Error::operation("applied_for_note", e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::operation("applied_for_note", e))
    }

    /// All applications for one entity, newest transition first.
    pub fn applications_for_entity(&self, entity: &str) -> Result<Vec<Application>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(
                "SELECT entity, note_path, status, applied_at FROM applications
                 WHERE LOWER(entity) = LOWER(?1) ORDER BY applied_at DESC",
            )
            .map_err(|e| Error::operation("applications_for_entity", e))?;
        let rows = stmt
            .query_map(params![entity], Self::application_from_row)
            .map_err(|e| Error::operation("applications_for_entity", e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::operation("applications_for_entity", e))
    }

    fn application_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Application> {
        Ok(Application {
            entity: row.get(0)?,
            note_path: row.get(1)?,
            status: ApplicationStatus::parse(&row.get::<_, String>(2)?),
            applied_at: row.get(3)?,
        })
    }

    /// Records detected removals: for each entity, one implicit-negative
    /// feedback entry plus the status flip to `removed`, all in a single
    /// transaction.
    pub fn record_removals(
        &self,
        note_path: &str,
        entries: &[FeedbackEntry],
        now: i64,
    ) -> Result<()> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| Error::operation("record_removals", e))?;
        for entry in entries {
            tx.execute(
                "INSERT INTO feedback (id, entity, context, note_path, correct, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                params![
                    entry.id,
                    entry.entity,
                    entry.context.as_str(),
                    entry.note_path,
                    entry.created_at,
                ],
            )
            .map_err(|e| Error::operation("record_removals", e))?;
            tx.execute(
                "INSERT INTO feedback_fts (id, entity, note_path, context)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    entry.id,
                    entry.entity,
                    entry.note_path,
                    entry.context.as_str()
                ],
            )
            .map_err(|e| Error::operation("record_removals", e))?;
            tx.execute(
                "UPDATE applications SET status = 'removed', applied_at = ?3
                 WHERE LOWER(entity) = LOWER(?1) AND note_path = ?2",
                params![entry.entity, note_path, now],
            )
            .map_err(|e| Error::operation("record_removals", e))?;
        }
        tx.commit()
            .map_err(|e| Error::operation("record_removals", e))?;
        metrics::counter!("implicit_removals_total").increment(entries.len() as u64);
        Ok(())
    }

    // ---- suppressions ---------------------------------------------------

    /// All current suppression rows.
    pub fn suppressions(&self) -> Result<Vec<Suppression>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare("SELECT entity, false_positive_rate, updated_at FROM suppressions")
            .map_err(|e| Error::operation("suppressions", e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Suppression {
                    entity: row.get(0)?,
                    false_positive_rate: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            })
            .map_err(|e| Error::operation("suppressions", e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::operation("suppressions", e))
    }

    /// Lowercase names of all suppressed entities.
    pub fn suppressed_set(&self) -> Result<HashSet<String>> {
        Ok(self
            .suppressions()?
            .into_iter()
            .map(|s| s.entity.to_lowercase())
            .collect())
    }

    /// Whether one entity is globally suppressed.
    pub fn is_suppressed(&self, entity: &str) -> Result<Option<Suppression>> {
        let conn = acquire_lock(&self.conn);
        conn.query_row(
            "SELECT entity, false_positive_rate, updated_at FROM suppressions
             WHERE LOWER(entity) = LOWER(?1)",
            params![entity],
            |row| {
                Ok(Suppression {
                    entity: row.get(0)?,
                    false_positive_rate: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            },
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(Error::operation("is_suppressed", other)),
        })
    }

    /// Applies one suppression recompute: upserts and deletes in a single
    /// transaction, so readers never observe a half-applied pass.
    pub fn apply_suppression_changes(
        &self,
        upserts: &[Suppression],
        deletes: &[String],
    ) -> Result<()> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| Error::operation("apply_suppression_changes", e))?;
        for s in upserts {
            tx.execute(
                "INSERT INTO suppressions (entity, false_positive_rate, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(entity) DO UPDATE SET
                     false_positive_rate = excluded.false_positive_rate,
                     updated_at = excluded.updated_at",
                params![s.entity, s.false_positive_rate, s.updated_at],
            )
            .map_err(|e| Error::operation("apply_suppression_changes", e))?;
        }
        for entity in deletes {
            tx.execute(
                "DELETE FROM suppressions WHERE LOWER(entity) = LOWER(?1)",
                params![entity],
            )
            .map_err(|e| Error::operation("apply_suppression_changes", e))?;
        }
        tx.commit()
            .map_err(|e| Error::operation("apply_suppression_changes", e))
    }

    // ---- suggestion events ----------------------------------------------

    /// Appends audit events for one suggestion call in a single transaction.
    pub fn record_suggestion_events(&self, events: &[SuggestionEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| Error::operation("record_suggestion_events", e))?;
        for event in events {
            let breakdown_json = event
                .breakdown
                .as_ref()
                .and_then(|b| serde_json::to_string(b).ok());
            tx.execute(
                "INSERT INTO suggestion_events
                     (entity, note_path, timestamp, total_score, breakdown_json, threshold, passed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    event.entity,
                    event.note_path,
                    event.timestamp,
                    event.total_score,
                    breakdown_json,
                    event.threshold,
                    i64::from(event.passed),
                ],
            )
            .map_err(|e| Error::operation("record_suggestion_events", e))?;
        }
        tx.commit()
            .map_err(|e| Error::operation("record_suggestion_events", e))
    }

    /// Suggestion events for one entity since a timestamp, newest first.
    ///
    /// An unreadable `breakdown_json` becomes `breakdown: None`; a corrupt
    /// audit row must never break the journey view.
    pub fn events_for_entity(&self, entity: &str, since: i64) -> Result<Vec<SuggestionEvent>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(
                "SELECT entity, note_path, timestamp, total_score, breakdown_json, threshold, passed
                 FROM suggestion_events
                 WHERE LOWER(entity) = LOWER(?1) AND timestamp >= ?2
                 ORDER BY timestamp DESC",
            )
            .map_err(|e| Error::operation("events_for_entity", e))?;
        let rows = stmt
            .query_map(params![entity, since], |row| {
                let breakdown_json: Option<String> = row.get(4)?;
                let breakdown = breakdown_json
                    .as_deref()
                    .and_then(|j| serde_json::from_str::<ScoreBreakdown>(j).ok());
                Ok(SuggestionEvent {
                    entity: row.get(0)?,
                    note_path: row.get(1)?,
                    timestamp: row.get(2)?,
                    total_score: row.get(3)?,
                    breakdown,
                    threshold: row.get(5)?,
                    passed: row.get::<_, i64>(6)? != 0,
                })
            })
            .map_err(|e| Error::operation("events_for_entity", e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::operation("events_for_entity", e))
    }

    // ---- dashboard ------------------------------------------------------

    /// Overall feedback totals: (total rows, correct rows, distinct entities).
    pub fn feedback_totals(&self) -> Result<(u64, u64, u64)> {
        let conn = acquire_lock(&self.conn);
        let (total, correct, entities): (i64, i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(correct), 0), COUNT(DISTINCT LOWER(entity))
                 FROM feedback",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|e| Error::operation("feedback_totals", e))?;
        Ok((to_count(total), to_count(correct), to_count(entities)))
    }

    /// Application counts by status: (applied, removed).
    pub fn application_totals(&self) -> Result<(u64, u64)> {
        let conn = acquire_lock(&self.conn);
        let (applied, removed): (i64, i64) = conn
            .query_row(
                "SELECT
                     COALESCE(SUM(CASE WHEN status = 'applied' THEN 1 ELSE 0 END), 0),
                     COALESCE(SUM(CASE WHEN status = 'removed' THEN 1 ELSE 0 END), 0)
                 FROM applications",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| Error::operation("application_totals", e))?;
        Ok((to_count(applied), to_count(removed)))
    }

    /// Daily feedback activity for the last `days` days, newest first.
    pub fn feedback_timeline(&self, days: u32, now: i64) -> Result<Vec<TimelineEntry>> {
        let since = now - i64::from(days) * 86_400;
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(
                "SELECT date(created_at, 'unixepoch') AS day,
                        COUNT(*),
                        COALESCE(SUM(correct), 0)
                 FROM feedback
                 WHERE created_at >= ?1
                 GROUP BY day
                 ORDER BY day DESC",
            )
            .map_err(|e| Error::operation("feedback_timeline", e))?;
        let rows = stmt
            .query_map(params![since], |row| {
                Ok(TimelineEntry {
                    day: row.get(0)?,
                    total: to_count(row.get(1)?),
                    correct: to_count(row.get(2)?),
                })
            })
            .map_err(|e| Error::operation("feedback_timeline", e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::operation("feedback_timeline", e))
    }
}
