//! Feedback recording, aggregation, and the suppression engine.

use crate::models::{FeedbackContext, FeedbackEntry, Suppression};
use crate::scoring::FeedbackSignals;
use crate::storage::SqliteStore;
use crate::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

/// False-positive rate at which an entity stops being suggested.
pub const SUPPRESSION_THRESHOLD: f64 = 0.30;

/// Minimum feedback rows before global suppression may trigger.
pub const GLOBAL_SUPPRESSION_MIN_SAMPLES: u64 = 10;

/// Lower sample floor for on-demand folder-scoped suppression.
pub const FOLDER_SUPPRESSION_MIN_SAMPLES: u64 = 5;

/// Outcome of one suppression recompute pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuppressionChanges {
    /// Rows created or refreshed.
    pub upserted: usize,
    /// Rows deleted because the rate recovered.
    pub removed: usize,
}

/// Records feedback and maintains the learned aggregates.
pub struct FeedbackService {
    store: Arc<SqliteStore>,
}

impl FeedbackService {
    /// Creates the service over a store.
    #[must_use]
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    /// Records one explicit or caller-tagged feedback entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty entity name; store
    /// failures propagate (a failed write must be visible).
    #[instrument(skip(self), fields(entity = %entity))]
    pub fn record(
        &self,
        entity: &str,
        context: FeedbackContext,
        note_path: &str,
        correct: bool,
        now: i64,
    ) -> Result<FeedbackEntry> {
        if entity.trim().is_empty() {
            return Err(Error::InvalidInput("feedback entity is empty".to_string()));
        }
        let entry = FeedbackEntry {
            id: uuid::Uuid::new_v4().to_string(),
            entity: entity.to_string(),
            context,
            note_path: note_path.to_string(),
            correct,
            created_at: now,
        };
        self.store.record_feedback(&entry)?;
        Ok(entry)
    }

    /// Loads the scoring signals for one suggestion call: global aggregates
    /// plus folder-local ones when a note folder is known.
    pub fn signals_for(&self, folder: Option<&str>) -> Result<FeedbackSignals> {
        let global = self.store.feedback_stats()?;
        let local = match folder {
            Some(f) => self.store.folder_feedback_stats(f)?,
            None => std::collections::HashMap::new(),
        };
        Ok(FeedbackSignals::new(global, local))
    }

    /// Recomputes global suppressions from scratch.
    ///
    /// Every entity with enough samples and a false-positive rate at or
    /// above the threshold gets a row; entities whose rate recovered get
    /// their row deleted. The whole pass applies as one transaction.
    /// Zero feedback rows is a no-op, never an error.
    #[instrument(skip(self))]
    pub fn recompute_suppressions(&self, now: i64) -> Result<SuppressionChanges> {
        let stats = self.store.feedback_stats()?;
        let existing: HashSet<String> = self.store.suppressed_set()?;

        let mut upserts = Vec::new();
        let mut deletes = Vec::new();
        for (entity, s) in &stats {
            let rate = s.false_positive_rate();
            if s.total >= GLOBAL_SUPPRESSION_MIN_SAMPLES && rate >= SUPPRESSION_THRESHOLD {
                upserts.push(Suppression {
                    entity: entity.clone(),
                    false_positive_rate: rate,
                    updated_at: now,
                });
            } else if existing.contains(entity) {
                deletes.push(entity.clone());
            }
        }

        let changes = SuppressionChanges {
            upserted: upserts.len(),
            removed: deletes.len(),
        };
        self.store.apply_suppression_changes(&upserts, &deletes)?;
        metrics::counter!("suppression_recompute_total").increment(1);
        tracing::debug!(
            upserted = changes.upserted,
            removed = changes.removed,
            "suppression recompute applied"
        );
        Ok(changes)
    }

    /// Lowercase names of globally suppressed entities.
    pub fn suppressed_set(&self) -> Result<HashSet<String>> {
        self.store.suppressed_set()
    }

    /// Folder-scoped suppression, recomputed on demand and never persisted.
    ///
    /// Uses the same rate threshold but a lower sample floor: an entity
    /// suppressed only in folder X remains suggestible elsewhere.
    pub fn folder_suppressed_set(&self, folder: &str) -> Result<HashSet<String>> {
        let stats = self.store.folder_feedback_stats(folder)?;
        Ok(stats
            .into_iter()
            .filter(|(_, s)| {
                s.total >= FOLDER_SUPPRESSION_MIN_SAMPLES
                    && s.false_positive_rate() >= SUPPRESSION_THRESHOLD
            })
            .map(|(entity, _)| entity)
            .collect())
    }

    /// The suppression set in force for one note.
    ///
    /// Folder-local evidence supersedes global standing in both directions
    /// when the folder alone has enough samples: a globally suppressed
    /// entity with a clean local record becomes suggestible there, and a
    /// globally clean entity with a noisy local record is held back.
    pub fn effective_suppressed_set(&self, folder: Option<&str>) -> Result<HashSet<String>> {
        let mut suppressed = self.store.suppressed_set()?;
        let Some(folder) = folder else {
            return Ok(suppressed);
        };
        for (entity, stats) in self.store.folder_feedback_stats(folder)? {
            if stats.total < FOLDER_SUPPRESSION_MIN_SAMPLES {
                continue;
            }
            if stats.false_positive_rate() >= SUPPRESSION_THRESHOLD {
                suppressed.insert(entity);
            } else {
                suppressed.remove(&entity);
            }
        }
        Ok(suppressed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn service() -> FeedbackService {
        FeedbackService::new(Arc::new(SqliteStore::in_memory().unwrap()))
    }

    fn record_n(svc: &FeedbackService, entity: &str, note: &str, correct: bool, n: usize) {
        for i in 0..n {
            svc.record(entity, FeedbackContext::Explicit, note, correct, 1000 + i as i64)
                .unwrap();
        }
    }

    #[test]
    fn test_record_rejects_empty_entity() {
        let svc = service();
        let err = svc
            .record("  ", FeedbackContext::Explicit, "a.md", true, 0)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_suppression_boundary_at_ten_samples() {
        let svc = service();
        // 9 rows, all incorrect: below the sample floor, not suppressed
        record_n(&svc, "Atlas", "daily/a.md", false, 9);
        svc.recompute_suppressions(2000).unwrap();
        assert!(svc.suppressed_set().unwrap().is_empty());

        // the 10th row crosses the floor with a 100% rate
        record_n(&svc, "Atlas", "daily/a.md", false, 1);
        svc.recompute_suppressions(2001).unwrap();
        assert!(svc.suppressed_set().unwrap().contains("atlas"));
    }

    #[test]
    fn test_suppression_recovers_below_threshold() {
        let svc = service();
        record_n(&svc, "Atlas", "daily/a.md", false, 3);
        record_n(&svc, "Atlas", "daily/a.md", true, 7);
        // 3/10 incorrect = exactly 30%: suppressed
        svc.recompute_suppressions(2000).unwrap();
        assert!(svc.suppressed_set().unwrap().contains("atlas"));

        // more correct feedback drops the rate under 30%
        record_n(&svc, "Atlas", "daily/a.md", true, 5);
        let changes = svc.recompute_suppressions(2001).unwrap();
        assert_eq!(changes.removed, 1);
        assert!(svc.suppressed_set().unwrap().is_empty());
    }

    #[test]
    fn test_folder_scoped_suppression_is_local() {
        let svc = service();
        // noisy in daily/ (5 samples, 100% wrong), clean in tech/
        record_n(&svc, "Atlas", "daily/a.md", false, 5);
        record_n(&svc, "Atlas", "tech/b.md", true, 5);

        let daily = svc.folder_suppressed_set("daily").unwrap();
        assert!(daily.contains("atlas"));

        let tech = svc.folder_suppressed_set("tech").unwrap();
        assert!(tech.is_empty());

        // globally: 5/10 incorrect = 50% over 10 samples, suppressed
        svc.recompute_suppressions(2000).unwrap();
        assert!(svc.suppressed_set().unwrap().contains("atlas"));
    }

    #[test]
    fn test_effective_set_lets_folder_evidence_override_global() {
        let svc = service();
        // globally noisy: 10 wrong in daily/, but locally clean in tech/
        record_n(&svc, "Atlas", "daily/a.md", false, 10);
        record_n(&svc, "Atlas", "tech/b.md", true, 5);
        svc.recompute_suppressions(3000).unwrap();
        assert!(svc.suppressed_set().unwrap().contains("atlas"));

        // clean local record with enough samples clears the global block
        let tech = svc.effective_suppressed_set(Some("tech")).unwrap();
        assert!(!tech.contains("atlas"));

        // elsewhere the global block stands
        let other = svc.effective_suppressed_set(Some("projects")).unwrap();
        assert!(other.contains("atlas"));
        assert!(svc.effective_suppressed_set(None).unwrap().contains("atlas"));

        // the reverse direction: globally clean, locally noisy
        record_n(&svc, "Mercury", "daily/c.md", false, 5);
        let daily = svc.effective_suppressed_set(Some("daily")).unwrap();
        assert!(daily.contains("mercury"));
        assert!(!svc.suppressed_set().unwrap().contains("mercury"));
    }

    #[test]
    fn test_recompute_on_empty_store_is_noop() {
        let svc = service();
        let changes = svc.recompute_suppressions(1000).unwrap();
        assert_eq!(changes.upserted, 0);
        assert_eq!(changes.removed, 0);
    }
}
