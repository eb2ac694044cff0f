//! Application tracking and implicit feedback detection.
//!
//! When the caller inserts suggested links, it reports them here. On later
//! edits, [`ApplicationService::detect_removals`] compares the tracked
//! links against the current content; a link that disappeared becomes one
//! implicit negative feedback entry. This is the sole source of implicit
//! signal; explicit feedback goes through the feedback service directly.

use crate::models::{FeedbackContext, FeedbackEntry};
use crate::storage::SqliteStore;
use crate::text;
use crate::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

/// Tracks which suggestions were actually inserted into notes.
pub struct ApplicationService {
    store: Arc<SqliteStore>,
}

impl ApplicationService {
    /// Creates the service over a store.
    #[must_use]
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    /// Marks entities as applied for a note. One atomic upsert batch;
    /// re-inserting a previously removed link flips it back to applied.
    #[instrument(skip(self, entities), fields(note = %note_path, count = entities.len()))]
    pub fn track(&self, note_path: &str, entities: &[String], now: i64) -> Result<()> {
        if entities.is_empty() {
            return Ok(());
        }
        self.store.upsert_applications(note_path, entities, now)
    }

    /// Detects applied links missing from the current content and converts
    /// each into implicit negative feedback.
    ///
    /// Only rows still in `applied` state are considered, so a second call
    /// on unchanged content emits nothing: the first call already flipped
    /// the rows to `removed`.
    #[instrument(skip(self, current_content), fields(note = %note_path))]
    pub fn detect_removals(
        &self,
        note_path: &str,
        current_content: &str,
        now: i64,
    ) -> Result<Vec<String>> {
        let applied = self.store.applied_for_note(note_path)?;
        if applied.is_empty() {
            return Ok(Vec::new());
        }

        let present: HashSet<String> = text::extract_wikilinks(current_content)
            .into_iter()
            .map(|s| s.to_lowercase())
            .collect();

        let mut removed = Vec::new();
        let mut entries = Vec::new();
        for app in applied {
            if present.contains(&app.entity.to_lowercase()) {
                continue;
            }
            entries.push(FeedbackEntry {
                id: uuid::Uuid::new_v4().to_string(),
                entity: app.entity.clone(),
                context: FeedbackContext::ImplicitRemoved,
                note_path: note_path.to_string(),
                correct: false,
                created_at: now,
            });
            removed.push(app.entity);
        }

        if !entries.is_empty() {
            self.store.record_removals(note_path, &entries, now)?;
            tracing::debug!(removed = removed.len(), "implicit removals detected");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::models::ApplicationStatus;

    fn service() -> (ApplicationService, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        (ApplicationService::new(Arc::clone(&store)), store)
    }

    #[test]
    fn test_implicit_feedback_round_trip() {
        let (svc, store) = service();
        svc.track("daily/a.md", &["Atlas".to_string()], 100).unwrap();

        // the link is gone from the edited content
        let removed = svc
            .detect_removals("daily/a.md", "note content without links", 200)
            .unwrap();
        assert_eq!(removed, vec!["Atlas"]);

        let feedback = store.entity_feedback("Atlas", 0).unwrap();
        assert_eq!(feedback.len(), 1);
        assert!(!feedback[0].correct);
        assert_eq!(feedback[0].context, FeedbackContext::ImplicitRemoved);

        // second call on unchanged content: no duplicate negatives
        let removed = svc
            .detect_removals("daily/a.md", "note content without links", 300)
            .unwrap();
        assert!(removed.is_empty());
        assert_eq!(store.entity_feedback("Atlas", 0).unwrap().len(), 1);
    }

    #[test]
    fn test_present_links_are_kept() {
        let (svc, store) = service();
        svc.track(
            "daily/a.md",
            &["Atlas".to_string(), "Jordan Smith".to_string()],
            100,
        )
        .unwrap();

        let removed = svc
            .detect_removals("daily/a.md", "kept [[Atlas]] but dropped the other", 200)
            .unwrap();
        assert_eq!(removed, vec!["Jordan Smith"]);

        let apps = store.applications_for_entity("Atlas").unwrap();
        assert_eq!(apps[0].status, ApplicationStatus::Applied);
    }

    #[test]
    fn test_piped_wikilinks_count_as_present() {
        let (svc, _store) = service();
        svc.track("daily/a.md", &["Jordan Smith".to_string()], 100)
            .unwrap();

        let removed = svc
            .detect_removals("daily/a.md", "met [[Jordan Smith|Jordan]] today", 200)
            .unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn test_untracked_note_yields_nothing() {
        let (svc, _store) = service();
        let removed = svc.detect_removals("unknown.md", "anything", 100).unwrap();
        assert!(removed.is_empty());
    }
}
