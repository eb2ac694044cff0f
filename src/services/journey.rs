//! Journey reconstruction and the dashboard.
//!
//! Read-only aggregation across the catalog, the audit events, the
//! application tracker, and the feedback aggregates. Assembling a journey
//! writes nothing.

use crate::catalog::CatalogSnapshot;
use crate::models::{
    AdaptView, CatalogInfo, Dashboard, Journey, LearnView, SuggestEventView, TierCount,
};
use crate::scoring::{feedback_boost, tier_name};
use crate::storage::SqliteStore;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Days of activity shown on the dashboard timeline.
const TIMELINE_DAYS: u32 = 30;

/// Reconstructs per-entity histories and aggregate statistics.
pub struct JourneyService {
    store: Arc<SqliteStore>,
}

impl JourneyService {
    /// Creates the service over a store.
    #[must_use]
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    /// Assembles the Discover → Suggest → Apply → Learn → Adapt history of
    /// one entity over a lookback window.
    #[instrument(skip(self, snapshot), fields(entity = %entity))]
    pub fn journey(
        &self,
        entity: &str,
        days_back: u32,
        snapshot: &CatalogSnapshot,
        now: i64,
    ) -> Result<Journey> {
        let since = now - i64::from(days_back) * 86_400;
        let lower = entity.to_lowercase();

        let discover = snapshot.get(&lower).map(|e| CatalogInfo {
            name: e.name.clone(),
            category: e.category,
            aliases: e.aliases.clone(),
            source_path: e.source_path.clone(),
            hub_score: e.hub_score,
        });

        let suggest = self
            .store
            .events_for_entity(entity, since)?
            .into_iter()
            .map(|ev| SuggestEventView {
                note_path: ev.note_path,
                timestamp: ev.timestamp,
                total_score: ev.total_score,
                threshold: ev.threshold,
                passed: ev.passed,
                top_layer: ev
                    .breakdown
                    .as_ref()
                    .and_then(|b| b.top_layer())
                    .map(|(name, _)| name.to_string()),
                breakdown: ev.breakdown,
            })
            .collect();

        let apply = self.store.applications_for_entity(entity)?;

        let stats = self.store.entity_stats(entity)?;
        let learn = LearnView {
            entries: self.store.entity_feedback(entity, since)?,
            stats,
        };

        let boost = feedback_boost(stats);
        let tier = tier_name(stats);
        let suppression = self.store.is_suppressed(entity)?;
        let reason = match &suppression {
            Some(s) => format!(
                "suppressed: {:.0}% false-positive rate over {} samples",
                s.false_positive_rate * 100.0,
                stats.total
            ),
            None if stats.total == 0 => "no feedback recorded yet".to_string(),
            None => format!(
                "{tier}: {:.0}% accuracy over {} samples (boost {boost:+.0})",
                stats.accuracy() * 100.0,
                stats.total
            ),
        };

        Ok(Journey {
            entity: entity.to_string(),
            days_back,
            discover,
            suggest,
            apply,
            learn,
            adapt: AdaptView {
                boost,
                tier: tier.to_string(),
                suppressed: suppression.is_some(),
                reason,
            },
        })
    }

    /// Aggregate statistics across the whole feedback loop.
    #[instrument(skip(self))]
    pub fn dashboard(&self, now: i64) -> Result<Dashboard> {
        let (total_feedback, total_correct, tracked_entities) = self.store.feedback_totals()?;
        let (applications_active, applications_removed) = self.store.application_totals()?;
        let suppressed_entities = self.store.suppressions()?.len() as u64;

        let mut tier_counts: HashMap<&'static str, u64> = HashMap::new();
        for stats in self.store.feedback_stats()?.values() {
            *tier_counts.entry(tier_name(*stats)).or_default() += 1;
        }
        let mut tiers: Vec<TierCount> = tier_counts
            .into_iter()
            .map(|(tier, count)| TierCount {
                tier: tier.to_string(),
                count,
            })
            .collect();
        tiers.sort_by(|a, b| a.tier.cmp(&b.tier));

        #[allow(clippy::cast_precision_loss)]
        let overall_accuracy = if total_feedback == 0 {
            0.0
        } else {
            total_correct as f64 / total_feedback as f64
        };

        Ok(Dashboard {
            total_feedback,
            total_correct,
            overall_accuracy,
            tracked_entities,
            suppressed_entities,
            applications_active,
            applications_removed,
            tiers,
            timeline: self.store.feedback_timeline(TIMELINE_DAYS, now)?,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::models::{Entity, EntityCategory, FeedbackContext, FeedbackEntry, SuggestionEvent};
    use crate::models::ScoreBreakdown;

    fn seed(store: &SqliteStore) {
        for i in 0..6 {
            store
                .record_feedback(&FeedbackEntry {
                    id: uuid::Uuid::new_v4().to_string(),
                    entity: "Atlas".to_string(),
                    context: FeedbackContext::Explicit,
                    note_path: "daily/a.md".to_string(),
                    correct: i < 5,
                    created_at: 1000 + i,
                })
                .unwrap();
        }
        store
            .record_suggestion_events(&[SuggestionEvent {
                entity: "Atlas".to_string(),
                note_path: "daily/a.md".to_string(),
                timestamp: 1500,
                total_score: 18.0,
                breakdown: Some(ScoreBreakdown {
                    content_match: 15.0,
                    type_boost: 3.0,
                    ..ScoreBreakdown::default()
                }),
                threshold: 15.0,
                passed: true,
            }])
            .unwrap();
        store
            .upsert_applications("daily/a.md", &["Atlas".to_string()], 1600)
            .unwrap();
    }

    #[test]
    fn test_journey_assembles_all_stages() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        seed(&store);
        let svc = JourneyService::new(Arc::clone(&store));
        let snapshot = CatalogSnapshot::new(
            vec![Entity::new("Atlas", EntityCategory::Projects)],
            0,
        );

        let journey = svc.journey("atlas", 30, &snapshot, 2000).unwrap();
        assert_eq!(journey.discover.unwrap().name, "Atlas");
        assert_eq!(journey.suggest.len(), 1);
        assert_eq!(journey.suggest[0].top_layer.as_deref(), Some("content_match"));
        assert_eq!(journey.apply.len(), 1);
        assert_eq!(journey.learn.stats.total, 6);
        // 5/6 correct ≈ 0.83 with 6 samples: the +2 tier
        assert_eq!(journey.adapt.boost, 2.0);
        assert_eq!(journey.adapt.tier, "reliable");
        assert!(!journey.adapt.suppressed);
    }

    #[test]
    fn test_journey_for_unknown_entity_is_empty_but_valid() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let svc = JourneyService::new(store);
        let snapshot = CatalogSnapshot::new(Vec::new(), 0);

        let journey = svc.journey("Ghost", 7, &snapshot, 2000).unwrap();
        assert!(journey.discover.is_none());
        assert!(journey.suggest.is_empty());
        assert!(journey.apply.is_empty());
        assert_eq!(journey.learn.stats.total, 0);
        assert_eq!(journey.adapt.tier, "unproven");
        assert_eq!(journey.adapt.reason, "no feedback recorded yet");
    }

    #[test]
    fn test_dashboard_counts() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        seed(&store);
        let svc = JourneyService::new(Arc::clone(&store));

        let dash = svc.dashboard(2000).unwrap();
        assert_eq!(dash.total_feedback, 6);
        assert_eq!(dash.total_correct, 5);
        assert_eq!(dash.tracked_entities, 1);
        assert_eq!(dash.applications_active, 1);
        assert_eq!(dash.applications_removed, 0);
        assert_eq!(dash.tiers.len(), 1);
        assert_eq!(dash.tiers[0].tier, "reliable");
    }
}
