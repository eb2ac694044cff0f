//! Read-only views: entity journeys and the dashboard.

use super::{AccuracyStats, Application, EntityCategory, FeedbackEntry, ScoreBreakdown};
use serde::{Deserialize, Serialize};

/// Catalog metadata for the Discover stage of a journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogInfo {
    /// Canonical name.
    pub name: String,
    /// Entity category.
    pub category: EntityCategory,
    /// Known aliases.
    pub aliases: Vec<String>,
    /// Source note path.
    pub source_path: String,
    /// Backlink count.
    pub hub_score: u64,
}

/// One suggestion event as seen in a journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestEventView {
    /// Note the suggestion call was for.
    pub note_path: String,
    /// Unix timestamp of the call.
    pub timestamp: i64,
    /// Total score achieved.
    pub total_score: f64,
    /// Threshold in force.
    pub threshold: f64,
    /// Whether the candidate was surfaced.
    pub passed: bool,
    /// Largest-magnitude nonzero layer, when the breakdown was readable.
    pub top_layer: Option<String>,
    /// Full breakdown, when readable.
    pub breakdown: Option<ScoreBreakdown>,
}

/// Learn stage: recent feedback plus derived accuracy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearnView {
    /// Feedback entries inside the lookback window, newest first.
    pub entries: Vec<FeedbackEntry>,
    /// All-time aggregate for the entity.
    pub stats: AccuracyStats,
}

/// Adapt stage: where the learning loop currently places the entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptView {
    /// Current feedback adjustment applied during scoring.
    pub boost: f64,
    /// Human-readable tier name (e.g. "trusted", "probation").
    pub tier: String,
    /// Whether the entity is globally suppressed.
    pub suppressed: bool,
    /// Human-readable explanation of the current standing.
    pub reason: String,
}

/// Full Discover → Suggest → Apply → Learn → Adapt reconstruction for one
/// entity. Purely derived; assembling it writes nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journey {
    /// Canonical entity name the journey was requested for.
    pub entity: String,
    /// Lookback window in days.
    pub days_back: u32,
    /// Catalog metadata; `None` when the entity is unknown to the catalog.
    pub discover: Option<CatalogInfo>,
    /// Recent suggestion events, newest first.
    pub suggest: Vec<SuggestEventView>,
    /// Current and past applications.
    pub apply: Vec<Application>,
    /// Recent feedback with derived accuracy.
    pub learn: LearnView,
    /// Current boost tier and suppression standing.
    pub adapt: AdaptView,
}

/// Entity count per boost tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierCount {
    /// Tier name.
    pub tier: String,
    /// Number of entities currently in the tier.
    pub count: u64,
}

/// One day of feedback activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Day in `YYYY-MM-DD` form.
    pub day: String,
    /// Feedback rows recorded that day.
    pub total: u64,
    /// Of those, rows marked correct.
    pub correct: u64,
}

/// Aggregate statistics across the whole feedback loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dashboard {
    /// Total feedback rows.
    pub total_feedback: u64,
    /// Feedback rows marked correct.
    pub total_correct: u64,
    /// Overall accuracy across all feedback.
    pub overall_accuracy: f64,
    /// Distinct entities with any feedback.
    pub tracked_entities: u64,
    /// Entities currently suppressed.
    pub suppressed_entities: u64,
    /// Applications currently in `applied` state.
    pub applications_active: u64,
    /// Applications that transitioned to `removed`.
    pub applications_removed: u64,
    /// Entity counts per boost tier.
    pub tiers: Vec<TierCount>,
    /// Recent daily activity, newest first.
    pub timeline: Vec<TimelineEntry>,
}
