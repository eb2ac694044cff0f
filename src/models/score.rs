//! Score breakdowns, suggestion results, and audit events.

use serde::{Deserialize, Serialize};

/// Per-layer decomposition of one candidate's score.
///
/// The total score is always the sum of the fields; every layer is
/// deterministic given (content, entity, current aggregates, now).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreBreakdown {
    /// Lexical match of the entity's name/aliases against content tokens.
    pub content_match: f64,
    /// Association strength with directly-matched entities.
    pub cooccurrence_boost: f64,
    /// Fixed per-category constant.
    pub type_boost: f64,
    /// Note-path context bonus (daily/project/tech).
    pub context_boost: f64,
    /// Bonus for recently-mentioned entities.
    pub recency_boost: f64,
    /// Bonus for links that span top-level folders.
    pub cross_folder_boost: f64,
    /// Tiered bonus from the entity's backlink count.
    pub hub_boost: f64,
    /// Learned per-entity trust adjustment (may be negative).
    pub feedback_adjustment: f64,
    /// Embedding-similarity bonus, when a provider is available.
    pub semantic_boost: f64,
}

impl ScoreBreakdown {
    /// Sum of all layers.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.content_match
            + self.cooccurrence_boost
            + self.type_boost
            + self.context_boost
            + self.recency_boost
            + self.cross_folder_boost
            + self.hub_boost
            + self.feedback_adjustment
            + self.semantic_boost
    }

    /// Whether any layer tied to actual content relevance is nonzero.
    ///
    /// Type/context/recency/hub/feedback alone never justify a suggestion;
    /// an entity must earn content, co-occurrence, or semantic evidence.
    #[must_use]
    pub fn content_relevant(&self) -> bool {
        self.content_match > 0.0 || self.cooccurrence_boost > 0.0 || self.semantic_boost > 0.0
    }

    /// Name and value of the largest-magnitude nonzero layer, if any.
    #[must_use]
    pub fn top_layer(&self) -> Option<(&'static str, f64)> {
        let layers = [
            ("content_match", self.content_match),
            ("cooccurrence_boost", self.cooccurrence_boost),
            ("type_boost", self.type_boost),
            ("context_boost", self.context_boost),
            ("recency_boost", self.recency_boost),
            ("cross_folder_boost", self.cross_folder_boost),
            ("hub_boost", self.hub_boost),
            ("feedback_adjustment", self.feedback_adjustment),
            ("semantic_boost", self.semantic_boost),
        ];
        layers
            .into_iter()
            .filter(|(_, v)| *v != 0.0)
            .max_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap_or(std::cmp::Ordering::Equal))
    }
}

/// Result of one suggestion call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Suggestion {
    /// Canonical entity names, ranked best-first.
    pub suggestions: Vec<String>,
    /// Ready-to-append suffix, e.g. `→ [[Jordan Smith]], [[TypeScript]]`.
    pub suffix: String,
    /// Per-candidate detail, present when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed: Option<Vec<SuggestionDetail>>,
}

/// Detailed view of one returned suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionDetail {
    /// Canonical entity name.
    pub name: String,
    /// Total score.
    pub total: f64,
    /// Per-layer breakdown.
    pub breakdown: ScoreBreakdown,
}

/// Append-only audit record, one per scored candidate per suggestion call.
///
/// Written by the suggestion pipeline, read only by the journey
/// reconstructor. Candidates that failed the threshold are recorded too;
/// that is what makes "why was this never suggested" answerable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionEvent {
    /// Canonical entity name.
    pub entity: String,
    /// Note the suggestion call was for (empty when none was given).
    pub note_path: String,
    /// Unix timestamp of the call.
    pub timestamp: i64,
    /// Total score the candidate achieved.
    pub total_score: f64,
    /// Per-layer breakdown; `None` when the stored JSON was unreadable.
    pub breakdown: Option<ScoreBreakdown>,
    /// Adaptive minimum score in force for the call.
    pub threshold: f64,
    /// Whether the candidate made the final suggestion list.
    pub passed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_sum_of_layers() {
        let b = ScoreBreakdown {
            content_match: 10.0,
            type_boost: 5.0,
            feedback_adjustment: -2.0,
            ..ScoreBreakdown::default()
        };
        assert!((b.total() - 13.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_content_relevance_ignores_popularity_layers() {
        let popular = ScoreBreakdown {
            type_boost: 5.0,
            hub_boost: 8.0,
            recency_boost: 5.0,
            ..ScoreBreakdown::default()
        };
        assert!(!popular.content_relevant());

        let relevant = ScoreBreakdown {
            cooccurrence_boost: 1.0,
            ..ScoreBreakdown::default()
        };
        assert!(relevant.content_relevant());
    }

    #[test]
    fn test_top_layer_picks_largest_magnitude() {
        let b = ScoreBreakdown {
            content_match: 10.0,
            feedback_adjustment: -4.0,
            type_boost: 5.0,
            ..ScoreBreakdown::default()
        };
        assert_eq!(b.top_layer(), Some(("content_match", 10.0)));

        let negative = ScoreBreakdown {
            feedback_adjustment: -4.0,
            type_boost: 3.0,
            ..ScoreBreakdown::default()
        };
        assert_eq!(negative.top_layer(), Some(("feedback_adjustment", -4.0)));

        assert_eq!(ScoreBreakdown::default().top_layer(), None);
    }
}
