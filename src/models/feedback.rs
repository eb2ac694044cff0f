//! Feedback, application tracking, and suppression records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin tag of a feedback entry.
///
/// Stored as a plain string column; unknown tags round-trip unchanged so
/// future callers can introduce their own without a schema change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackContext {
    /// An explicit correct/incorrect judgment from the user or caller.
    Explicit,
    /// Synthesized negative signal: a previously applied link was removed.
    ImplicitRemoved,
    /// Any other caller-supplied tag.
    Other(String),
}

impl FeedbackContext {
    /// Parses the stored string form.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "explicit" => Self::Explicit,
            "implicit:removed" => Self::ImplicitRemoved,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the stored string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Explicit => "explicit",
            Self::ImplicitRemoved => "implicit:removed",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for FeedbackContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only feedback observation, the unit of truth for learning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// Unique id (UUID v4).
    pub id: String,
    /// Canonical entity name the feedback is about.
    pub entity: String,
    /// How this observation was produced.
    pub context: FeedbackContext,
    /// Note the suggestion was made for.
    pub note_path: String,
    /// Whether the suggestion was a good one.
    pub correct: bool,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

/// Lifecycle state of an applied suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// The wikilink is (believed to be) present in the note.
    Applied,
    /// A later edit removed the wikilink.
    Removed,
}

impl ApplicationStatus {
    /// Parses the stored string form, defaulting to `Removed` for unknown
    /// values so a corrupt row can never resurrect a link.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "applied" => Self::Applied,
            _ => Self::Removed,
        }
    }

    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Removed => "removed",
        }
    }
}

/// Tracks one (entity, note) pair through apply/remove transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    /// Canonical entity name.
    pub entity: String,
    /// Note the link was inserted into.
    pub note_path: String,
    /// Current lifecycle state.
    pub status: ApplicationStatus,
    /// Unix timestamp of the last transition.
    pub applied_at: i64,
}

/// A learned decision to stop suggesting an entity globally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suppression {
    /// Canonical entity name.
    pub entity: String,
    /// Fraction of feedback rows marked incorrect at last recompute.
    pub false_positive_rate: f64,
    /// Unix timestamp of the last recompute that touched this row.
    pub updated_at: i64,
}

/// Aggregated feedback counts for one entity (globally or folder-scoped).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracyStats {
    /// Rows marked correct.
    pub correct: u64,
    /// Total rows.
    pub total: u64,
}

impl AccuracyStats {
    /// Rows marked incorrect.
    #[must_use]
    pub const fn incorrect(self) -> u64 {
        self.total - self.correct
    }

    /// Fraction correct; 0.0 with no samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    /// Fraction incorrect; 0.0 with no samples.
    #[must_use]
    pub fn false_positive_rate(self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            1.0 - self.accuracy()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_round_trip() {
        assert_eq!(
            FeedbackContext::parse("explicit"),
            FeedbackContext::Explicit
        );
        assert_eq!(
            FeedbackContext::parse("implicit:removed"),
            FeedbackContext::ImplicitRemoved
        );
        let other = FeedbackContext::parse("migration:v2");
        assert_eq!(other.as_str(), "migration:v2");
    }

    #[test]
    fn test_status_parse_defaults_to_removed() {
        assert_eq!(ApplicationStatus::parse("applied"), ApplicationStatus::Applied);
        assert_eq!(ApplicationStatus::parse("???"), ApplicationStatus::Removed);
    }

    #[test]
    fn test_accuracy_stats() {
        let stats = AccuracyStats { correct: 7, total: 10 };
        assert!((stats.accuracy() - 0.7).abs() < f64::EPSILON);
        assert!((stats.false_positive_rate() - 0.3).abs() < f64::EPSILON);
        assert_eq!(stats.incorrect(), 3);

        let empty = AccuracyStats::default();
        assert_eq!(empty.accuracy(), 0.0);
        assert_eq!(empty.false_positive_rate(), 0.0);
    }
}
