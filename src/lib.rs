//! # Notelink
//!
//! An adaptive wikilink suggestion engine for markdown note vaults.
//!
//! Notelink scans note content against a catalog of known entities (people,
//! projects, technologies, concepts) and proposes `[[wikilinks]]` for the
//! ones the note actually talks about. Every suggestion is scored by a
//! multi-layer scorer over lexical, structural, temporal, and learned
//! signals, and the engine improves its own precision over time by watching
//! which suggestions get kept and which get removed.
//!
//! The closed loop has five stages:
//!
//! 1. **Discover** - an external catalog builder supplies the entities
//! 2. **Suggest** - [`SuggestionEngine::suggest`] ranks and caps candidates
//! 3. **Apply** - the caller inserts some links and reports them back
//! 4. **Learn** - explicit feedback plus removals detected on later edits
//! 5. **Adapt** - per-entity trust boosts and suppression feed the next call
//!
//! ## Example
//!
//! ```rust,ignore
//! use notelink::{SuggestionEngine, SuggestOptions};
//!
//! let engine = SuggestionEngine::open(config)?;
//! let result = engine.suggest(
//!     "Met with Jordan Smith to discuss the TypeScript rollout",
//!     &SuggestOptions::default(),
//! )?;
//! println!("{}", result.suffix); // → [[Jordan Smith]], [[TypeScript]]
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod catalog;
pub mod config;
pub mod engine;
pub mod index;
pub mod models;
pub mod scoring;
pub mod semantic;
pub mod services;
pub mod storage;
pub mod text;

// Re-exports for convenience
pub use catalog::{CatalogHandle, CatalogProvider, CatalogSnapshot, JsonCatalog};
pub use config::{EngineConfig, Strictness, StrictnessConfig};
pub use engine::{SuggestOptions, SuggestionEngine};
pub use index::{CooccurrenceIndex, RecencyIndex};
pub use models::{
    AccuracyStats, Application, ApplicationStatus, Entity, EntityCategory, FeedbackContext,
    FeedbackEntry, Journey, ScoreBreakdown, Suggestion, SuggestionEvent, Suppression,
};
pub use semantic::SemanticProvider;
pub use storage::SqliteStore;

/// Error type for notelink operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A feedback entity name is empty
    /// - A full-text query uses malformed match syntax
    /// - A catalog or index file cannot be parsed at all
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` operations fail
    /// - Filesystem I/O errors occur
    /// - The semantic provider fails outside the degradable suggest path
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Shorthand for an [`Error::OperationFailed`] with a displayable cause.
    pub fn operation(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for notelink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Centralized so scoring code never reads the wall clock directly; callers
/// capture a timestamp once and pass it through explicitly.
#[must_use]
pub fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("bad query".to_string());
        assert_eq!(err.to_string(), "invalid input: bad query");

        let err = Error::OperationFailed {
            operation: "record_feedback".to_string(),
            cause: "disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "operation 'record_feedback' failed: disk full"
        );
    }

    #[test]
    fn test_current_timestamp_is_positive() {
        assert!(current_timestamp() > 0);
    }
}
