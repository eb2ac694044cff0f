//! Data models for notelink.
//!
//! This module contains the core data structures shared across the engine:
//! catalog entities, score breakdowns, feedback records, and the read-only
//! journey/dashboard views.

mod entity;
mod feedback;
mod journey;
mod score;

pub use entity::{Entity, EntityCategory};
pub use feedback::{
    AccuracyStats, Application, ApplicationStatus, FeedbackContext, FeedbackEntry, Suppression,
};
pub use journey::{
    AdaptView, CatalogInfo, Dashboard, Journey, LearnView, SuggestEventView, TierCount,
    TimelineEntry,
};
pub use score::{ScoreBreakdown, Suggestion, SuggestionDetail, SuggestionEvent};
