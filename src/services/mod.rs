//! Business logic services.
//!
//! Services orchestrate the store and snapshots behind the engine facade:
//! the suggestion pipeline, the feedback aggregator/suppression engine,
//! application tracking, and journey reconstruction.

mod applications;
mod feedback;
mod journey;
mod suggest;

pub use applications::ApplicationService;
pub use feedback::{FeedbackService, SuppressionChanges};
pub use journey::JourneyService;
pub use suggest::{SuggestOptions, SuggestionService};
