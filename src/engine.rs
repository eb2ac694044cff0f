//! The engine facade: one context object owning every snapshot and store.
//!
//! All state the pipeline touches lives here as explicit fields; there are
//! no process-wide globals. Construct once, pass by reference into every
//! call.

use crate::catalog::{CatalogHandle, CatalogProvider, JsonCatalog};
use crate::config::EngineConfig;
use crate::index::{CooccurrenceIndex, RecencyIndex};
use crate::models::{Dashboard, FeedbackContext, FeedbackEntry, Journey, Suggestion};
use crate::semantic::SemanticProvider;
use crate::services::{
    ApplicationService, FeedbackService, JourneyService, SuggestionService, SuppressionChanges,
};
use crate::storage::SqliteStore;
use crate::Result;
use std::sync::Arc;

pub use crate::services::SuggestOptions;

/// Owns the catalog handle, the offline indexes, the feedback store, and
/// the optional semantic provider, and exposes the five-stage loop's
/// operations.
pub struct SuggestionEngine {
    suggester: SuggestionService,
    feedback: FeedbackService,
    applications: ApplicationService,
    journeys: JourneyService,
    catalog: Arc<CatalogHandle>,
    store: Arc<SqliteStore>,
}

impl SuggestionEngine {
    /// Builds an engine from explicit parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial catalog load fails.
    pub fn new(
        provider: Box<dyn CatalogProvider>,
        cooccurrence: CooccurrenceIndex,
        recency: RecencyIndex,
        store: SqliteStore,
        semantic: Option<Arc<dyn SemanticProvider>>,
        config: EngineConfig,
        now: i64,
    ) -> Result<Self> {
        let catalog = Arc::new(CatalogHandle::new(provider, now)?);
        let cooccurrence = Arc::new(cooccurrence);
        let recency = Arc::new(recency);
        let store = Arc::new(store);

        Ok(Self {
            suggester: SuggestionService::new(
                Arc::clone(&catalog),
                cooccurrence,
                Arc::clone(&recency),
                Arc::clone(&store),
                semantic,
                config,
            ),
            feedback: FeedbackService::new(Arc::clone(&store)),
            applications: ApplicationService::new(Arc::clone(&store)),
            journeys: JourneyService::new(Arc::clone(&store)),
            catalog,
            store,
        })
    }

    /// Opens an engine from configuration: JSON catalog, optional JSON
    /// indexes, SQLite store, no semantic provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or catalog cannot be opened.
    pub fn open(config: EngineConfig) -> Result<Self> {
        let now = crate::current_timestamp();
        let store = SqliteStore::open(&config.db_path)?;
        let provider = Box::new(JsonCatalog::new(&config.catalog_path));
        let cooccurrence = match &config.cooccurrence_path {
            Some(p) => CooccurrenceIndex::load_json(p)?,
            None => CooccurrenceIndex::default(),
        };
        let recency = match &config.recency_path {
            Some(p) => RecencyIndex::load_json(p)?,
            None => RecencyIndex::default(),
        };
        Self::new(provider, cooccurrence, recency, store, None, config, now)
    }

    /// Scores the catalog against note content and returns a ranked,
    /// capped suggestion list.
    pub fn suggest(&self, content: &str, options: &SuggestOptions) -> Result<Suggestion> {
        self.suggester.suggest(content, options)
    }

    /// Records one feedback entry and immediately folds it into the
    /// suppression aggregates, closing the learning loop.
    pub fn record_feedback(
        &self,
        entity: &str,
        context: FeedbackContext,
        note_path: &str,
        correct: bool,
        now: i64,
    ) -> Result<FeedbackEntry> {
        let entry = self.feedback.record(entity, context, note_path, correct, now)?;
        self.feedback.recompute_suppressions(now)?;
        Ok(entry)
    }

    /// Marks suggestions as inserted into a note.
    pub fn track_applications(&self, note_path: &str, entities: &[String], now: i64) -> Result<()> {
        self.applications.track(note_path, entities, now)
    }

    /// Detects removed links on an edited note and synthesizes implicit
    /// negative feedback for each. Suppression aggregates are refreshed
    /// when anything was removed.
    pub fn detect_removals(
        &self,
        note_path: &str,
        current_content: &str,
        now: i64,
    ) -> Result<Vec<String>> {
        let removed = self
            .applications
            .detect_removals(note_path, current_content, now)?;
        if !removed.is_empty() {
            self.feedback.recompute_suppressions(now)?;
        }
        Ok(removed)
    }

    /// Recomputes global suppressions from the full feedback history.
    pub fn recompute_suppressions(&self, now: i64) -> Result<SuppressionChanges> {
        self.feedback.recompute_suppressions(now)
    }

    /// Reconstructs one entity's history across all five stages.
    pub fn entity_journey(&self, entity: &str, days_back: u32, now: i64) -> Result<Journey> {
        let snapshot = self.catalog.snapshot();
        self.journeys.journey(entity, days_back, &snapshot, now)
    }

    /// Aggregate statistics across the whole loop.
    pub fn dashboard(&self, now: i64) -> Result<Dashboard> {
        self.journeys.dashboard(now)
    }

    /// The feedback store, for read-only inspection (CLI views).
    #[must_use]
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }
}
