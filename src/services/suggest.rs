//! The suggestion pipeline: three scoring sweeps over the catalog.
//!
//! Single pass, no state machine: prepare the content once, score every
//! eligible catalog entity (sweep A), lift associated entities that carry
//! literal overlap (sweep B), merge semantic similarity (sweep C), then
//! gate, rank, cap, and format. The call never mutates learning state; the
//! only writes are append-only audit events, and those are best-effort.

use crate::catalog::CatalogHandle;
use crate::config::{EngineConfig, Strictness};
use crate::index::{CooccurrenceIndex, RecencyIndex};
use crate::models::{Entity, ScoreBreakdown, Suggestion, SuggestionDetail, SuggestionEvent};
use crate::scoring::{self, ContentIndex, ScoreContext};
use crate::semantic::{self, SemanticProvider};
use crate::services::FeedbackService;
use crate::storage::SqliteStore;
use crate::text;
use crate::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::instrument;

/// Entities with names longer than this are unlinkable titles, not things.
const MAX_NAME_LEN: usize = 25;

/// Multi-word names beyond this are article titles.
const MAX_NAME_WORDS: usize = 3;

/// Known article-title openings.
static TITLE_PATTERNS: &[&str] = &[
    "guide to",
    "how to",
    "introduction to",
    "overview of",
    "notes on",
];

/// Scale from association strength to score points.
const COOCCURRENCE_SCALE: f64 = 2.0;

/// Cap on the co-occurrence layer so association can never drown out
/// content evidence.
const MAX_COOCCURRENCE_BOOST: f64 = 10.0;

/// Candidates fetched from the semantic provider per call.
const SEMANTIC_TOP_K: usize = 16;

/// Options for one suggestion call.
#[derive(Debug, Clone)]
pub struct SuggestOptions {
    /// Suggestion cap; clamped to 1..=10.
    pub max_suggestions: Option<usize>,
    /// Skip entities already wikilinked in the content.
    pub exclude_linked: bool,
    /// Strictness override for this call.
    pub strictness: Option<Strictness>,
    /// Note the content belongs to; enables context, cross-folder, and
    /// folder-stratified feedback layers.
    pub note_path: Option<String>,
    /// Include per-candidate breakdowns in the result.
    pub detail: bool,
    /// Explicit current time (Unix seconds); defaults to the wall clock.
    pub now: Option<i64>,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            max_suggestions: None,
            exclude_linked: true,
            strictness: None,
            detail: false,
            note_path: None,
            now: None,
        }
    }
}

/// One scored candidate moving through the sweeps.
struct Candidate {
    name: String,
    name_lower: String,
    breakdown: ScoreBreakdown,
    last_mentioned: Option<i64>,
}

/// The suggestion pipeline.
pub struct SuggestionService {
    catalog: Arc<CatalogHandle>,
    cooccurrence: Arc<CooccurrenceIndex>,
    recency: Arc<RecencyIndex>,
    store: Arc<SqliteStore>,
    semantic: Option<Arc<dyn SemanticProvider>>,
    config: EngineConfig,
}

impl SuggestionService {
    /// Creates the pipeline over shared snapshots and the store.
    #[must_use]
    pub fn new(
        catalog: Arc<CatalogHandle>,
        cooccurrence: Arc<CooccurrenceIndex>,
        recency: Arc<RecencyIndex>,
        store: Arc<SqliteStore>,
        semantic: Option<Arc<dyn SemanticProvider>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            cooccurrence,
            recency,
            store,
            semantic,
            config,
        }
    }

    /// Runs the full pipeline for one piece of note content.
    #[instrument(skip(self, content, options), fields(len = content.len()))]
    pub fn suggest(&self, content: &str, options: &SuggestOptions) -> Result<Suggestion> {
        let now = options.now.unwrap_or_else(crate::current_timestamp);
        metrics::counter!("suggest_calls_total").increment(1);

        // A prior suffix means this content was already augmented; running
        // again would stack arrows forever.
        if text::has_suggestion_suffix(content) {
            metrics::counter!("suggest_idempotent_skip_total").increment(1);
            return Ok(Suggestion::default());
        }

        self.catalog.refresh_if_stale(now);
        let snapshot = self.catalog.snapshot();

        let strictness = options
            .strictness
            .unwrap_or(self.config.strictness)
            .config();
        let content_index = ContentIndex::new(content, strictness.min_token_length);
        if content_index.token_count() == 0 {
            return Ok(Suggestion::default());
        }

        let linked: HashSet<String> = if options.exclude_linked {
            text::extract_wikilinks(content)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        let note_path = options.note_path.as_deref();
        let note_folder = note_path.and_then(text::top_level_folder);

        let feedback_service = FeedbackService::new(Arc::clone(&self.store));
        let suppressed = feedback_service.effective_suppressed_set(note_folder)?;
        let signals = feedback_service.signals_for(note_folder)?;

        let ctx = ScoreContext {
            strictness: &strictness,
            note_path,
            recency: &self.recency,
            feedback: &signals,
            now,
        };
        let min_score = strictness.adaptive_min_score(content_index.char_len());

        // Sweep A: direct scoring of every eligible catalog entity.
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut by_lower: HashMap<String, usize> = HashMap::new();
        let mut anchors: Vec<String> = Vec::new();
        for entity in snapshot.entities() {
            if suppressed.contains(&entity.name_lower)
                || linked.contains(&entity.name_lower)
                || !Self::is_linkable_name(&entity.name)
            {
                continue;
            }
            let breakdown = scoring::score_entity(&content_index, entity, &ctx);
            if breakdown.content_match > 0.0 {
                anchors.push(entity.name_lower.clone());
            }
            if breakdown.total() > 0.0 {
                by_lower.insert(entity.name_lower.clone(), candidates.len());
                candidates.push(Candidate {
                    name: entity.name.clone(),
                    name_lower: entity.name_lower.clone(),
                    breakdown,
                    last_mentioned: self.recency.last_mentioned(&entity.name_lower),
                });
            }
        }

        // Sweep B: co-occurrence with the content-matched set. An entity
        // with zero literal overlap with the content stays out no matter
        // how strongly associated it is.
        if !anchors.is_empty() {
            let mut association: HashMap<String, f64> = HashMap::new();
            for anchor in &anchors {
                if let Some(related) = self.cooccurrence.related(anchor) {
                    for (other, strength) in related {
                        if other != anchor {
                            *association.entry(other.clone()).or_default() += strength;
                        }
                    }
                }
            }
            for (other, strength) in association {
                let boost = (strength * COOCCURRENCE_SCALE * self.recency.recency_weight(&other, now))
                    .min(MAX_COOCCURRENCE_BOOST);
                if boost <= 0.0 {
                    continue;
                }
                if let Some(&idx) = by_lower.get(&other) {
                    let gated = candidates[idx].breakdown.content_match > 0.0
                        || snapshot
                            .get(&other)
                            .is_some_and(|e| Self::overlaps_content(e, &content_index));
                    if gated {
                        candidates[idx].breakdown.cooccurrence_boost += boost;
                    }
                    continue;
                }
                let Some(entity) = snapshot.get(&other) else {
                    continue;
                };
                if suppressed.contains(&entity.name_lower)
                    || linked.contains(&entity.name_lower)
                    || !Self::is_linkable_name(&entity.name)
                    || !Self::overlaps_content(entity, &content_index)
                {
                    continue;
                }
                let mut breakdown = scoring::score_entity(&content_index, entity, &ctx);
                breakdown.cooccurrence_boost = boost;
                by_lower.insert(entity.name_lower.clone(), candidates.len());
                candidates.push(Candidate {
                    name: entity.name.clone(),
                    name_lower: entity.name_lower.clone(),
                    breakdown,
                    last_mentioned: self.recency.last_mentioned(&entity.name_lower),
                });
            }
        }

        // Sweep C: semantic similarity, merged or newly admitted. Provider
        // failure degrades to "no semantic layer this call".
        if content_index.char_len() >= semantic::MIN_CONTENT_LEN {
            if let Some(provider) = &self.semantic {
                self.semantic_sweep(
                    provider.as_ref(),
                    content,
                    &content_index,
                    &snapshot,
                    &suppressed,
                    &linked,
                    &ctx,
                    &mut candidates,
                    &mut by_lower,
                );
            }
        }

        // Gate, rank, cap. Popularity without relevance never surfaces.
        let mut survivors: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| c.breakdown.content_relevant() && c.breakdown.total() >= min_score)
            .collect();
        survivors.sort_by(|a, b| {
            b.breakdown
                .total()
                .partial_cmp(&a.breakdown.total())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.last_mentioned.cmp(&a.last_mentioned))
                .then_with(|| a.name.cmp(&b.name))
        });
        let cap = options
            .max_suggestions
            .unwrap_or(self.config.max_suggestions)
            .clamp(1, 10);
        survivors.truncate(cap);

        let passed: HashSet<&str> = survivors.iter().map(|c| c.name_lower.as_str()).collect();
        self.record_events(&candidates, &passed, note_path, min_score, now);

        let names: Vec<String> = survivors.iter().map(|c| c.name.clone()).collect();
        let suffix = if names.is_empty() {
            String::new()
        } else {
            let links: Vec<String> = names.iter().map(|n| format!("[[{n}]]")).collect();
            format!("→ {}", links.join(", "))
        };
        let detailed = options.detail.then(|| {
            survivors
                .iter()
                .map(|c| SuggestionDetail {
                    name: c.name.clone(),
                    total: c.breakdown.total(),
                    breakdown: c.breakdown,
                })
                .collect()
        });

        Ok(Suggestion {
            suggestions: names,
            suffix,
            detailed,
        })
    }

    /// Length cap and article-title heuristic: catalog entries that are
    /// really document titles never make useful link targets.
    fn is_linkable_name(name: &str) -> bool {
        if name.chars().count() > MAX_NAME_LEN {
            return false;
        }
        let lower = name.to_lowercase();
        if TITLE_PATTERNS.iter().any(|p| lower.contains(p)) {
            return false;
        }
        text::split_words(name).len() <= MAX_NAME_WORDS
    }

    /// Whether any of the entity's own name/alias tokens literally overlaps
    /// the content's token or stem sets.
    fn overlaps_content(entity: &Entity, content: &ContentIndex) -> bool {
        if content.sets().overlaps(&text::split_words(&entity.name)) {
            return true;
        }
        entity
            .aliases
            .iter()
            .any(|a| content.sets().overlaps(&text::split_words(a)))
    }

    #[allow(clippy::too_many_arguments)]
    fn semantic_sweep(
        &self,
        provider: &dyn SemanticProvider,
        content: &str,
        content_index: &ContentIndex,
        snapshot: &crate::catalog::CatalogSnapshot,
        suppressed: &HashSet<String>,
        linked: &HashSet<String>,
        ctx: &ScoreContext<'_>,
        candidates: &mut Vec<Candidate>,
        by_lower: &mut HashMap<String, usize>,
    ) {
        let similar = provider
            .embed(content)
            .and_then(|embedding| provider.top_similar(&embedding, SEMANTIC_TOP_K, linked));
        let similar = match similar {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "semantic provider failed, skipping layer");
                metrics::counter!("semantic_provider_failure_total").increment(1);
                return;
            },
        };

        let multiplier = ctx.strictness.semantic_multiplier;
        for (name, similarity) in similar {
            if similarity < semantic::MIN_SIMILARITY {
                continue;
            }
            let lower = name.to_lowercase();
            let boost = similarity * self.config.semantic_max_boost * multiplier;
            if let Some(&idx) = by_lower.get(&lower) {
                candidates[idx].breakdown.semantic_boost = boost;
                continue;
            }
            let Some(entity) = snapshot.get(&lower) else {
                continue;
            };
            if suppressed.contains(&entity.name_lower)
                || linked.contains(&entity.name_lower)
                || !Self::is_linkable_name(&entity.name)
            {
                continue;
            }
            let mut breakdown = scoring::score_entity(content_index, entity, ctx);
            breakdown.semantic_boost = boost;
            by_lower.insert(entity.name_lower.clone(), candidates.len());
            candidates.push(Candidate {
                name: entity.name.clone(),
                name_lower: entity.name_lower.clone(),
                breakdown,
                last_mentioned: self.recency.last_mentioned(&entity.name_lower),
            });
        }
    }

    /// Writes one audit event per scored candidate. Best-effort: a failed
    /// audit write degrades observability, not the suggestion.
    fn record_events(
        &self,
        candidates: &[Candidate],
        passed: &HashSet<&str>,
        note_path: Option<&str>,
        threshold: f64,
        now: i64,
    ) {
        let events: Vec<SuggestionEvent> = candidates
            .iter()
            .map(|c| SuggestionEvent {
                entity: c.name.clone(),
                note_path: note_path.unwrap_or_default().to_string(),
                timestamp: now,
                total_score: c.breakdown.total(),
                breakdown: Some(c.breakdown),
                threshold,
                passed: passed.contains(c.name_lower.as_str()),
            })
            .collect();
        if let Err(e) = self.store.record_suggestion_events(&events) {
            tracing::warn!(error = %e, "failed to record suggestion events");
            metrics::counter!("suggestion_event_write_failure_total").increment(1);
        }
    }
}
