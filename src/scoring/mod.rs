//! Multi-layer candidate scoring.
//!
//! Each layer is computed independently and summed into a
//! [`ScoreBreakdown`]. Everything here is deterministic given
//! (content, entity, current aggregates, now); the co-occurrence and
//! semantic layers are merged in by the suggestion pipeline, which owns the
//! sweeps that produce them.

use crate::config::StrictnessConfig;
use crate::index::RecencyIndex;
use crate::models::{AccuracyStats, Entity, ScoreBreakdown};
use crate::text::{self, TokenSets};
use std::collections::HashMap;

/// Seconds per day.
const DAY: i64 = 86_400;

/// Bonus for connections that span top-level folders.
const CROSS_FOLDER_BOOST: f64 = 3.0;

/// Minimum feedback samples before any boost tier applies.
pub const MIN_FEEDBACK_SAMPLES: u64 = 5;

/// Minimum alias length for the full-alias exact-match bonus. Shorter
/// aliases are too likely to collide with ordinary words.
const FULL_ALIAS_MIN_LEN: usize = 4;

/// Tokenized content prepared once per suggestion call.
#[derive(Debug)]
pub struct ContentIndex {
    sets: TokenSets,
    char_len: usize,
    token_count: usize,
}

impl ContentIndex {
    /// Tokenizes content under the given minimum token length.
    #[must_use]
    pub fn new(content: &str, min_token_length: usize) -> Self {
        let tokens = text::tokenize(content, min_token_length);
        Self {
            sets: TokenSets::from_tokens(&tokens),
            char_len: content.chars().count(),
            token_count: tokens.len(),
        }
    }

    /// Word/stem lookup sets.
    #[must_use]
    pub const fn sets(&self) -> &TokenSets {
        &self.sets
    }

    /// Content length in characters.
    #[must_use]
    pub const fn char_len(&self) -> usize {
        self.char_len
    }

    /// Number of significant tokens that survived filtering.
    #[must_use]
    pub const fn token_count(&self) -> usize {
        self.token_count
    }
}

/// Feedback aggregates visible to the scorer for one suggestion call.
///
/// When a note folder is known and the folder alone has enough samples for
/// an entity, the folder-local stats supersede the global ones. An entity
/// can be a trusted link-target in one area of the vault and a noisy one in
/// another.
#[derive(Debug, Default)]
pub struct FeedbackSignals {
    global: HashMap<String, AccuracyStats>,
    folder: HashMap<String, AccuracyStats>,
}

impl FeedbackSignals {
    /// Builds signals from global and (optionally) folder-local aggregates.
    #[must_use]
    pub fn new(
        global: HashMap<String, AccuracyStats>,
        folder: HashMap<String, AccuracyStats>,
    ) -> Self {
        Self { global, folder }
    }

    /// Feedback adjustment for an entity, folder-stratified.
    #[must_use]
    pub fn adjustment_for(&self, name_lower: &str) -> f64 {
        if let Some(local) = self.folder.get(name_lower) {
            if local.total >= MIN_FEEDBACK_SAMPLES {
                return feedback_boost(*local);
            }
        }
        self.global
            .get(name_lower)
            .map_or(0.0, |stats| feedback_boost(*stats))
    }
}

/// Boost from accuracy aggregates; first matching tier wins, accuracy
/// evaluated high to low. Below the sample floor there is no signal at all.
#[must_use]
pub fn feedback_boost(stats: AccuracyStats) -> f64 {
    if stats.total < MIN_FEEDBACK_SAMPLES {
        return 0.0;
    }
    let accuracy = stats.accuracy();
    if accuracy >= 0.95 && stats.total >= 20 {
        5.0
    } else if accuracy >= 0.80 {
        2.0
    } else if accuracy >= 0.60 {
        0.0
    } else if accuracy >= 0.40 {
        -2.0
    } else {
        -4.0
    }
}

/// Human-readable tier name for an entity's current aggregates.
#[must_use]
pub fn tier_name(stats: AccuracyStats) -> &'static str {
    if stats.total < MIN_FEEDBACK_SAMPLES {
        return "unproven";
    }
    let accuracy = stats.accuracy();
    if accuracy >= 0.95 && stats.total >= 20 {
        "trusted"
    } else if accuracy >= 0.80 {
        "reliable"
    } else if accuracy >= 0.60 {
        "neutral"
    } else if accuracy >= 0.40 {
        "probation"
    } else {
        "distrusted"
    }
}

/// Note-path context classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteContext {
    /// Daily notes and journals: favors people and projects.
    Daily,
    /// Project folders: favors projects and technologies.
    Project,
    /// Technical docs: favors technologies and acronyms.
    Tech,
    /// Everything else: no context bonus.
    General,
}

impl NoteContext {
    /// Classifies a note path by substring heuristics on its segments.
    #[must_use]
    pub fn classify(note_path: &str) -> Self {
        let lower = note_path.to_lowercase();
        if lower.contains("daily-notes/") || lower.contains("journal") {
            Self::Daily
        } else if lower.contains("projects/") {
            Self::Project
        } else if lower.contains("tech/") || lower.contains("docs/") {
            Self::Tech
        } else {
            Self::General
        }
    }

    /// Category-specific additive bonus for this context.
    #[must_use]
    pub fn boost(self, category: crate::models::EntityCategory) -> f64 {
        use crate::models::EntityCategory as C;
        match (self, category) {
            (Self::Daily, C::People) | (Self::Project, C::Projects) | (Self::Tech, C::Technologies) => 3.0,
            (Self::Daily, C::Projects)
            | (Self::Project, C::Technologies)
            | (Self::Tech, C::Acronyms) => 2.0,
            _ => 0.0,
        }
    }
}

/// Everything the scorer needs beyond the content and the entity.
pub struct ScoreContext<'a> {
    /// Active strictness parameters.
    pub strictness: &'a StrictnessConfig,
    /// Note path the suggestion is for, when known.
    pub note_path: Option<&'a str>,
    /// Last-mentioned timestamps.
    pub recency: &'a RecencyIndex,
    /// Feedback aggregates for this call.
    pub feedback: &'a FeedbackSignals,
    /// Explicitly-passed current time (Unix seconds).
    pub now: i64,
}

/// Outcome of matching one name/alias candidate against content.
#[derive(Debug, Default, Clone, Copy)]
struct NameMatch {
    score: f64,
    exact_matches: usize,
}

/// Matches one candidate string (name or alias) token-by-token.
///
/// Multi-word candidates must clear the match ratio; single-word candidates
/// under `require_exact_single_word` must match verbatim, not stem-only.
fn match_candidate(candidate: &str, sets: &TokenSets, cfg: &StrictnessConfig) -> NameMatch {
    let words = text::split_words(candidate);
    if words.is_empty() {
        return NameMatch::default();
    }

    let mut score = 0.0;
    let mut exact = 0;
    let mut matched = 0;
    for word in &words {
        if sets.contains_word(word) {
            score += cfg.exact_match_bonus;
            exact += 1;
            matched += 1;
        } else if sets.contains_stem(&text::stem(word)) {
            score += cfg.stem_match_bonus;
            matched += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let ratio = matched as f64 / words.len() as f64;
    if words.len() > 1 && ratio < cfg.min_match_ratio {
        return NameMatch::default();
    }
    if words.len() == 1 && cfg.require_exact_single_word && exact == 0 {
        return NameMatch::default();
    }

    NameMatch {
        score,
        exact_matches: exact,
    }
}

/// Content-match layer: best of primary name vs. aliases, plus the one-time
/// full-alias bonus guarding short aliases against stem-only false
/// positives.
fn content_match_layer(content: &ContentIndex, entity: &Entity, cfg: &StrictnessConfig) -> f64 {
    let mut best = match_candidate(&entity.name, content.sets(), cfg);
    for alias in &entity.aliases {
        let m = match_candidate(alias, content.sets(), cfg);
        if m.score > best.score {
            best = m;
        }
    }
    if best.score <= 0.0 {
        return 0.0;
    }

    let mut score = best.score;
    let has_full_alias_match = entity.aliases.iter().any(|alias| {
        let words = text::split_words(alias);
        words.len() == 1
            && words[0].chars().count() >= FULL_ALIAS_MIN_LEN
            && content.sets().contains_word(&words[0])
    });
    if has_full_alias_match {
        score += cfg.full_alias_match_bonus;
    }
    score
}

/// Recency layer: monotonically non-increasing in elapsed time, zero when
/// the entity was never mentioned.
fn recency_layer(entity: &Entity, recency: &RecencyIndex, now: i64) -> f64 {
    match recency.last_mentioned(&entity.name_lower) {
        Some(ts) => {
            let elapsed = now.saturating_sub(ts);
            if elapsed <= 7 * DAY {
                5.0
            } else if elapsed <= 30 * DAY {
                3.0
            } else if elapsed <= 90 * DAY {
                1.0
            } else {
                0.0
            }
        },
        None => 0.0,
    }
}

/// Cross-folder layer: reward connections that span topic areas over
/// same-folder echo links.
fn cross_folder_layer(entity: &Entity, note_path: Option<&str>) -> f64 {
    let Some(note_folder) = note_path.and_then(text::top_level_folder) else {
        return 0.0;
    };
    match entity.top_level_folder() {
        Some(entity_folder) if entity_folder != note_folder => CROSS_FOLDER_BOOST,
        _ => 0.0,
    }
}

/// Hub layer: tiered by backlink count, highest applicable tier wins.
fn hub_layer(hub_score: u64) -> f64 {
    if hub_score >= 100 {
        8.0
    } else if hub_score >= 50 {
        5.0
    } else if hub_score >= 20 {
        3.0
    } else if hub_score >= 5 {
        1.0
    } else {
        0.0
    }
}

/// Scores one entity against prepared content.
///
/// The co-occurrence and semantic layers stay zero here; the pipeline's
/// sweeps fill them in.
#[must_use]
pub fn score_entity(content: &ContentIndex, entity: &Entity, ctx: &ScoreContext<'_>) -> ScoreBreakdown {
    let context_boost = ctx
        .note_path
        .map_or(0.0, |p| NoteContext::classify(p).boost(entity.category));

    ScoreBreakdown {
        content_match: content_match_layer(content, entity, ctx.strictness),
        cooccurrence_boost: 0.0,
        type_boost: entity.category.type_boost(),
        context_boost,
        recency_boost: recency_layer(entity, ctx.recency, ctx.now),
        cross_folder_boost: cross_folder_layer(entity, ctx.note_path),
        hub_boost: hub_layer(entity.hub_score),
        feedback_adjustment: ctx.feedback.adjustment_for(&entity.name_lower),
        semantic_boost: 0.0,
    }
}
