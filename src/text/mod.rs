//! Tokenization, stemming, and markdown link scanning.
//!
//! Pure functions only: text in, tokens out. No state, no clock.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;

/// English stemmer, shared process-wide.
static STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// Common English stopwords filtered out before scoring.
static STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he",
    "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "like", "me", "my",
    "no", "not", "of", "on", "one", "only", "or", "other", "our", "out", "she", "so", "some",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "to", "up",
    "was", "we", "were", "what", "when", "where", "which", "who", "will", "with", "would", "you",
    "your",
];

/// High-frequency, low-information nouns that trigger co-occurrence false
/// positives if allowed to count as content.
static GENERIC_WORDS: &[&str] = &[
    "message", "file", "files", "result", "results", "thing", "things", "item", "items", "note",
    "notes", "data", "info", "information", "content", "list", "page", "section", "update",
    "updates", "today", "meeting", "call", "time", "work", "task", "tasks",
];

static WIKILINK_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\[\[([^\]\[]+)\]\]").unwrap()
});

/// Matches a trailing suggestion suffix: `→ [[A]]` optionally followed by
/// `, [[B]]` repeats, at end of content.
static SUFFIX_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"→\s*\[\[[^\]\[]+\]\](\s*,\s*\[\[[^\]\[]+\]\])*\s*$").unwrap()
});

/// A significant token: the lowercase word and its stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lowercase word as it appeared.
    pub word: String,
    /// English stem of the word.
    pub stem: String,
}

/// Stems a single lowercase word.
#[must_use]
pub fn stem(word: &str) -> String {
    STEMMER.stem(word).to_string()
}

/// Splits text into significant lowercase tokens.
///
/// Words shorter than `min_len`, stopwords, and generic low-information
/// nouns are dropped. Word characters are ASCII alphanumerics plus `-`, `_`,
/// `.`, and `'` so names like "node.js" and "o'brien" survive as one token.
#[must_use]
pub fn tokenize(text: &str, min_len: usize) -> Vec<Token> {
    split_words(text)
        .into_iter()
        .filter(|w| w.chars().count() >= min_len)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .filter(|w| !GENERIC_WORDS.contains(&w.as_str()))
        .map(|word| {
            let stem = stem(&word);
            Token { word, stem }
        })
        .collect()
}

/// Splits text into raw lowercase words without significance filtering.
/// Used for entity names and aliases, where stopword removal would distort
/// the match ratio.
#[must_use]
pub fn split_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '\'')))
        .map(|w| w.trim_matches(|c: char| matches!(c, '-' | '_' | '.' | '\'')))
        .filter(|w| !w.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Word and stem lookup sets built once per suggestion call.
#[derive(Debug, Default)]
pub struct TokenSets {
    words: HashSet<String>,
    stems: HashSet<String>,
}

impl TokenSets {
    /// Builds the sets from significant tokens.
    #[must_use]
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let mut words = HashSet::new();
        let mut stems = HashSet::new();
        for t in tokens {
            words.insert(t.word.clone());
            stems.insert(t.stem.clone());
        }
        Self { words, stems }
    }

    /// Whether the exact lowercase word appears in the content.
    #[must_use]
    pub fn contains_word(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Whether the stem appears in the content's stem set.
    #[must_use]
    pub fn contains_stem(&self, stem: &str) -> bool {
        self.stems.contains(stem)
    }

    /// Whether any of the given words overlaps the content literally,
    /// either verbatim or by stem.
    #[must_use]
    pub fn overlaps(&self, words: &[String]) -> bool {
        words
            .iter()
            .any(|w| self.contains_word(w) || self.contains_stem(&stem(w)))
    }
}

/// Extracts entity names already wikilinked in content.
///
/// Pipe aliases (`[[Name|shown text]]`) resolve to the link target.
#[must_use]
pub fn extract_wikilinks(content: &str) -> Vec<String> {
    WIKILINK_RE
        .captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| {
            let inner = m.as_str();
            inner.split('|').next().unwrap_or(inner).trim().to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Whether content already ends with a suggestion suffix marker.
///
/// Guards idempotency: suggesting on content that carries a prior suffix
/// would stack arrows forever.
#[must_use]
pub fn has_suggestion_suffix(content: &str) -> bool {
    SUFFIX_MARKER_RE.is_match(content.trim_end())
}

/// First path segment of a vault-relative path, when the path has at least
/// two segments. A bare filename has no folder.
#[must_use]
pub fn top_level_folder(path: &str) -> Option<&str> {
    let trimmed = path.trim_start_matches('/');
    let (first, rest) = trimmed.split_once('/')?;
    if first.is_empty() || rest.is_empty() {
        None
    } else {
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_filters_stopwords_and_generics() {
        let tokens = tokenize("Met with the team about a file for TypeScript", 3);
        let words: Vec<&str> = tokens.iter().map(|t| t.word.as_str()).collect();
        assert!(words.contains(&"met"));
        assert!(words.contains(&"team"));
        assert!(words.contains(&"typescript"));
        assert!(!words.contains(&"the"));
        assert!(!words.contains(&"file"));
    }

    #[test]
    fn test_tokenize_min_length() {
        let tokens = tokenize("go rust kubernetes", 4);
        let words: Vec<&str> = tokens.iter().map(|t| t.word.as_str()).collect();
        assert_eq!(words, vec!["rust", "kubernetes"]);
    }

    #[test]
    fn test_stem_matches_inflections() {
        assert_eq!(stem("deploying"), stem("deployed"));
        assert_eq!(stem("migrations"), stem("migration"));
    }

    #[test]
    fn test_split_words_keeps_dotted_names() {
        assert_eq!(split_words("Node.js rollout"), vec!["node.js", "rollout"]);
    }

    #[test]
    fn test_extract_wikilinks() {
        let links = extract_wikilinks("See [[Jordan Smith]] and [[Atlas|the project]].");
        assert_eq!(links, vec!["Jordan Smith", "Atlas"]);
    }

    #[test]
    fn test_suffix_marker_detection() {
        assert!(has_suggestion_suffix("Notes about work → [[Atlas]]"));
        assert!(has_suggestion_suffix(
            "Notes → [[Atlas]], [[Jordan Smith]]\n"
        ));
        assert!(!has_suggestion_suffix("Notes mentioning [[Atlas]] inline"));
        assert!(!has_suggestion_suffix("Plain note content"));
    }

    #[test]
    fn test_top_level_folder() {
        assert_eq!(top_level_folder("projects/atlas.md"), Some("projects"));
        assert_eq!(top_level_folder("/daily-notes/2026-08-26.md"), Some("daily-notes"));
        assert_eq!(top_level_folder("loose.md"), None);
        assert_eq!(top_level_folder(""), None);
    }
}
