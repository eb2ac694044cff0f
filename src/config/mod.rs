//! Configuration: strictness profiles and engine settings.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Named precision/recall trade-off profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Precision-biased defaults.
    #[default]
    Conservative,
    /// Looser legacy behavior.
    Balanced,
    /// Recall-maximizing.
    Aggressive,
}

impl Strictness {
    /// Parses a profile name, defaulting to conservative.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "balanced" => Self::Balanced,
            "aggressive" => Self::Aggressive,
            _ => Self::Conservative,
        }
    }

    /// Returns the lowercase profile name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
        }
    }

    /// Resolves the full parameter set for this profile.
    ///
    /// Every strictness parameter is accounted for here; there are no
    /// partially-specified profiles.
    #[must_use]
    pub const fn config(self) -> StrictnessConfig {
        match self {
            Self::Conservative => StrictnessConfig {
                min_token_length: 4,
                min_score: 15.0,
                min_match_ratio: 0.6,
                require_exact_single_word: true,
                exact_match_bonus: 10.0,
                stem_match_bonus: 3.0,
                full_alias_match_bonus: 5.0,
                semantic_multiplier: 0.6,
            },
            Self::Balanced => StrictnessConfig {
                min_token_length: 3,
                min_score: 8.0,
                min_match_ratio: 0.4,
                require_exact_single_word: false,
                exact_match_bonus: 10.0,
                stem_match_bonus: 5.0,
                full_alias_match_bonus: 5.0,
                semantic_multiplier: 1.0,
            },
            Self::Aggressive => StrictnessConfig {
                min_token_length: 3,
                min_score: 5.0,
                min_match_ratio: 0.3,
                require_exact_single_word: false,
                exact_match_bonus: 10.0,
                stem_match_bonus: 7.0,
                full_alias_match_bonus: 5.0,
                semantic_multiplier: 1.3,
            },
        }
    }
}

/// Fully-resolved scoring thresholds for one strictness profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrictnessConfig {
    /// Minimum significant token length.
    pub min_token_length: usize,
    /// Base minimum total score to surface a suggestion.
    pub min_score: f64,
    /// Minimum matched-words ratio for multi-word names.
    pub min_match_ratio: f64,
    /// Whether single-word entities require at least one exact match.
    pub require_exact_single_word: bool,
    /// Score per verbatim token match.
    pub exact_match_bonus: f64,
    /// Score per stem-only token match.
    pub stem_match_bonus: f64,
    /// One-time bonus when a single-word alias (>= 4 chars) matches exactly.
    pub full_alias_match_bonus: f64,
    /// Multiplier applied to the semantic layer.
    pub semantic_multiplier: f64,
}

impl StrictnessConfig {
    /// Minimum score scaled by content length.
    ///
    /// Short fragments would otherwise be starved (too few tokens to ever
    /// reach the base threshold) and long documents would over-trigger.
    #[must_use]
    pub fn adaptive_min_score(&self, content_chars: usize) -> f64 {
        if content_chars < 50 {
            (self.min_score * 0.6).floor().max(5.0)
        } else if content_chars > 200 {
            (self.min_score * 1.2).floor()
        } else {
            self.min_score
        }
    }
}

/// Engine-level settings: storage paths, snapshot sources, caps.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the SQLite feedback store.
    pub db_path: PathBuf,
    /// Path to the entity catalog JSON file.
    pub catalog_path: PathBuf,
    /// Optional co-occurrence index JSON file.
    pub cooccurrence_path: Option<PathBuf>,
    /// Optional recency index JSON file.
    pub recency_path: Option<PathBuf>,
    /// Default number of suggestions returned.
    pub max_suggestions: usize,
    /// Maximum score the semantic layer can contribute before the
    /// strictness multiplier.
    pub semantic_max_boost: f64,
    /// Default strictness profile.
    pub strictness: Strictness,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let data_dir = directories::ProjectDirs::from("", "", "notelink")
            .map_or_else(|| PathBuf::from(".notelink"), |d| d.data_dir().to_path_buf());
        Self {
            db_path: data_dir.join("notelink.db"),
            catalog_path: data_dir.join("catalog.json"),
            cooccurrence_path: None,
            recency_path: None,
            max_suggestions: 3,
            semantic_max_boost: 10.0,
            strictness: Strictness::Conservative,
        }
    }
}

impl EngineConfig {
    /// Loads a config file and overlays it on the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::operation("read_config", format!("{}: {e}", path.display())))?;
        let file: ConfigFile = toml::from_str(&raw)
            .map_err(|e| Error::InvalidInput(format!("config parse error: {e}")))?;
        Ok(Self::default().overlay(file))
    }

    /// Applies non-empty fields from a parsed config file.
    #[must_use]
    pub fn overlay(mut self, file: ConfigFile) -> Self {
        if let Some(p) = file.db_path {
            self.db_path = PathBuf::from(p);
        }
        if let Some(p) = file.catalog_path {
            self.catalog_path = PathBuf::from(p);
        }
        if let Some(p) = file.cooccurrence_path {
            self.cooccurrence_path = Some(PathBuf::from(p));
        }
        if let Some(p) = file.recency_path {
            self.recency_path = Some(PathBuf::from(p));
        }
        if let Some(n) = file.max_suggestions {
            self.max_suggestions = n.clamp(1, 10);
        }
        if let Some(b) = file.semantic_max_boost {
            self.semantic_max_boost = b;
        }
        if let Some(s) = file.strictness {
            self.strictness = Strictness::parse(&s);
        }
        self
    }
}

/// TOML configuration file structure.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// SQLite store path.
    pub db_path: Option<String>,
    /// Catalog JSON path.
    pub catalog_path: Option<String>,
    /// Co-occurrence index JSON path.
    pub cooccurrence_path: Option<String>,
    /// Recency index JSON path.
    pub recency_path: Option<String>,
    /// Default suggestion cap.
    pub max_suggestions: Option<usize>,
    /// Semantic layer max boost.
    pub semantic_max_boost: Option<f64>,
    /// Default strictness profile name.
    pub strictness: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let c = Strictness::Conservative.config();
        assert_eq!(c.min_score, 15.0);
        assert_eq!(c.min_match_ratio, 0.6);
        assert!(c.require_exact_single_word);

        let b = Strictness::Balanced.config();
        assert_eq!(b.min_score, 8.0);
        assert_eq!(b.min_match_ratio, 0.4);
        assert!(!b.require_exact_single_word);

        let a = Strictness::Aggressive.config();
        assert_eq!(a.min_score, 5.0);
        assert_eq!(a.min_match_ratio, 0.3);
    }

    #[test]
    fn test_adaptive_min_score_by_content_length() {
        let c = Strictness::Conservative.config();
        // short content: max(5, floor(15 * 0.6)) = 9
        assert_eq!(c.adaptive_min_score(20), 9.0);
        // medium content: unchanged
        assert_eq!(c.adaptive_min_score(100), 15.0);
        // long content: floor(15 * 1.2) = 18
        assert_eq!(c.adaptive_min_score(500), 18.0);

        // aggressive short content floors at 5
        let a = Strictness::Aggressive.config();
        assert_eq!(a.adaptive_min_score(10), 5.0);
    }

    #[test]
    fn test_strictness_parse_defaults_conservative() {
        assert_eq!(Strictness::parse("balanced"), Strictness::Balanced);
        assert_eq!(Strictness::parse("AGGRESSIVE"), Strictness::Aggressive);
        assert_eq!(Strictness::parse("???"), Strictness::Conservative);
    }

    #[test]
    fn test_config_overlay() {
        let file = ConfigFile {
            db_path: Some("/tmp/x.db".to_string()),
            max_suggestions: Some(25),
            strictness: Some("balanced".to_string()),
            ..ConfigFile::default()
        };
        let cfg = EngineConfig::default().overlay(file);
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(cfg.max_suggestions, 10); // clamped
        assert_eq!(cfg.strictness, Strictness::Balanced);
    }
}
