//! Read-only co-occurrence and recency snapshots.
//!
//! Both indexes are mined offline and loaded once per process lifetime (or
//! refresh interval). Keys are lowercase entity names.

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Seconds per day.
const DAY: i64 = 86_400;

/// Entity → {related entity → recency-weighted association strength}.
#[derive(Debug, Default)]
pub struct CooccurrenceIndex {
    map: HashMap<String, HashMap<String, f64>>,
}

impl CooccurrenceIndex {
    /// Builds an index from a raw map, lowercasing all keys.
    #[must_use]
    pub fn from_map(raw: HashMap<String, HashMap<String, f64>>) -> Self {
        let map = raw
            .into_iter()
            .map(|(k, v)| {
                let inner = v
                    .into_iter()
                    .map(|(ik, iv)| (ik.to_lowercase(), iv))
                    .collect();
                (k.to_lowercase(), inner)
            })
            .collect();
        Self { map }
    }

    /// Loads the index from a JSON object-of-objects file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_json(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::operation("read_cooccurrence", format!("{}: {e}", path.display())))?;
        let map: HashMap<String, HashMap<String, f64>> = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidInput(format!("cooccurrence parse error: {e}")))?;
        Ok(Self::from_map(map))
    }

    /// Entities associated with `entity`, if any.
    #[must_use]
    pub fn related(&self, entity_lower: &str) -> Option<&HashMap<String, f64>> {
        self.map.get(entity_lower)
    }

    /// Association strength between two entities; 0.0 when unrelated.
    #[must_use]
    pub fn strength(&self, a_lower: &str, b_lower: &str) -> f64 {
        self.map
            .get(a_lower)
            .and_then(|m| m.get(b_lower))
            .copied()
            .unwrap_or(0.0)
    }

    /// Number of entities with any association.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the index holds no associations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Entity → last-mentioned Unix timestamp.
#[derive(Debug, Default)]
pub struct RecencyIndex {
    map: HashMap<String, i64>,
}

impl RecencyIndex {
    /// Builds an index from a raw map, lowercasing keys.
    #[must_use]
    pub fn from_map(raw: HashMap<String, i64>) -> Self {
        let map = raw.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect();
        Self { map }
    }

    /// Loads the index from a JSON object file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_json(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::operation("read_recency", format!("{}: {e}", path.display())))?;
        let map: HashMap<String, i64> = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidInput(format!("recency parse error: {e}")))?;
        Ok(Self::from_map(map))
    }

    /// Last-mentioned timestamp for an entity, if known.
    #[must_use]
    pub fn last_mentioned(&self, entity_lower: &str) -> Option<i64> {
        self.map.get(entity_lower).copied()
    }

    /// Time-decay weight for co-occurrence boosting.
    ///
    /// Fresh mentions carry full weight; entities unseen for months (or
    /// never seen) are discounted, not zeroed, since association strength
    /// still carries signal.
    #[must_use]
    pub fn recency_weight(&self, entity_lower: &str, now: i64) -> f64 {
        match self.last_mentioned(entity_lower) {
            Some(ts) => {
                let elapsed = now.saturating_sub(ts);
                if elapsed <= 30 * DAY {
                    1.0
                } else if elapsed <= 90 * DAY {
                    0.7
                } else {
                    0.5
                }
            },
            None => 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooccurrence_lookup_is_case_insensitive() {
        let mut inner = HashMap::new();
        inner.insert("Atlas".to_string(), 4.5);
        let mut raw = HashMap::new();
        raw.insert("Jordan Smith".to_string(), inner);

        let idx = CooccurrenceIndex::from_map(raw);
        assert_eq!(idx.strength("jordan smith", "atlas"), 4.5);
        assert_eq!(idx.strength("jordan smith", "unknown"), 0.0);
        assert!(idx.related("nobody").is_none());
    }

    #[test]
    fn test_recency_weight_tiers() {
        let now = 1_700_000_000;
        let mut raw = HashMap::new();
        raw.insert("fresh".to_string(), now - 5 * DAY);
        raw.insert("aging".to_string(), now - 60 * DAY);
        raw.insert("stale".to_string(), now - 400 * DAY);
        let idx = RecencyIndex::from_map(raw);

        assert_eq!(idx.recency_weight("fresh", now), 1.0);
        assert_eq!(idx.recency_weight("aging", now), 0.7);
        assert_eq!(idx.recency_weight("stale", now), 0.5);
        assert_eq!(idx.recency_weight("never", now), 0.5);
    }
}
