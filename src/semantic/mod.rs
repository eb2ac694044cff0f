//! Semantic similarity provider seam.
//!
//! Embedding computation lives outside this crate; the engine consumes an
//! opaque provider and degrades gracefully when it fails. A failed provider
//! call means "no semantic layer this call", never a failed suggestion.

use crate::Result;
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Minimum similarity for the semantic layer to contribute at all.
pub const MIN_SIMILARITY: f64 = 0.30;

/// Content shorter than this carries too little signal to embed.
pub const MIN_CONTENT_LEN: usize = 20;

/// Trait for semantic similarity providers.
pub trait SemanticProvider: Send + Sync {
    /// Embeds the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails (timeout, malformed response).
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Returns up to `k` entities most similar to the embedding, excluding
    /// the given lowercase names.
    ///
    /// # Errors
    ///
    /// Returns an error if the similarity lookup fails.
    fn top_similar(
        &self,
        embedding: &[f32],
        k: usize,
        excluding: &HashSet<String>,
    ) -> Result<Vec<(String, f64)>>;
}

/// Caching wrapper around a provider.
///
/// Embedding the same note content twice (common when a caller suggests,
/// edits, and suggests again) should not pay for inference twice.
pub struct CachedSemanticProvider {
    inner: Box<dyn SemanticProvider>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl CachedSemanticProvider {
    /// Wraps a provider with an LRU text→embedding cache.
    #[must_use]
    pub fn new(inner: Box<dyn SemanticProvider>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl SemanticProvider for CachedSemanticProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(text) {
                metrics::counter!("semantic_embed_cache_hit_total").increment(1);
                return Ok(hit.clone());
            }
        }
        let embedding = self.inner.embed(text)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(text.to_string(), embedding.clone());
        }
        Ok(embedding)
    }

    fn top_similar(
        &self,
        embedding: &[f32],
        k: usize,
        excluding: &HashSet<String>,
    ) -> Result<Vec<(String, f64)>> {
        self.inner.top_similar(embedding, k, excluding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: std::sync::Arc<AtomicUsize>,
    }

    impl SemanticProvider for CountingProvider {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.5, 0.5])
        }

        fn top_similar(
            &self,
            _embedding: &[f32],
            _k: usize,
            _excluding: &HashSet<String>,
        ) -> Result<Vec<(String, f64)>> {
            Ok(vec![("atlas".to_string(), 0.9)])
        }
    }

    #[test]
    fn test_embed_cache_avoids_repeat_calls() {
        let calls = std::sync::Arc::new(AtomicUsize::new(0));
        let inner = CountingProvider {
            calls: std::sync::Arc::clone(&calls),
        };
        let cached = CachedSemanticProvider::new(Box::new(inner), 8);

        cached.embed("same content").unwrap();
        cached.embed("same content").unwrap();
        cached.embed("other content").unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
