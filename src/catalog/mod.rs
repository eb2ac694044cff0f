//! Entity catalog access: provider trait, immutable snapshot, refresh handle.
//!
//! Building the catalog from the vault is someone else's job; this module
//! consumes it read-only. The snapshot is replaced wholesale on refresh so
//! in-flight scoring always sees a fully-formed catalog, never a partially
//! rebuilt one.

use crate::models::Entity;
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Read-only source of catalog entities.
pub trait CatalogProvider: Send + Sync {
    /// Returns every known entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn list_entities(&self) -> Result<Vec<Entity>>;

    /// Unix timestamp of the last catalog build.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn built_at(&self) -> Result<i64>;

    /// Entities whose lowercase name starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn search_by_prefix(&self, prefix: &str) -> Result<Vec<Entity>> {
        let p = prefix.to_lowercase();
        Ok(self
            .list_entities()?
            .into_iter()
            .filter(|e| e.name_lower.starts_with(&p))
            .collect())
    }

    /// Entities carrying the given alias (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get_by_alias(&self, alias: &str) -> Result<Vec<Entity>> {
        let a = alias.to_lowercase();
        Ok(self
            .list_entities()?
            .into_iter()
            .filter(|e| e.aliases.iter().any(|al| al.to_lowercase() == a))
            .collect())
    }
}

/// Immutable in-memory catalog snapshot.
#[derive(Debug)]
pub struct CatalogSnapshot {
    entities: Vec<Entity>,
    by_lower: HashMap<String, usize>,
    loaded_at: i64,
}

impl CatalogSnapshot {
    /// Builds a snapshot from a list of entities.
    #[must_use]
    pub fn new(mut entities: Vec<Entity>, loaded_at: i64) -> Self {
        for e in &mut entities {
            e.normalize();
        }
        let by_lower = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name_lower.clone(), i))
            .collect();
        Self {
            entities,
            by_lower,
            loaded_at,
        }
    }

    /// All entities in the snapshot.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Looks up an entity by lowercase name.
    #[must_use]
    pub fn get(&self, name_lower: &str) -> Option<&Entity> {
        self.by_lower.get(name_lower).map(|&i| &self.entities[i])
    }

    /// Unix timestamp the snapshot was loaded.
    #[must_use]
    pub const fn loaded_at(&self) -> i64 {
        self.loaded_at
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Owns the current snapshot and swaps it when the provider reports a newer
/// build. Readers clone the `Arc` and keep scoring against the version they
/// started with.
pub struct CatalogHandle {
    provider: Box<dyn CatalogProvider>,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogHandle {
    /// Loads the initial snapshot from the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial load fails; later refresh failures
    /// only log and keep the previous snapshot.
    pub fn new(provider: Box<dyn CatalogProvider>, now: i64) -> Result<Self> {
        let entities = provider.list_entities()?;
        let snapshot = Arc::new(CatalogSnapshot::new(entities, now));
        Ok(Self {
            provider,
            snapshot: RwLock::new(snapshot),
        })
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => {
                tracing::warn!("catalog snapshot lock was poisoned, recovering");
                Arc::clone(&poisoned.into_inner())
            },
        }
    }

    /// Swaps in a fresh snapshot when the provider's build is newer than
    /// the snapshot's load time. Stale-but-available beats unavailable: any
    /// provider error leaves the current snapshot in place.
    pub fn refresh_if_stale(&self, now: i64) {
        let loaded_at = self.snapshot().loaded_at();
        let built_at = match self.provider.built_at() {
            Ok(ts) => ts,
            Err(e) => {
                tracing::warn!(error = %e, "catalog built_at check failed, keeping snapshot");
                return;
            },
        };
        if built_at <= loaded_at {
            return;
        }
        match self.provider.list_entities() {
            Ok(entities) => {
                let fresh = Arc::new(CatalogSnapshot::new(entities, now));
                tracing::debug!(entities = fresh.len(), "catalog snapshot refreshed");
                metrics::counter!("catalog_refresh_total").increment(1);
                match self.snapshot.write() {
                    Ok(mut guard) => *guard = fresh,
                    Err(poisoned) => *poisoned.into_inner() = fresh,
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "catalog refresh failed, keeping snapshot");
                metrics::counter!("catalog_refresh_failure_total").increment(1);
            },
        }
    }
}

/// File-backed catalog provider reading a JSON array of entity records.
///
/// Malformed records are skipped per-entity; a single bad row never aborts
/// the whole load.
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    /// Creates a provider for the given JSON file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogProvider for JsonCatalog {
    fn list_entities(&self) -> Result<Vec<Entity>> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::operation("read_catalog", format!("{}: {e}", self.path.display()))
        })?;
        let values: Vec<serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidInput(format!("catalog parse error: {e}")))?;

        let mut entities = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value::<Entity>(value) {
                Ok(mut e) if !e.name.trim().is_empty() => {
                    e.normalize();
                    entities.push(e);
                },
                Ok(_) => {},
                Err(e) => {
                    tracing::debug!(error = %e, "skipping malformed catalog record");
                },
            }
        }
        Ok(entities)
    }

    fn built_at(&self) -> Result<i64> {
        let meta = std::fs::metadata(&self.path).map_err(|e| {
            Error::operation("stat_catalog", format!("{}: {e}", self.path.display()))
        })?;
        let modified = meta
            .modified()
            .map_err(|e| Error::operation("stat_catalog", e))?;
        Ok(modified
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or(0))
    }
}

/// Fixed in-memory catalog, used by tests and embedding callers that build
/// their own entity list.
pub struct StaticCatalog {
    entities: Vec<Entity>,
    built_at: i64,
}

impl StaticCatalog {
    /// Creates a catalog over a fixed entity list.
    #[must_use]
    pub fn new(entities: Vec<Entity>, built_at: i64) -> Self {
        Self { entities, built_at }
    }
}

impl CatalogProvider for StaticCatalog {
    fn list_entities(&self) -> Result<Vec<Entity>> {
        Ok(self.entities.clone())
    }

    fn built_at(&self) -> Result<i64> {
        Ok(self.built_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityCategory;

    fn entity(name: &str) -> Entity {
        Entity::new(name, EntityCategory::Other)
    }

    #[test]
    fn test_snapshot_lookup() {
        let snap = CatalogSnapshot::new(vec![entity("Atlas"), entity("Jordan Smith")], 100);
        assert_eq!(snap.len(), 2);
        assert!(snap.get("atlas").is_some());
        assert!(snap.get("Atlas").is_none()); // keys are lowercase
        assert!(snap.get("nobody").is_none());
    }

    #[test]
    fn test_handle_refreshes_only_on_newer_build() {
        let provider = StaticCatalog::new(vec![entity("Atlas")], 50);
        let handle = CatalogHandle::new(Box::new(provider), 100).expect("load");
        assert_eq!(handle.snapshot().loaded_at(), 100);

        // built_at (50) <= loaded_at (100): no swap
        handle.refresh_if_stale(200);
        assert_eq!(handle.snapshot().loaded_at(), 100);
    }

    #[test]
    fn test_handle_swaps_on_newer_build() {
        let provider = StaticCatalog::new(vec![entity("Atlas")], 500);
        let handle = CatalogHandle::new(Box::new(provider), 100).expect("load");

        handle.refresh_if_stale(600);
        assert_eq!(handle.snapshot().loaded_at(), 600);
    }

    #[test]
    fn test_provider_alias_lookup() {
        let mut e = entity("Jordan Smith");
        e.aliases.push("JSmith".to_string());
        let provider = StaticCatalog::new(vec![e, entity("Atlas")], 0);

        let hits = provider.get_by_alias("jsmith").expect("lookup");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Jordan Smith");

        let hits = provider.search_by_prefix("at").expect("lookup");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Atlas");
    }
}
