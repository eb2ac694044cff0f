//! Catalog entity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a catalog entity.
///
/// Categories bias scoring toward high-value, low-noise kinds of entities:
/// a person's name in a note is almost always worth linking, a generic
/// technology term much less so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityCategory {
    /// People and their aliases.
    People,
    /// Projects and initiatives.
    Projects,
    /// Companies, teams, and institutions.
    Organizations,
    /// Physical or virtual places.
    Locations,
    /// Abstract concepts and methodologies.
    Concepts,
    /// Languages, frameworks, tools.
    Technologies,
    /// Short capitalized abbreviations.
    Acronyms,
    /// Anything that fits no other category.
    #[default]
    Other,
}

impl EntityCategory {
    /// Returns all category variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::People,
            Self::Projects,
            Self::Organizations,
            Self::Locations,
            Self::Concepts,
            Self::Technologies,
            Self::Acronyms,
            Self::Other,
        ]
    }

    /// Parses a category string, defaulting to [`Self::Other`] for anything
    /// unrecognized. Malformed catalog rows must never abort a scoring pass.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "people" | "person" => Self::People,
            "projects" | "project" => Self::Projects,
            "organizations" | "organization" | "orgs" => Self::Organizations,
            "locations" | "location" => Self::Locations,
            "concepts" | "concept" => Self::Concepts,
            "technologies" | "technology" | "tech" => Self::Technologies,
            "acronyms" | "acronym" => Self::Acronyms,
            _ => Self::Other,
        }
    }

    /// Returns the lowercase string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::People => "people",
            Self::Projects => "projects",
            Self::Organizations => "organizations",
            Self::Locations => "locations",
            Self::Concepts => "concepts",
            Self::Technologies => "technologies",
            Self::Acronyms => "acronyms",
            Self::Other => "other",
        }
    }

    /// Fixed per-category score contribution.
    #[must_use]
    pub const fn type_boost(self) -> f64 {
        match self {
            Self::People => 5.0,
            Self::Projects => 3.0,
            Self::Organizations => 2.0,
            Self::Locations | Self::Concepts => 1.0,
            Self::Technologies | Self::Acronyms | Self::Other => 0.0,
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A known entity from the catalog.
///
/// Immutable within a suggestion call; the catalog snapshot owns these and
/// replaces them wholesale on refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Canonical display name, used verbatim inside wikilinks.
    pub name: String,
    /// Lowercased name, the lookup key everywhere.
    #[serde(default)]
    pub name_lower: String,
    /// Entity category.
    #[serde(default)]
    pub category: EntityCategory,
    /// Alternative names this entity is known by.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Vault-relative path of the entity's source note.
    #[serde(default)]
    pub source_path: String,
    /// Inbound reference count of the source note.
    #[serde(default)]
    pub hub_score: u64,
}

impl Entity {
    /// Creates an entity with just a name and category; remaining fields
    /// default. Mostly useful in tests and small catalogs.
    #[must_use]
    pub fn new(name: impl Into<String>, category: EntityCategory) -> Self {
        let name = name.into();
        let name_lower = name.to_lowercase();
        Self {
            name,
            name_lower,
            category,
            aliases: Vec::new(),
            source_path: String::new(),
            hub_score: 0,
        }
    }

    /// Ensures `name_lower` is populated (catalog files may omit it).
    pub fn normalize(&mut self) {
        if self.name_lower.is_empty() {
            self.name_lower = self.name.to_lowercase();
        }
    }

    /// Top-level folder of the source note, if the path has one.
    #[must_use]
    pub fn top_level_folder(&self) -> Option<&str> {
        crate::text::top_level_folder(&self.source_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_defaults_to_other() {
        assert_eq!(EntityCategory::parse("people"), EntityCategory::People);
        assert_eq!(EntityCategory::parse("Person"), EntityCategory::People);
        assert_eq!(EntityCategory::parse("garbage"), EntityCategory::Other);
        assert_eq!(EntityCategory::parse(""), EntityCategory::Other);
    }

    #[test]
    fn test_type_boost_ordering() {
        assert_eq!(EntityCategory::People.type_boost(), 5.0);
        assert_eq!(EntityCategory::Projects.type_boost(), 3.0);
        assert_eq!(EntityCategory::Organizations.type_boost(), 2.0);
        assert_eq!(EntityCategory::Locations.type_boost(), 1.0);
        assert_eq!(EntityCategory::Concepts.type_boost(), 1.0);
        assert_eq!(EntityCategory::Technologies.type_boost(), 0.0);
        assert_eq!(EntityCategory::Acronyms.type_boost(), 0.0);
    }

    #[test]
    fn test_entity_new_lowercases() {
        let e = Entity::new("Jordan Smith", EntityCategory::People);
        assert_eq!(e.name_lower, "jordan smith");
    }

    #[test]
    fn test_top_level_folder() {
        let mut e = Entity::new("X", EntityCategory::Other);
        e.source_path = "people/jordan-smith.md".to_string();
        assert_eq!(e.top_level_folder(), Some("people"));

        e.source_path = "loose-note.md".to_string();
        assert_eq!(e.top_level_folder(), None);
    }
}
