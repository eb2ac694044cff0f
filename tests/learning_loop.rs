//! Feedback, suppression, and application tracking through the engine.

#![allow(clippy::unwrap_used)]

use notelink::catalog::StaticCatalog;
use notelink::models::FeedbackContext;
use notelink::{
    CooccurrenceIndex, Entity, EntityCategory, EngineConfig, RecencyIndex, SqliteStore,
    Strictness, SuggestOptions, SuggestionEngine,
};

const NOW: i64 = 1_700_000_000;

fn engine(entities: Vec<Entity>) -> SuggestionEngine {
    let store = SqliteStore::in_memory().unwrap();
    SuggestionEngine::new(
        Box::new(StaticCatalog::new(entities, 0)),
        CooccurrenceIndex::default(),
        RecencyIndex::default(),
        store,
        None,
        EngineConfig::default(),
        NOW,
    )
    .unwrap()
}

fn balanced() -> SuggestOptions {
    SuggestOptions {
        strictness: Some(Strictness::Balanced),
        now: Some(NOW),
        ..SuggestOptions::default()
    }
}

#[test]
fn test_negative_feedback_suppresses_entity() {
    let eng = engine(vec![Entity::new("TypeScript", EntityCategory::Technologies)]);
    let content = "refactoring the TypeScript services layer";

    let result = eng.suggest(content, &balanced()).unwrap();
    assert_eq!(result.suggestions, vec!["TypeScript"]);

    // ten wrong calls cross the sample floor at a 100% false-positive rate
    for i in 0..10 {
        eng.record_feedback(
            "TypeScript",
            FeedbackContext::Explicit,
            "daily/2026-08-20.md",
            false,
            NOW + i,
        )
        .unwrap();
    }
    assert!(eng.store().is_suppressed("TypeScript").unwrap().is_some());

    let result = eng.suggest(content, &balanced()).unwrap();
    assert!(result.suggestions.is_empty());
}

#[test]
fn test_folder_record_overrides_global_suppression() {
    let eng = engine(vec![Entity::new("TypeScript", EntityCategory::Technologies)]);
    let content = "refactoring the TypeScript services layer";

    // globally noisy: 10 wrong in daily/, but a clean local record in tech/
    for i in 0..10 {
        eng.record_feedback(
            "TypeScript",
            FeedbackContext::Explicit,
            "daily/2026-08-20.md",
            false,
            NOW + i,
        )
        .unwrap();
    }
    for i in 0..5 {
        eng.record_feedback(
            "TypeScript",
            FeedbackContext::Explicit,
            "tech/setup.md",
            true,
            NOW + 100 + i,
        )
        .unwrap();
    }
    assert!(eng.store().is_suppressed("TypeScript").unwrap().is_some());

    // no folder context: the global block stands
    let result = eng.suggest(content, &balanced()).unwrap();
    assert!(result.suggestions.is_empty());

    // unrelated folder: still blocked
    let opts = SuggestOptions {
        note_path: Some("projects/plan.md".to_string()),
        ..balanced()
    };
    assert!(eng.suggest(content, &opts).unwrap().suggestions.is_empty());

    // tech/ has five clean samples of its own: the entity is back
    let opts = SuggestOptions {
        note_path: Some("tech/notes.md".to_string()),
        ..balanced()
    };
    let result = eng.suggest(content, &opts).unwrap();
    assert_eq!(result.suggestions, vec!["TypeScript"]);
}

#[test]
fn test_suppression_lifts_when_accuracy_recovers() {
    let eng = engine(vec![Entity::new("TypeScript", EntityCategory::Technologies)]);

    for i in 0..4 {
        eng.record_feedback(
            "TypeScript",
            FeedbackContext::Explicit,
            "daily/a.md",
            false,
            NOW + i,
        )
        .unwrap();
    }
    for i in 0..6 {
        eng.record_feedback(
            "TypeScript",
            FeedbackContext::Explicit,
            "daily/a.md",
            true,
            NOW + 10 + i,
        )
        .unwrap();
    }
    // 4/10 wrong = 40%: suppressed
    assert!(eng.store().is_suppressed("TypeScript").unwrap().is_some());

    // enough positive signal drops the rate under 30% and deletes the row
    for i in 0..5 {
        eng.record_feedback(
            "TypeScript",
            FeedbackContext::Explicit,
            "daily/a.md",
            true,
            NOW + 20 + i,
        )
        .unwrap();
    }
    assert!(eng.store().is_suppressed("TypeScript").unwrap().is_none());
}

#[test]
fn test_removal_detection_emits_implicit_feedback_once() {
    let eng = engine(vec![
        Entity::new("Atlas", EntityCategory::Projects),
        Entity::new("Orion", EntityCategory::Projects),
    ]);
    let note = "daily/2026-08-25.md";

    eng.track_applications(note, &["Atlas".to_string(), "Orion".to_string()], NOW)
        .unwrap();

    // the edited note kept Atlas but dropped Orion
    let removed = eng
        .detect_removals(note, "Status update: [[Atlas]] shipped on time", NOW + 60)
        .unwrap();
    assert_eq!(removed, vec!["Orion"]);

    let stats = eng.store().entity_stats("Orion").unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.correct, 0);

    let entries = eng.store().entity_feedback("Orion", 0).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(matches!(entries[0].context, FeedbackContext::ImplicitRemoved));
    assert!(!entries[0].correct);

    // the surviving link generated no feedback
    assert_eq!(eng.store().entity_stats("Atlas").unwrap().total, 0);

    // a second pass over the same content detects nothing new
    let removed = eng
        .detect_removals(note, "Status update: [[Atlas]] shipped on time", NOW + 120)
        .unwrap();
    assert!(removed.is_empty());
    assert_eq!(eng.store().entity_stats("Orion").unwrap().total, 1);
}

#[test]
fn test_reapplied_link_flips_back_to_applied() {
    let eng = engine(vec![Entity::new("Atlas", EntityCategory::Projects)]);
    let note = "projects/plan.md";

    eng.track_applications(note, &["Atlas".to_string()], NOW).unwrap();
    eng.detect_removals(note, "plain text without links", NOW + 10)
        .unwrap();
    assert!(eng.store().applied_for_note(note).unwrap().is_empty());

    // the user re-inserts the link later
    eng.track_applications(note, &["Atlas".to_string()], NOW + 20)
        .unwrap();
    let applied = eng.store().applied_for_note(note).unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].entity, "Atlas");
}

#[test]
fn test_journey_covers_all_stages() {
    let eng = engine(vec![Entity::new("Atlas", EntityCategory::Projects)]);

    eng.suggest("atlas milestone review for the launch", &balanced())
        .unwrap();
    eng.track_applications("daily/a.md", &["Atlas".to_string()], NOW)
        .unwrap();
    for i in 0..5 {
        eng.record_feedback(
            "Atlas",
            FeedbackContext::Explicit,
            "daily/a.md",
            true,
            NOW + i,
        )
        .unwrap();
    }

    let journey = eng.entity_journey("Atlas", 30, NOW + 100).unwrap();
    assert_eq!(journey.entity, "Atlas");
    assert!(journey.discover.is_some());
    assert!(!journey.suggest.is_empty());
    assert_eq!(journey.apply.len(), 1);
    assert_eq!(journey.learn.stats.total, 5);
    assert_eq!(journey.learn.stats.correct, 5);

    let dash = eng.dashboard(NOW + 100).unwrap();
    assert_eq!(dash.total_feedback, 5);
    assert_eq!(dash.tracked_entities, 1);
    assert_eq!(dash.applications_active, 1);
}
