//! CLI command implementations.
//!
//! Each function backs one subcommand and prints human-readable or JSON
//! output to stdout.

use anyhow::{Context, Result};
use notelink::models::FeedbackContext;
use notelink::{current_timestamp, Strictness, SuggestOptions, SuggestionEngine};
use std::io::Read;
use std::path::PathBuf;

/// Reads note content from a file, or stdin when no path is given.
fn read_content(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        },
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        },
    }
}

/// `notelink suggest`
pub fn suggest(
    engine: &SuggestionEngine,
    file: Option<PathBuf>,
    note_path: Option<String>,
    max: Option<usize>,
    strictness: Option<String>,
    detail: bool,
    json: bool,
) -> Result<()> {
    let content = read_content(file.as_ref())?;
    let options = SuggestOptions {
        max_suggestions: max,
        strictness: strictness.as_deref().map(Strictness::parse),
        note_path,
        detail: detail || json,
        ..SuggestOptions::default()
    };
    let result = engine.suggest(&content, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    if result.suggestions.is_empty() {
        println!("no suggestions");
        return Ok(());
    }
    println!("{}", result.suffix);
    if detail {
        if let Some(details) = &result.detailed {
            for d in details {
                println!("  {} ({:.1})", d.name, d.total);
            }
        }
    }
    Ok(())
}

/// `notelink feedback record`
pub fn feedback_record(
    engine: &SuggestionEngine,
    entity: &str,
    note: &str,
    correct: bool,
) -> Result<()> {
    let entry = engine.record_feedback(
        entity,
        FeedbackContext::Explicit,
        note,
        correct,
        current_timestamp(),
    )?;
    println!(
        "recorded {} feedback for {}",
        if entry.correct { "positive" } else { "negative" },
        entry.entity
    );
    Ok(())
}

/// `notelink feedback search`
pub fn feedback_search(engine: &SuggestionEngine, query: &str, limit: usize) -> Result<()> {
    let hits = engine.store().search_feedback(query, limit)?;
    if hits.is_empty() {
        println!("no matches");
        return Ok(());
    }
    for entry in hits {
        println!(
            "{}  {}  {}  {}",
            entry.created_at,
            entry.entity,
            entry.context,
            if entry.correct { "correct" } else { "incorrect" }
        );
    }
    Ok(())
}

/// `notelink applications track`
pub fn applications_track(
    engine: &SuggestionEngine,
    note: &str,
    entities: &[String],
) -> Result<()> {
    engine.track_applications(note, entities, current_timestamp())?;
    println!("tracked {} application(s) for {note}", entities.len());
    Ok(())
}

/// `notelink applications detect`
pub fn applications_detect(
    engine: &SuggestionEngine,
    note: &str,
    file: Option<PathBuf>,
) -> Result<()> {
    let content = read_content(file.as_ref())?;
    let removed = engine.detect_removals(note, &content, current_timestamp())?;
    if removed.is_empty() {
        println!("no removals detected");
    } else {
        for entity in removed {
            println!("removed: {entity}");
        }
    }
    Ok(())
}

/// `notelink journey`
pub fn journey(engine: &SuggestionEngine, entity: &str, days: u32, json: bool) -> Result<()> {
    let journey = engine.entity_journey(entity, days, current_timestamp())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&journey)?);
        return Ok(());
    }

    println!("journey for {} (last {} days)", journey.entity, journey.days_back);
    match &journey.discover {
        Some(info) => println!(
            "  discover: {} [{}], {} alias(es), hub {}",
            info.name,
            info.category,
            info.aliases.len(),
            info.hub_score
        ),
        None => println!("  discover: not in catalog"),
    }
    println!("  suggest: {} event(s)", journey.suggest.len());
    for ev in journey.suggest.iter().take(5) {
        println!(
            "    {}  {:.1}/{:.1}  {}  {}",
            ev.note_path,
            ev.total_score,
            ev.threshold,
            if ev.passed { "passed" } else { "skipped" },
            ev.top_layer.as_deref().unwrap_or("-")
        );
    }
    println!("  apply: {} application(s)", journey.apply.len());
    println!(
        "  learn: {}/{} correct",
        journey.learn.stats.correct, journey.learn.stats.total
    );
    println!("  adapt: {}", journey.adapt.reason);
    Ok(())
}

/// `notelink dashboard`
pub fn dashboard(engine: &SuggestionEngine, json: bool) -> Result<()> {
    let dash = engine.dashboard(current_timestamp())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&dash)?);
        return Ok(());
    }

    println!("feedback: {} total, {:.0}% accurate, {} entities",
        dash.total_feedback,
        dash.overall_accuracy * 100.0,
        dash.tracked_entities
    );
    println!(
        "applications: {} active, {} removed",
        dash.applications_active, dash.applications_removed
    );
    println!("suppressed: {}", dash.suppressed_entities);
    for tier in &dash.tiers {
        println!("  {}: {}", tier.tier, tier.count);
    }
    for day in dash.timeline.iter().take(7) {
        println!("  {}  {}/{}", day.day, day.correct, day.total);
    }
    Ok(())
}

/// `notelink suppressions recompute`
pub fn suppressions_recompute(engine: &SuggestionEngine) -> Result<()> {
    let changes = engine.recompute_suppressions(current_timestamp())?;
    println!(
        "suppressions: {} upserted, {} removed",
        changes.upserted, changes.removed
    );
    Ok(())
}

/// `notelink suppressions list`
pub fn suppressions_list(engine: &SuggestionEngine) -> Result<()> {
    let rows = engine.store().suppressions()?;
    if rows.is_empty() {
        println!("no suppressed entities");
        return Ok(());
    }
    for s in rows {
        println!("{}  {:.0}%", s.entity, s.false_positive_rate * 100.0);
    }
    Ok(())
}
