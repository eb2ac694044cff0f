//! Binary entry point for notelink.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
// CLI output goes to stdout by design.
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use notelink::{EngineConfig, SuggestionEngine};
use std::path::PathBuf;
use std::process::ExitCode;

/// Notelink - adaptive wikilink suggestions for markdown note vaults.
#[derive(Parser)]
#[command(name = "notelink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true, env = "NOTELINK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Suggest wikilinks for note content (from file or stdin).
    Suggest {
        /// Note file to read; stdin when omitted.
        file: Option<PathBuf>,

        /// Vault-relative path of the note (enables context layers).
        #[arg(short, long)]
        note: Option<String>,

        /// Maximum suggestions (1-10).
        #[arg(short, long)]
        max: Option<usize>,

        /// Strictness profile: conservative, balanced, aggressive.
        #[arg(short, long)]
        strictness: Option<String>,

        /// Show per-candidate score totals.
        #[arg(short, long)]
        detail: bool,

        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },

    /// Record or search feedback.
    Feedback {
        #[command(subcommand)]
        action: FeedbackAction,
    },

    /// Track applied suggestions and detect removals.
    Applications {
        #[command(subcommand)]
        action: ApplicationsAction,
    },

    /// Reconstruct one entity's suggestion history.
    Journey {
        /// Entity name.
        entity: String,

        /// Lookback window in days.
        #[arg(short, long, default_value = "30")]
        days: u32,

        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show aggregate statistics.
    Dashboard {
        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage the suppression list.
    Suppressions {
        #[command(subcommand)]
        action: SuppressionsAction,
    },
}

#[derive(Subcommand)]
enum FeedbackAction {
    /// Record an explicit correct/incorrect judgment.
    Record {
        /// Entity name.
        entity: String,

        /// Note path the suggestion was for.
        #[arg(short, long)]
        note: String,

        /// The suggestion was wrong.
        #[arg(long, conflicts_with = "correct")]
        incorrect: bool,

        /// The suggestion was right (default).
        #[arg(long)]
        correct: bool,
    },
    /// Full-text search over recorded feedback.
    Search {
        /// FTS5 match query.
        query: String,

        /// Result limit.
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum ApplicationsAction {
    /// Mark entities as applied to a note.
    Track {
        /// Note path.
        note: String,

        /// Entity names that were inserted.
        entities: Vec<String>,
    },
    /// Detect removed links on an edited note (content from file or stdin).
    Detect {
        /// Note path.
        note: String,

        /// Current note content; stdin when omitted.
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SuppressionsAction {
    /// Recompute global suppressions from the feedback history.
    Recompute,
    /// List suppressed entities.
    List,
}

fn run() -> Result<()> {
    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let engine = SuggestionEngine::open(config)?;

    match args.command {
        Commands::Suggest {
            file,
            note,
            max,
            strictness,
            detail,
            json,
        } => cli::suggest(&engine, file, note, max, strictness, detail, json),
        Commands::Feedback { action } => match action {
            FeedbackAction::Record {
                entity,
                note,
                incorrect,
                ..
            } => cli::feedback_record(&engine, &entity, &note, !incorrect),
            FeedbackAction::Search { query, limit } => {
                cli::feedback_search(&engine, &query, limit)
            },
        },
        Commands::Applications { action } => match action {
            ApplicationsAction::Track { note, entities } => {
                cli::applications_track(&engine, &note, &entities)
            },
            ApplicationsAction::Detect { note, file } => {
                cli::applications_detect(&engine, &note, file)
            },
        },
        Commands::Journey { entity, days, json } => cli::journey(&engine, &entity, days, json),
        Commands::Dashboard { json } => cli::dashboard(&engine, json),
        Commands::Suppressions { action } => match action {
            SuppressionsAction::Recompute => cli::suppressions_recompute(&engine),
            SuppressionsAction::List => cli::suppressions_list(&engine),
        },
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        },
    }
}
