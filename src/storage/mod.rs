//! Persistence for the feedback loop.
//!
//! One `SQLite` database holds the four learning tables: `feedback`,
//! `suppressions`, `applications`, and `suggestion_events`. The entity
//! catalog has its own store outside this crate.

mod sqlite;

pub use sqlite::SqliteStore;
