//! chirp - relational micro-blogging data engine
//!
//! This library provides the core retrieval and consistency engine for a
//! small social network backed by `SQLite`: accounts, tweets, retweets, a
//! follow graph, hashtag indexing, favorite lists, and the feed, search,
//! and directory views over them.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface definitions
//! - [`error`] - Error types and mutation outcome taxonomy
//! - [`model`] - Data models and the [`model::Page`] pagination type
//! - [`storage`] - `SQLite` storage layer and all mutating operations
//! - [`feed`] - Feed aggregation (merged tweet/retweet stream)
//! - [`search`] - Keyword/hashtag search over tweets
//! - [`directory`] - User name search and profile views

pub mod cli;
pub mod config;
pub mod directory;
pub mod error;
pub mod feed;
pub mod logging;
pub mod model;
pub mod search;
pub mod storage;

pub use cli::*;
pub use error::{ChirpError, Outcome, Result, SignupOutcome};
pub use model::*;
pub use search::{SearchResults, parse_keywords};
pub use storage::Storage;

/// Default database filename
pub const DEFAULT_DB_NAME: &str = "chirp.db";

/// Get the default data directory for chirp
#[must_use]
pub fn default_data_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("chirp")
}

/// Get the default database path
#[must_use]
pub fn default_db_path() -> std::path::PathBuf {
    default_data_dir().join(DEFAULT_DB_NAME)
}
