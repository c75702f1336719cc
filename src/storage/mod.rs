//! Storage module for persisting scrape results
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Upserting scraped records by their natural keys
//! - Run tracking
//! - Row counts for statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::FeedStatus;
use crate::TasteError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(TasteError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, TasteError> {
    SqliteStorage::new(path)
}

/// Represents a scrape run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub username: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    /// How the scrape ended, once it has
    pub feed_status: Option<FeedStatus>,
}

/// Status of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Tables that hold scraped data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Runs,
    Users,
    Films,
    UserFilms,
    LikedReviews,
    LikedReviewCounts,
    UserFollows,
    UserMutuals,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::Runs,
        Table::Users,
        Table::Films,
        Table::UserFilms,
        Table::LikedReviews,
        Table::LikedReviewCounts,
        Table::UserFollows,
        Table::UserMutuals,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Runs => "runs",
            Self::Users => "users",
            Self::Films => "films",
            Self::UserFilms => "user_films",
            Self::LikedReviews => "liked_reviews",
            Self::LikedReviewCounts => "liked_review_counts",
            Self::UserFollows => "user_follows",
            Self::UserMutuals => "user_mutuals",
        }
    }
}
