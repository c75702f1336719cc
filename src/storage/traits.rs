//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::{LikedReviewCount, PersonEdge, ReviewRecord, UserFilmStatus, UserProfile};
use crate::state::FeedStatus;
use crate::storage::{RunRecord, RunStatus, Table};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every write is an upsert keyed by the record's natural identifier:
/// writing the same record twice leaves one row holding the latest values.
/// Batch writes return the number of rows written.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new scrape run
    ///
    /// # Arguments
    ///
    /// * `username` - The user being scraped
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, username: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent runs, newest first
    fn get_recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;

    /// Updates the status of a run
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with its feed status and a finish timestamp
    fn complete_run(&mut self, run_id: i64, feed_status: FeedStatus) -> StorageResult<()>;

    /// Runs `write` inside one transaction
    ///
    /// Everything `write` stores is committed together, or rolled back
    /// together when it returns an error.
    fn write_atomically(
        &mut self,
        write: &mut dyn FnMut(&mut dyn Storage) -> StorageResult<()>,
    ) -> StorageResult<()>;

    // ===== Scraped Records =====

    /// Inserts or updates a user's profile
    fn upsert_user(&mut self, profile: &UserProfile) -> StorageResult<()>;

    /// Inserts or updates film titles
    ///
    /// # Arguments
    ///
    /// * `films` - `(film_identifier, display_name)` pairs
    fn upsert_films(&mut self, films: &[(&str, &str)]) -> StorageResult<usize>;

    /// Inserts or updates a user's per-film statuses
    ///
    /// Statuses are keyed by (user, film); callers pass one status per film.
    fn upsert_user_films(
        &mut self,
        username: &str,
        statuses: &[UserFilmStatus],
    ) -> StorageResult<usize>;

    /// Inserts or updates the reviews a user liked
    fn upsert_liked_reviews(
        &mut self,
        username: &str,
        reviews: &[ReviewRecord],
    ) -> StorageResult<usize>;

    /// Inserts or updates liked-review counts per author
    fn upsert_liked_review_counts(
        &mut self,
        username: &str,
        counts: &[LikedReviewCount],
    ) -> StorageResult<usize>;

    /// Inserts follow edges
    fn upsert_follows(&mut self, edges: &[PersonEdge]) -> StorageResult<usize>;

    /// Inserts a user's mutuals
    ///
    /// Empty names and the user themself are skipped.
    fn upsert_user_mutuals(&mut self, username: &str, mutuals: &[String]) -> StorageResult<usize>;

    // ===== Queries =====

    /// Gets a stored profile
    fn get_user(&self, username: &str) -> StorageResult<Option<UserProfile>>;

    /// Gets a user's stored per-film statuses, ordered by film
    fn get_user_films(&self, username: &str) -> StorageResult<Vec<UserFilmStatus>>;

    /// Gets a user's stored liked-review counts, highest first
    fn get_liked_review_counts(&self, username: &str) -> StorageResult<Vec<LikedReviewCount>>;

    /// Gets a user's stored mutuals, sorted
    fn get_mutuals(&self, username: &str) -> StorageResult<Vec<String>>;

    // ===== Statistics =====

    /// Counts the rows in a table
    fn count_rows(&self, table: Table) -> StorageResult<u64>;
}
