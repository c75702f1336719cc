//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//!
//! Batch writes run inside savepoints, so they nest within an enclosing
//! `write_atomically` transaction.

use crate::model::{LikedReviewCount, PersonEdge, ReviewRecord, UserFilmStatus, UserProfile};
use crate::state::FeedStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, Table};
use crate::TasteError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, username, started_at, finished_at, config_hash, status, feed_status";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(TasteError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, TasteError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, TasteError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Running),
        feed_status: row
            .get::<_, Option<String>>(6)?
            .as_deref()
            .and_then(FeedStatus::from_db_string),
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, username: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (username, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![username, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS))?;

        stmt.query_row(params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs ORDER BY id DESC LIMIT ?1",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), run_id],
        )?;
        Ok(())
    }

    fn complete_run(&mut self, run_id: i64, feed_status: FeedStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, feed_status = ?3 WHERE id = ?4",
            params![
                RunStatus::Completed.to_db_string(),
                now,
                feed_status.to_db_string(),
                run_id
            ],
        )?;
        Ok(())
    }

    fn write_atomically(
        &mut self,
        write: &mut dyn FnMut(&mut dyn Storage) -> StorageResult<()>,
    ) -> StorageResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;

        match write(self) {
            Ok(()) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    tracing::warn!("Rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    // ===== Scraped Records =====

    fn upsert_user(&mut self, profile: &UserProfile) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO users (username, display_name, reviews_written, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(username) DO UPDATE SET
                display_name = COALESCE(excluded.display_name, users.display_name),
                reviews_written = excluded.reviews_written,
                updated_at = excluded.updated_at",
            params![
                profile.username,
                profile.display_name,
                profile.reviews_written,
                now
            ],
        )?;
        Ok(())
    }

    fn upsert_films(&mut self, films: &[(&str, &str)]) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.savepoint()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO films (film_identifier, display_name, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(film_identifier) DO UPDATE SET
                    display_name = excluded.display_name,
                    updated_at = excluded.updated_at",
            )?;
            for (film_identifier, display_name) in films {
                stmt.execute(params![film_identifier, display_name, now])?;
            }
        }
        tx.commit()?;
        Ok(films.len())
    }

    fn upsert_user_films(
        &mut self,
        username: &str,
        statuses: &[UserFilmStatus],
    ) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.savepoint()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO user_films
                    (username, film_identifier, watched, in_watchlist, rating, liked, has_review, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(username, film_identifier) DO UPDATE SET
                    watched = excluded.watched,
                    in_watchlist = excluded.in_watchlist,
                    rating = excluded.rating,
                    liked = excluded.liked,
                    has_review = excluded.has_review,
                    updated_at = excluded.updated_at",
            )?;
            for status in statuses {
                stmt.execute(params![
                    username,
                    status.film_identifier,
                    status.watched,
                    status.in_watchlist,
                    status.rating,
                    status.liked,
                    status.has_review,
                    now
                ])?;
            }
        }
        tx.commit()?;
        Ok(statuses.len())
    }

    fn upsert_liked_reviews(
        &mut self,
        username: &str,
        reviews: &[ReviewRecord],
    ) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.savepoint()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO liked_reviews (username, review_url, reviewer, film_title, rating, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(username, review_url) DO UPDATE SET
                    reviewer = excluded.reviewer,
                    film_title = excluded.film_title,
                    rating = excluded.rating,
                    updated_at = excluded.updated_at",
            )?;
            for review in reviews {
                stmt.execute(params![
                    username,
                    review.review_url,
                    review.reviewer,
                    review.film_title,
                    review.rating,
                    now
                ])?;
            }
        }
        tx.commit()?;
        Ok(reviews.len())
    }

    fn upsert_liked_review_counts(
        &mut self,
        username: &str,
        counts: &[LikedReviewCount],
    ) -> StorageResult<usize> {
        let tx = self.conn.savepoint()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO liked_review_counts (username, author, liked_count) VALUES (?1, ?2, ?3)
                 ON CONFLICT(username, author) DO UPDATE SET liked_count = excluded.liked_count",
            )?;
            for count in counts {
                stmt.execute(params![username, count.author, count.liked_count])?;
            }
        }
        tx.commit()?;
        Ok(counts.len())
    }

    fn upsert_follows(&mut self, edges: &[PersonEdge]) -> StorageResult<usize> {
        let tx = self.conn.savepoint()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO user_follows (username, other, kind) VALUES (?1, ?2, ?3)
                 ON CONFLICT(username, other, kind) DO NOTHING",
            )?;
            for edge in edges {
                stmt.execute(params![edge.username, edge.other, edge.kind.to_db_string()])?;
            }
        }
        tx.commit()?;
        Ok(edges.len())
    }

    fn upsert_user_mutuals(&mut self, username: &str, mutuals: &[String]) -> StorageResult<usize> {
        let mut written = 0;
        let tx = self.conn.savepoint()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO user_mutuals (username, mutual) VALUES (?1, ?2)
                 ON CONFLICT(username, mutual) DO NOTHING",
            )?;
            for mutual in mutuals {
                let mutual = mutual.trim();
                if mutual.is_empty() || mutual.eq_ignore_ascii_case(username) {
                    continue;
                }
                stmt.execute(params![username, mutual])?;
                written += 1;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    // ===== Queries =====

    fn get_user(&self, username: &str) -> StorageResult<Option<UserProfile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT username, display_name, reviews_written FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok(UserProfile {
                        username: row.get(0)?,
                        display_name: row.get(1)?,
                        reviews_written: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(profile)
    }

    fn get_user_films(&self, username: &str) -> StorageResult<Vec<UserFilmStatus>> {
        let mut stmt = self.conn.prepare(
            "SELECT film_identifier, watched, in_watchlist, rating, liked, has_review
             FROM user_films WHERE username = ?1 ORDER BY film_identifier",
        )?;

        let statuses = stmt
            .query_map(params![username], |row| {
                Ok(UserFilmStatus {
                    film_identifier: row.get(0)?,
                    watched: row.get(1)?,
                    in_watchlist: row.get(2)?,
                    rating: row.get(3)?,
                    liked: row.get(4)?,
                    has_review: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(statuses)
    }

    fn get_liked_review_counts(&self, username: &str) -> StorageResult<Vec<LikedReviewCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT author, liked_count FROM liked_review_counts
             WHERE username = ?1 ORDER BY liked_count DESC, author",
        )?;

        let counts = stmt
            .query_map(params![username], |row| {
                Ok(LikedReviewCount {
                    author: row.get(0)?,
                    liked_count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn get_mutuals(&self, username: &str) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT mutual FROM user_mutuals WHERE username = ?1 ORDER BY mutual")?;

        let mutuals = stmt
            .query_map(params![username], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(mutuals)
    }

    // ===== Statistics =====

    fn count_rows(&self, table: Table) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EdgeKind;

    fn status(id: &str, rating: Option<f64>) -> UserFilmStatus {
        UserFilmStatus {
            film_identifier: id.to_string(),
            watched: true,
            in_watchlist: false,
            rating,
            liked: false,
            has_review: false,
        }
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_and_complete_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("jane", "test_hash").unwrap();
        assert!(run_id > 0);

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.feed_status, None);

        storage
            .complete_run(run_id, FeedStatus::UserNotFound)
            .unwrap();
        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.feed_status, Some(FeedStatus::UserNotFound));
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_missing_run() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.get_run(99),
            Err(StorageError::RunNotFound(99))
        ));
    }

    #[test]
    fn test_recent_runs_newest_first() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.create_run("a", "h").unwrap();
        storage.create_run("b", "h").unwrap();
        storage.create_run("c", "h").unwrap();

        let runs = storage.get_recent_runs(2).unwrap();
        let names: Vec<_> = runs.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[test]
    fn test_upsert_user_keeps_known_display_name() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_user(&UserProfile {
                username: "jane".to_string(),
                display_name: Some("Jane".to_string()),
                reviews_written: 3,
            })
            .unwrap();
        storage
            .upsert_user(&UserProfile {
                username: "jane".to_string(),
                display_name: None,
                reviews_written: 5,
            })
            .unwrap();

        let user = storage.get_user("jane").unwrap().unwrap();
        assert_eq!(user.display_name, Some("Jane".to_string()));
        assert_eq!(user.reviews_written, 5);
        assert_eq!(storage.count_rows(Table::Users).unwrap(), 1);
    }

    #[test]
    fn test_upsert_user_films_updates_in_place() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_user_films("jane", &[status("heat", None), status("ran", Some(4.5))])
            .unwrap();
        storage
            .upsert_user_films("jane", &[status("heat", Some(3.0))])
            .unwrap();

        let films = storage.get_user_films("jane").unwrap();
        assert_eq!(films.len(), 2);
        assert_eq!(films[0].film_identifier, "heat");
        assert_eq!(films[0].rating, Some(3.0));
        assert_eq!(films[1].rating, Some(4.5));
    }

    #[test]
    fn test_absent_rating_stored_as_null() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_user_films("jane", &[status("heat", None)])
            .unwrap();

        let nulls: i64 = storage
            .conn
            .query_row(
                "SELECT COUNT(*) FROM user_films WHERE rating IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(nulls, 1);
    }

    #[test]
    fn test_upsert_films() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_films(&[("heat", "heat"), ("ran", "Ran")])
            .unwrap();
        storage.upsert_films(&[("heat", "Heat (1995)")]).unwrap();
        assert_eq!(storage.count_rows(Table::Films).unwrap(), 2);
    }

    #[test]
    fn test_liked_reviews_keyed_by_url() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let review = ReviewRecord {
            reviewer: "bob".to_string(),
            film_title: "Heat".to_string(),
            rating: Some(4.0),
            review_url: "https://letterboxd.com/bob/film/heat/".to_string(),
        };

        storage
            .upsert_liked_reviews("jane", &[review.clone(), review])
            .unwrap();
        assert_eq!(storage.count_rows(Table::LikedReviews).unwrap(), 1);
    }

    #[test]
    fn test_liked_review_counts() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_liked_review_counts(
                "jane",
                &[
                    LikedReviewCount {
                        author: "amy".to_string(),
                        liked_count: 1,
                    },
                    LikedReviewCount {
                        author: "bob".to_string(),
                        liked_count: 4,
                    },
                ],
            )
            .unwrap();

        let counts = storage.get_liked_review_counts("jane").unwrap();
        assert_eq!(counts[0].author, "bob");
        assert_eq!(counts[0].liked_count, 4);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_follow_edges_deduplicated() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let edge = PersonEdge {
            username: "jane".to_string(),
            other: "amy".to_string(),
            kind: EdgeKind::Follower,
        };
        let reverse = PersonEdge {
            kind: EdgeKind::Following,
            ..edge.clone()
        };

        storage
            .upsert_follows(&[edge.clone(), edge, reverse])
            .unwrap();
        assert_eq!(storage.count_rows(Table::UserFollows).unwrap(), 2);
    }

    #[test]
    fn test_mutuals_skip_empty_and_self() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let written = storage
            .upsert_user_mutuals(
                "jane",
                &[
                    "amy".to_string(),
                    "".to_string(),
                    "Jane".to_string(),
                    "zed".to_string(),
                ],
            )
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(storage.get_mutuals("jane").unwrap(), vec!["amy", "zed"]);
    }

    #[test]
    fn test_write_atomically_rolls_back_on_error() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        let result = storage.write_atomically(&mut |tx: &mut dyn Storage| {
            tx.upsert_films(&[("heat", "Heat")])?;
            tx.upsert_user_mutuals("jane", &["bob".to_string()])?;
            Err(StorageError::RunNotFound(7))
        });

        assert!(matches!(result, Err(StorageError::RunNotFound(7))));
        assert_eq!(storage.count_rows(Table::Films).unwrap(), 0);
        assert_eq!(storage.count_rows(Table::UserMutuals).unwrap(), 0);
    }

    #[test]
    fn test_write_atomically_commits() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        storage
            .write_atomically(&mut |tx: &mut dyn Storage| {
                tx.upsert_films(&[("heat", "Heat"), ("ran", "Ran")])?;
                Ok(())
            })
            .unwrap();

        assert_eq!(storage.count_rows(Table::Films).unwrap(), 2);
    }

    #[test]
    fn test_count_rows_empty() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        for table in Table::ALL {
            assert_eq!(storage.count_rows(table).unwrap(), 0);
        }
    }
}
