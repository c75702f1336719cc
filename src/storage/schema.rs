//! Database schema definitions
//!
//! Every table is keyed by the natural identifiers of the records it holds,
//! so re-scraping a user updates rows in place.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track scrape runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    feed_status TEXT
);

CREATE INDEX IF NOT EXISTS idx_runs_username ON runs(username);

-- Scraped members
CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    display_name TEXT,
    reviews_written INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

-- Films seen in any feed
CREATE TABLE IF NOT EXISTS films (
    film_identifier TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Per-(user, film) status; rating is NULL when absent
CREATE TABLE IF NOT EXISTS user_films (
    username TEXT NOT NULL,
    film_identifier TEXT NOT NULL,
    watched INTEGER NOT NULL,
    in_watchlist INTEGER NOT NULL,
    rating REAL,
    liked INTEGER NOT NULL,
    has_review INTEGER NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (username, film_identifier)
);

CREATE INDEX IF NOT EXISTS idx_user_films_film ON user_films(film_identifier);

-- Reviews a user liked, keyed by canonical permalink
CREATE TABLE IF NOT EXISTS liked_reviews (
    username TEXT NOT NULL,
    review_url TEXT NOT NULL,
    reviewer TEXT NOT NULL,
    film_title TEXT NOT NULL,
    rating REAL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (username, review_url)
);

-- Liked reviews per author
CREATE TABLE IF NOT EXISTS liked_review_counts (
    username TEXT NOT NULL,
    author TEXT NOT NULL,
    liked_count INTEGER NOT NULL,
    PRIMARY KEY (username, author)
);

-- Follow graph edges
CREATE TABLE IF NOT EXISTS user_follows (
    username TEXT NOT NULL,
    other TEXT NOT NULL,
    kind TEXT NOT NULL,
    PRIMARY KEY (username, other, kind)
);

-- Users who follow each other
CREATE TABLE IF NOT EXISTS user_mutuals (
    username TEXT NOT NULL,
    mutual TEXT NOT NULL,
    PRIMARY KEY (username, mutual)
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Table;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        let result = initialize_schema(&conn);
        assert!(result.is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in Table::ALL {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table.name()],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table.name());
        }
    }
}
