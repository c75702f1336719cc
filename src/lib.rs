//! boxd-taste: a scraper for film-diary profiles
//!
//! This crate walks a user's public ratings, watchlist, liked reviews and
//! follower graph, normalizes what it finds into typed records, and hands
//! them to a relational sink for later taste comparison between users.

pub mod aggregate;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod model;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for boxd-taste operations
///
/// Scraping failures never surface here: a page that cannot be fetched or
/// parsed degrades into an absent value. What remains are the conditions
/// that stop the program outright.
#[derive(Debug, Error)]
pub enum TasteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid header value for {name}: {value}")]
    InvalidHeader { name: &'static str, value: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),
}

/// Result type alias for boxd-taste operations
pub type Result<T> = std::result::Result<T, TasteError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use aggregate::{compute_mutuals, merge_user_film};
pub use config::Config;
pub use model::{FilmFact, ReviewRecord, UserFilmStatus, WatchlistEntry};
pub use state::FeedStatus;
pub use url::{canonicalize_url, validate_username};
