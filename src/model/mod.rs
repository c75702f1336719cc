//! Typed records produced by the scrapers
//!
//! Every identifier-bearing record carries a non-empty identifier; the
//! extractors drop anything they cannot identify instead of emitting a
//! blank key. Ratings are stars out of five in half-star steps, with
//! `None` meaning "absent or unparseable" (never zero).

use std::fmt;

/// Display form of an absent rating
pub const RATING_SENTINEL: f64 = -1.0;

/// Title used when no title can be recovered from a review page
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Username used when a review permalink has no believable reviewer
pub const UNKNOWN_REVIEWER: &str = "unknown";

/// Returns the rating, or the `-1` sentinel when absent
pub fn rating_or_sentinel(rating: Option<f64>) -> f64 {
    rating.unwrap_or(RATING_SENTINEL)
}

/// One film from a user's ratings feed
#[derive(Debug, Clone, PartialEq)]
pub struct FilmFact {
    /// Site-local slug, the natural key
    pub film_identifier: String,
    pub display_name: String,
    pub rating: Option<f64>,
    pub liked: bool,
    pub reviewed: bool,
}

/// One film from a user's watchlist ("not yet watched")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchlistEntry {
    pub film_identifier: String,
    pub display_name: String,
}

/// Per-(user, film) view joining the ratings and watchlist feeds
#[derive(Debug, Clone, PartialEq)]
pub struct UserFilmStatus {
    pub film_identifier: String,
    pub watched: bool,
    pub in_watchlist: bool,
    pub rating: Option<f64>,
    pub liked: bool,
    pub has_review: bool,
}

/// A review the user liked, hydrated from its permalink page
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub reviewer: String,
    pub film_title: String,
    pub rating: Option<f64>,
    /// Canonical permalink, the natural key
    pub review_url: String,
}

/// Number of liked reviews written by one author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikedReviewCount {
    pub author: String,
    pub liked_count: u32,
}

/// Direction of a follow relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// `other` follows the user
    Follower,
    /// The user follows `other`
    Following,
}

impl EdgeKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Follower => "follower",
            Self::Following => "following",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "follower" => Some(Self::Follower),
            "following" => Some(Self::Following),
            _ => None,
        }
    }
}

/// A follower/following relationship between two usernames
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PersonEdge {
    pub username: String,
    pub other: String,
    pub kind: EdgeKind,
}

/// Profile facts scraped from a user's landing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub display_name: Option<String>,
    pub reviews_written: u32,
}

/// Total pages in a feed
///
/// Feeds that advertise a page count are walked by number; the rest follow
/// "next" links until they run out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCount {
    Known(u32),
    Unknown,
}

impl fmt::Display for PageCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(n) => write!(f, "{}", n),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
