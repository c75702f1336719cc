//! Per-feed crawlers
//!
//! Each public entry point takes the session's `BoundedFetcher` and the
//! site's `SiteUrls`, checks the username through the shared gate, walks
//! its feed with the matching pagination strategy, and returns the
//! de-duplicated records with the feed's terminal status.

mod likes;
mod people;
mod profile;
mod ratings;
mod watchlist;

pub use likes::{crawl_liked_review_urls, crawl_liked_reviews, hydrate_reviews};
pub use people::{crawl_followers, crawl_following, crawl_people, person_edges};
pub use profile::{estimate_reviews_written, scrape_profile};
pub use ratings::{crawl_ratings, crawl_reviewed_films};
pub use watchlist::crawl_watchlist;

use crate::url::validate_username;
use std::collections::HashSet;
use std::hash::Hash;

/// Runs the username gate, logging rejections
fn username_ok(username: &str) -> bool {
    match validate_username(username) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Refusing to crawl: {}", e);
            false
        }
    }
}

/// Keeps the first record for each key, preserving order
fn dedup_by_key<T, K: Eq + Hash>(records: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(key(record)))
        .collect()
}
