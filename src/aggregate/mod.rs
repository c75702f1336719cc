//! Cross-feed aggregation
//!
//! Pure functions that join the records of several feeds. Nothing here
//! fetches or mutates its inputs.

use crate::model::{FilmFact, LikedReviewCount, ReviewRecord, UserFilmStatus, WatchlistEntry};
use std::collections::{BTreeSet, HashMap};

/// Joins the ratings and watchlist feeds into per-film statuses
///
/// Emits one record per ratings entry (`watched = true`) followed by one
/// per watchlist entry (`watched = false`, `in_watchlist = true`). A film
/// present in both feeds yields two records; use
/// [`consolidate_user_films`] to key them by film.
pub fn merge_user_film(ratings: &[FilmFact], watchlist: &[WatchlistEntry]) -> Vec<UserFilmStatus> {
    let watched = ratings.iter().map(|film| UserFilmStatus {
        film_identifier: film.film_identifier.clone(),
        watched: true,
        in_watchlist: false,
        rating: film.rating,
        liked: film.liked,
        has_review: film.reviewed,
    });

    let wanted = watchlist.iter().map(|entry| UserFilmStatus {
        film_identifier: entry.film_identifier.clone(),
        watched: false,
        in_watchlist: true,
        rating: None,
        liked: false,
        has_review: false,
    });

    watched.chain(wanted).collect()
}

/// Collapses statuses to one per film
///
/// Watched facts take precedence: the first known rating wins and the
/// liked and reviewed flags are OR-ed, as are `watched` and `in_watchlist`.
/// First-seen film order is kept.
pub fn consolidate_user_films(statuses: Vec<UserFilmStatus>) -> Vec<UserFilmStatus> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<UserFilmStatus> = Vec::new();

    for status in statuses {
        match index.get(&status.film_identifier) {
            Some(&at) => {
                let existing = &mut merged[at];
                existing.watched |= status.watched;
                existing.in_watchlist |= status.in_watchlist;
                existing.liked |= status.liked;
                existing.has_review |= status.has_review;
                if existing.rating.is_none() {
                    existing.rating = status.rating;
                }
            }
            None => {
                index.insert(status.film_identifier.clone(), merged.len());
                merged.push(status);
            }
        }
    }

    merged
}

/// Usernames present in both lists, sorted and unique
///
/// # Examples
///
/// ```
/// use boxd_taste::compute_mutuals;
///
/// let followers = ["a", "b", "c"].map(String::from);
/// let following = ["b", "c", "d"].map(String::from);
/// assert_eq!(compute_mutuals(&followers, &following), vec!["b", "c"]);
/// ```
pub fn compute_mutuals(followers: &[String], following: &[String]) -> Vec<String> {
    let followers: BTreeSet<&String> = followers.iter().collect();
    let following: BTreeSet<&String> = following.iter().collect();

    followers
        .intersection(&following)
        .map(|name| (*name).clone())
        .collect()
}

/// Number of liked reviews per author
///
/// Sorted by count, highest first, then by author.
pub fn count_liked_reviews(reviews: &[ReviewRecord]) -> Vec<LikedReviewCount> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for review in reviews {
        *counts.entry(review.reviewer.as_str()).or_insert(0) += 1;
    }

    let mut counts: Vec<LikedReviewCount> = counts
        .into_iter()
        .map(|(author, liked_count)| LikedReviewCount {
            author: author.to_string(),
            liked_count,
        })
        .collect();

    counts.sort_by(|a, b| {
        b.liked_count
            .cmp(&a.liked_count)
            .then_with(|| a.author.cmp(&b.author))
    });
    counts
}
