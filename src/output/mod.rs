//! Output module for console rendering of scrape results
//!
//! This module handles:
//! - Rendering per-feed records as plain text
//! - Rendering a whole `UserSnapshot`
//! - Database statistics (see `stats`)
//!
//! Absent ratings are shown as the `-1` sentinel.

pub mod stats;

pub use stats::{load_statistics, print_statistics, ScrapeStatistics};

use crate::crawler::UserSnapshot;
use crate::model::{
    rating_or_sentinel, FilmFact, LikedReviewCount, ReviewRecord, UserFilmStatus, UserProfile,
    WatchlistEntry,
};

/// Formats a rating for display, `-1` when absent
pub fn format_rating(rating: Option<f64>) -> String {
    let value = rating_or_sentinel(rating);
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

fn flag(set: bool, mark: &'static str) -> &'static str {
    if set {
        mark
    } else {
        ""
    }
}

fn heading(title: &str, count: usize) -> String {
    format!("{} ({}):", title, count)
}

/// Renders the ratings feed, one film per line
pub fn render_films(films: &[FilmFact]) -> String {
    let mut lines = vec![heading("Films", films.len())];
    for film in films {
        lines.push(format!(
            "  {} [{}] rating={}{}{}",
            film.display_name,
            film.film_identifier,
            format_rating(film.rating),
            flag(film.liked, " liked"),
            flag(film.reviewed, " reviewed"),
        ));
    }
    lines.join("\n")
}

/// Renders the watchlist feed
pub fn render_watchlist(entries: &[WatchlistEntry]) -> String {
    let mut lines = vec![heading("Watchlist", entries.len())];
    for entry in entries {
        lines.push(format!("  {} [{}]", entry.display_name, entry.film_identifier));
    }
    lines.join("\n")
}

/// Renders merged per-film statuses
pub fn render_user_films(statuses: &[UserFilmStatus]) -> String {
    let mut lines = vec![heading("Per-film status", statuses.len())];
    for status in statuses {
        lines.push(format!(
            "  {} watched={} watchlist={} rating={} liked={} review={}",
            status.film_identifier,
            status.watched,
            status.in_watchlist,
            format_rating(status.rating),
            status.liked,
            status.has_review,
        ));
    }
    lines.join("\n")
}

/// Renders hydrated liked reviews
pub fn render_reviews(reviews: &[ReviewRecord]) -> String {
    let mut lines = vec![heading("Liked reviews", reviews.len())];
    for review in reviews {
        lines.push(format!(
            "  {} on {} rating={} <{}>",
            review.reviewer,
            review.film_title,
            format_rating(review.rating),
            review.review_url,
        ));
    }
    lines.join("\n")
}

/// Renders liked-review counts per author
pub fn render_liked_counts(counts: &[LikedReviewCount]) -> String {
    let mut lines = vec![heading("Liked authors", counts.len())];
    for count in counts {
        lines.push(format!("  {}: {}", count.author, count.liked_count));
    }
    lines.join("\n")
}

/// Renders a list of usernames under a title
pub fn render_people(title: &str, names: &[String]) -> String {
    let mut lines = vec![heading(title, names.len())];
    lines.extend(names.iter().map(|name| format!("  {}", name)));
    lines.join("\n")
}

/// Renders profile facts
pub fn render_profile(profile: &UserProfile) -> String {
    format!(
        "Profile:\n  username: {}\n  display name: {}\n  reviews written: {}",
        profile.username,
        profile.display_name.as_deref().unwrap_or("-"),
        profile.reviews_written,
    )
}

/// Renders everything scraped for one user
pub fn render_snapshot(snapshot: &UserSnapshot) -> String {
    let mut sections = vec![format!(
        "=== {} ({}) ===",
        snapshot.username, snapshot.status
    )];

    if !snapshot.status.is_success() {
        return sections.join("\n");
    }

    sections.push(render_profile(&snapshot.profile));
    sections.push(render_films(&snapshot.films));
    sections.push(render_watchlist(&snapshot.watchlist));
    sections.push(render_user_films(&snapshot.user_films));
    sections.push(render_reviews(&snapshot.liked_reviews));
    sections.push(render_liked_counts(&snapshot.liked_counts));
    sections.push(render_people("Followers", &snapshot.followers));
    sections.push(render_people("Following", &snapshot.following));
    sections.push(render_people("Mutuals", &snapshot.mutuals));

    sections.join("\n\n")
}

/// Prints a snapshot to stdout
pub fn print_snapshot(snapshot: &UserSnapshot) {
    println!("{}\n", render_snapshot(snapshot));
}
