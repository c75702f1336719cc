use super::{dedup_by_key, username_ok};
use crate::crawler::fetcher::BoundedFetcher;
use crate::crawler::paginator::crawl_known_total;
use crate::extract::{parse_ratings_page, parse_reviewed_films_page};
use crate::model::FilmFact;
use crate::state::FeedResult;
use crate::url::{FeedKind, SiteUrls};
use std::collections::HashSet;

/// Crawls a user's ratings feed
///
/// The reviewed-films feed is walked alongside it and each film's
/// `reviewed` flag is set by membership. A reviewed-films feed that cannot
/// be read leaves every flag false; it never changes the ratings status.
pub async fn crawl_ratings(
    fetcher: &BoundedFetcher,
    urls: &SiteUrls,
    username: &str,
) -> FeedResult<FilmFact> {
    if !username_ok(username) {
        return FeedResult::bad_username();
    }

    let (ratings, reviewed) = tokio::join!(
        crawl_known_total(fetcher, urls, username, FeedKind::Ratings, parse_ratings_page),
        crawl_reviewed_films(fetcher, urls, username),
    );

    let reviewed: HashSet<String> = reviewed.records.into_iter().collect();

    let result = ratings.map(|films| {
        dedup_by_key(films, |film| film.film_identifier.clone())
            .into_iter()
            .map(|mut film| {
                film.reviewed = reviewed.contains(&film.film_identifier);
                film
            })
            .collect()
    });

    tracing::info!(
        "Ratings for {}: {} film(s), {} reviewed ({})",
        username,
        result.records.len(),
        result.records.iter().filter(|f| f.reviewed).count(),
        result.status
    );
    result
}

/// Crawls the identifiers of every film a user has reviewed
///
/// Identifiers come back sorted.
pub async fn crawl_reviewed_films(
    fetcher: &BoundedFetcher,
    urls: &SiteUrls,
    username: &str,
) -> FeedResult<String> {
    if !username_ok(username) {
        return FeedResult::bad_username();
    }

    let result = crawl_known_total(fetcher, urls, username, FeedKind::ReviewedFilms, |body| {
        parse_reviewed_films_page(body)
            .into_iter()
            .collect::<Vec<String>>()
    })
    .await;

    result.map(|mut ids| {
        ids.sort();
        ids.dedup();
        ids
    })
}
