use super::{dedup_by_key, username_ok};
use crate::crawler::fetcher::BoundedFetcher;
use crate::crawler::paginator::crawl_feed;
use crate::extract::parse_watchlist_page;
use crate::model::WatchlistEntry;
use crate::state::FeedResult;
use crate::url::{FeedKind, SiteUrls};

/// Crawls a user's watchlist
pub async fn crawl_watchlist(
    fetcher: &BoundedFetcher,
    urls: &SiteUrls,
    username: &str,
) -> FeedResult<WatchlistEntry> {
    if !username_ok(username) {
        return FeedResult::bad_username();
    }

    let result = crawl_feed(fetcher, urls, username, FeedKind::Watchlist, |body, _| {
        parse_watchlist_page(body)
    })
    .await
    .map(|entries| dedup_by_key(entries, |entry| entry.film_identifier.clone()));

    tracing::info!(
        "Watchlist for {}: {} film(s) ({})",
        username,
        result.records.len(),
        result.status
    );
    result
}
