//! Liked reviews: a two-phase crawl
//!
//! Phase one follows the likes feed's next links and collects review
//! permalinks. Phase two fetches every permalink, under the same session
//! ceiling, and parses each into a `ReviewRecord`.

use super::{dedup_by_key, username_ok};
use crate::crawler::fetcher::BoundedFetcher;
use crate::crawler::paginator::crawl_feed;
use crate::extract::{extract_review_urls, parse_review_detail};
use crate::model::ReviewRecord;
use crate::state::FeedResult;
use crate::url::{FeedKind, SiteUrls};
use url::Url;

/// Collects the canonical permalinks of every review `username` liked
pub async fn crawl_liked_review_urls(
    fetcher: &BoundedFetcher,
    urls: &SiteUrls,
    username: &str,
) -> FeedResult<String> {
    if !username_ok(username) {
        return FeedResult::bad_username();
    }

    crawl_feed(fetcher, urls, username, FeedKind::LikedReviews, extract_review_urls)
        .await
        .map(|found| dedup_by_key(found, |url| url.clone()))
}

/// Fetches and parses each review permalink
///
/// Permalinks that fail to fetch, come back not-found, or are not review
/// pages are dropped. Output order follows `review_urls`.
pub async fn hydrate_reviews(fetcher: &BoundedFetcher, review_urls: &[String]) -> Vec<ReviewRecord> {
    let targets: Vec<Url> = review_urls
        .iter()
        .filter_map(|raw| match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!("Skipping unparseable review URL {}: {}", raw, e);
                None
            }
        })
        .collect();

    let pages = fetcher.fetch_pages(&targets).await;

    targets
        .iter()
        .zip(pages)
        .filter_map(|(url, page)| {
            let page = page?;
            if page.is_not_found() {
                tracing::debug!("Review {} no longer exists", url);
                return None;
            }
            parse_review_detail(&page.body, url)
        })
        .collect()
}

/// Crawls and hydrates every review `username` liked
pub async fn crawl_liked_reviews(
    fetcher: &BoundedFetcher,
    urls: &SiteUrls,
    username: &str,
) -> FeedResult<ReviewRecord> {
    let discovered = crawl_liked_review_urls(fetcher, urls, username).await;
    if !discovered.is_success() {
        return FeedResult {
            status: discovered.status,
            records: Vec::new(),
        };
    }

    tracing::debug!(
        "Hydrating {} liked review(s) for {}",
        discovered.records.len(),
        username
    );
    let reviews = hydrate_reviews(fetcher, &discovered.records).await;

    tracing::info!(
        "Liked reviews for {}: {} of {} hydrated",
        username,
        reviews.len(),
        discovered.records.len()
    );
    FeedResult::success(reviews)
}
