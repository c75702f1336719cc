//! Pagination strategies
//!
//! Feeds that advertise their page count are fetched by number, pages 2..N
//! concurrently. Feeds that do not are walked one "next" link at a time,
//! with a seen-set of canonical URLs guarding against cycles.

use super::fetcher::{BoundedFetcher, FetchedPage};
use crate::extract::{find_next_page_url, parse_page_count};
use crate::model::PageCount;
use crate::state::{FeedResult, FeedStatus};
use crate::url::{canonicalize_absolute, FeedKind, SiteUrls};
use std::collections::HashSet;
use url::Url;

/// Pages fetched from a feed with a known page count
#[derive(Debug)]
pub struct PageSet {
    pub status: FeedStatus,
    /// Page count advertised by page 1, `Unknown` when page 1 was not read
    pub page_count: PageCount,
    /// Fetched pages with their page numbers; failed fetches are absent
    pub pages: Vec<(u32, FetchedPage)>,
}

impl PageSet {
    fn empty(status: FeedStatus) -> Self {
        Self {
            status,
            page_count: PageCount::Unknown,
            pages: Vec::new(),
        }
    }
}

/// Fetches every page of a feed that advertises its page count
///
/// Page 1 is fetched first and reused for its own records. If it reports
/// N pages, pages 2..=N are then fetched concurrently, so exactly N-1
/// further requests are made.
///
/// # Arguments
///
/// * `fetcher` - The session's bounded fetcher
/// * `urls` - URL templates for the site
/// * `username` - An already validated username
/// * `kind` - The feed to walk
///
/// # Returns
///
/// * `UserNotFound` - Page 1 is the site's not-found page
/// * `Success` with no pages - Page 1 could not be fetched
/// * `Success` - Whatever pages could be fetched
pub async fn fetch_known_total(
    fetcher: &BoundedFetcher,
    urls: &SiteUrls,
    username: &str,
    kind: FeedKind,
) -> PageSet {
    let first_url = urls.feed(username, kind, 1);

    let Some(first) = fetcher.fetch_page(&first_url).await else {
        tracing::warn!("Could not fetch page 1 of {} for {}", kind.path(), username);
        return PageSet::empty(FeedStatus::Success);
    };

    if first.is_not_found() {
        tracing::info!("User {} not found ({})", username, first_url);
        return PageSet::empty(FeedStatus::UserNotFound);
    }

    let page_count = parse_page_count(&first.body);
    tracing::debug!("{} for {}: {} page(s)", kind.path(), username, page_count);

    let rest: Vec<Url> = (2..=page_count)
        .map(|page| urls.feed(username, kind, page))
        .collect();

    let mut pages = vec![(1, first)];
    let fetched = fetcher.fetch_pages(&rest).await;
    for (page, result) in (2..=page_count).zip(fetched) {
        if let Some(fetched_page) = result {
            pages.push((page, fetched_page));
        }
    }

    PageSet {
        status: FeedStatus::Success,
        page_count: PageCount::Known(page_count),
        pages,
    }
}

/// Walks any feed with the strategy its kind calls for
///
/// Feeds that advertise a page count go through `fetch_known_total`; the
/// rest are walked by `crawl_next_links` from page 1. Each page's records
/// come from `parse(body, page_url)`.
pub async fn crawl_feed<T>(
    fetcher: &BoundedFetcher,
    urls: &SiteUrls,
    username: &str,
    kind: FeedKind,
    parse: impl Fn(&str, &Url) -> Vec<T>,
) -> FeedResult<T> {
    if !kind.advertises_page_count() {
        let start = urls.feed(username, kind, 1);
        return crawl_next_links(fetcher, start, &kind.pagination_fragment(), parse).await;
    }

    let page_set = fetch_known_total(fetcher, urls, username, kind).await;
    let records = page_set
        .pages
        .iter()
        .flat_map(|(_, page)| parse(&page.body, &page.url))
        .collect();

    FeedResult {
        status: page_set.status,
        records,
    }
}

/// Walks a known-total feed and flattens each page's records
///
/// Record order follows page order, but callers must not depend on it.
pub async fn crawl_known_total<T>(
    fetcher: &BoundedFetcher,
    urls: &SiteUrls,
    username: &str,
    kind: FeedKind,
    parse: impl Fn(&str) -> Vec<T>,
) -> FeedResult<T> {
    let page_set = fetch_known_total(fetcher, urls, username, kind).await;

    let records = page_set
        .pages
        .iter()
        .flat_map(|(_, page)| parse(&page.body))
        .collect();

    FeedResult {
        status: page_set.status,
        records,
    }
}

/// Walks a feed by following its "next" links from `start`
///
/// Each page's records come from `parse(body, page_url)`. The walk ends
/// when a page has no next link, a fetch fails, or a next link leads back
/// to an already-visited canonical URL; records collected up to that point
/// are kept.
///
/// # Arguments
///
/// * `fetcher` - The session's bounded fetcher
/// * `start` - URL of the first page
/// * `fragment` - Path fragment shared by the feed's numbered pages
/// * `parse` - Extracts records from one page
pub async fn crawl_next_links<T>(
    fetcher: &BoundedFetcher,
    start: Url,
    fragment: &str,
    parse: impl Fn(&str, &Url) -> Vec<T>,
) -> FeedResult<T> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();
    let mut next = Some(canonicalize_absolute(start));
    let mut pages_walked = 0usize;

    while let Some(url) = next.take() {
        if !seen.insert(url.to_string()) {
            tracing::debug!("Pagination cycle at {}, stopping", url);
            break;
        }

        let Some(page) = fetcher.fetch_page(&url).await else {
            break;
        };

        if page.is_not_found() {
            if pages_walked == 0 {
                tracing::info!("Feed not found at {}", url);
                return FeedResult::user_not_found();
            }
            break;
        }

        records.extend(parse(&page.body, &page.url));
        pages_walked += 1;

        next = find_next_page_url(&page.body, &page.url, fragment).map(canonicalize_absolute);
    }

    tracing::debug!("Walked {} page(s) from next links", pages_walked);
    FeedResult::success(records)
}
