//! Crawler module for fetching and walking user feeds
//!
//! This module contains the scraping pipeline, including:
//! - Bounded HTTP fetching under one per-session ceiling
//! - Pagination by advertised page count or by "next" links
//! - One crawler per feed kind
//! - Per-user coordination and persistence

mod coordinator;
pub mod feeds;
mod fetcher;
mod paginator;

pub use coordinator::{write_snapshot, Coordinator, UserSnapshot};
pub use feeds::{
    crawl_followers, crawl_following, crawl_liked_review_urls, crawl_liked_reviews,
    crawl_ratings, crawl_reviewed_films, crawl_watchlist, hydrate_reviews, scrape_profile,
};
pub use fetcher::{build_http_client, BoundedFetcher, FetchResult, FetchedPage};
pub use paginator::{crawl_feed, crawl_known_total, crawl_next_links, fetch_known_total, PageSet};
