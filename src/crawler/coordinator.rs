//! Scrape coordinator - per-user orchestration
//!
//! This module ties the feed crawlers together:
//! - Scraping every feed of one user into a `UserSnapshot`
//! - Joining the feeds through the aggregator
//! - Persisting snapshots with run tracking
//! - Optionally fanning out to the user's mutuals

use crate::aggregate::{compute_mutuals, consolidate_user_films, count_liked_reviews, merge_user_film};
use crate::config::Config;
use crate::crawler::feeds::{
    crawl_followers, crawl_following, crawl_liked_reviews, crawl_ratings, crawl_watchlist,
    person_edges, scrape_profile,
};
use crate::crawler::fetcher::BoundedFetcher;
use crate::model::{
    EdgeKind, FilmFact, LikedReviewCount, ReviewRecord, UserFilmStatus, UserProfile,
    WatchlistEntry,
};
use crate::state::FeedStatus;
use crate::storage::{RunStatus, SqliteStorage, Storage, StorageResult};
use crate::url::{validate_username, SiteUrls};
use crate::TasteError;

/// Everything scraped for one user
#[derive(Debug, Clone, PartialEq)]
pub struct UserSnapshot {
    pub username: String,
    /// First non-success feed status, or `Success`
    pub status: FeedStatus,
    pub profile: UserProfile,
    pub films: Vec<FilmFact>,
    pub watchlist: Vec<WatchlistEntry>,
    /// `merge_user_film` output: one record per ratings and watchlist entry
    pub user_films: Vec<UserFilmStatus>,
    pub liked_reviews: Vec<ReviewRecord>,
    pub liked_counts: Vec<LikedReviewCount>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub mutuals: Vec<String>,
}

impl UserSnapshot {
    fn empty(username: &str, status: FeedStatus) -> Self {
        Self {
            username: username.to_string(),
            status,
            profile: UserProfile {
                username: username.to_string(),
                ..UserProfile::default()
            },
            films: Vec::new(),
            watchlist: Vec::new(),
            user_films: Vec::new(),
            liked_reviews: Vec::new(),
            liked_counts: Vec::new(),
            followers: Vec::new(),
            following: Vec::new(),
            mutuals: Vec::new(),
        }
    }
}

/// Main scrape coordinator structure
///
/// Owns the session's execution context: one `BoundedFetcher` (and so one
/// concurrency ceiling and deadline) shared by every feed it crawls.
pub struct Coordinator {
    urls: SiteUrls,
    fetcher: BoundedFetcher,
    storage: Option<SqliteStorage>,
    config_hash: String,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The scraper configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(TasteError)` - The base URL or HTTP settings were unusable
    pub fn new(config: &Config) -> Result<Self, TasteError> {
        let urls = SiteUrls::new(&config.scraper.base_url)?;
        let fetcher = BoundedFetcher::from_config(config)?;

        Ok(Self {
            urls,
            fetcher,
            storage: None,
            config_hash: String::new(),
        })
    }

    /// Persists every ingested snapshot into `storage`
    ///
    /// `config_hash` is recorded with each run.
    pub fn with_storage(mut self, storage: SqliteStorage, config_hash: impl Into<String>) -> Self {
        self.storage = Some(storage);
        self.config_hash = config_hash.into();
        self
    }

    /// The session's bounded fetcher
    pub fn fetcher(&self) -> &BoundedFetcher {
        &self.fetcher
    }

    /// URL templates for the configured site
    pub fn urls(&self) -> &SiteUrls {
        &self.urls
    }

    /// The attached storage, if any
    pub fn storage(&self) -> Option<&SqliteStorage> {
        self.storage.as_ref()
    }

    /// Scrapes every feed of one user
    ///
    /// The profile is fetched first; a missing user stops there. The
    /// remaining feeds are then crawled concurrently under the session
    /// ceiling and joined.
    pub async fn scrape_user(&self, username: &str) -> UserSnapshot {
        if let Err(e) = validate_username(username) {
            tracing::warn!("Not scraping: {}", e);
            return UserSnapshot::empty(username, FeedStatus::BadUsername);
        }

        tracing::info!("Scraping {}", username);

        let (profile_status, profile) = scrape_profile(&self.fetcher, &self.urls, username).await;
        if profile_status != FeedStatus::Success {
            let mut snapshot = UserSnapshot::empty(username, profile_status);
            snapshot.profile = profile;
            return snapshot;
        }

        let (ratings, watchlist, likes, followers, following) = tokio::join!(
            crawl_ratings(&self.fetcher, &self.urls, username),
            crawl_watchlist(&self.fetcher, &self.urls, username),
            crawl_liked_reviews(&self.fetcher, &self.urls, username),
            crawl_followers(&self.fetcher, &self.urls, username),
            crawl_following(&self.fetcher, &self.urls, username),
        );

        let status = [
            ratings.status,
            watchlist.status,
            likes.status,
            followers.status,
            following.status,
        ]
        .into_iter()
        .find(|status| !status.is_success())
        .unwrap_or(FeedStatus::Success);

        let user_films = merge_user_film(&ratings.records, &watchlist.records);
        let liked_counts = count_liked_reviews(&likes.records);
        let mutuals = compute_mutuals(&followers.records, &following.records);

        tracing::info!(
            "Scraped {}: {} rated, {} watchlisted, {} liked reviews, {} mutuals ({})",
            username,
            ratings.records.len(),
            watchlist.records.len(),
            likes.records.len(),
            mutuals.len(),
            status
        );

        UserSnapshot {
            username: username.to_string(),
            status,
            profile,
            films: ratings.records,
            watchlist: watchlist.records,
            user_films,
            liked_reviews: likes.records,
            liked_counts,
            followers: followers.records,
            following: following.records,
            mutuals,
        }
    }

    /// Scrapes one user and persists the snapshot, if storage is attached
    ///
    /// A run row is opened before scraping and closed with the snapshot's
    /// status. A failed write marks the run failed and is returned.
    pub async fn ingest_user(&mut self, username: &str) -> Result<UserSnapshot, TasteError> {
        let run_id = match self.storage.as_mut() {
            Some(storage) => Some(storage.create_run(username, &self.config_hash)?),
            None => None,
        };

        let snapshot = self.scrape_user(username).await;

        if let (Some(storage), Some(run_id)) = (self.storage.as_mut(), run_id) {
            if let Err(e) = write_snapshot(storage, &snapshot) {
                tracing::error!("Failed to store {}: {}", username, e);
                storage.update_run_status(run_id, RunStatus::Failed)?;
                return Err(e.into());
            }
            storage.complete_run(run_id, snapshot.status)?;
            tracing::debug!("Run {} for {} completed", run_id, username);
        }

        Ok(snapshot)
    }

    /// Ingests a user and, optionally, each of their mutuals
    ///
    /// Mutuals are ingested one after another within the same session. The
    /// first snapshot is always the requested user's.
    pub async fn ingest(
        &mut self,
        username: &str,
        with_mutuals: bool,
    ) -> Result<Vec<UserSnapshot>, TasteError> {
        let root = self.ingest_user(username).await?;
        let fan_out = with_mutuals && root.status.is_success();
        let mutuals = root.mutuals.clone();
        let mut snapshots = vec![root];

        if fan_out {
            tracing::info!("Ingesting {} mutual(s) of {}", mutuals.len(), username);
            for mutual in &mutuals {
                if self.fetcher.deadline_passed() {
                    tracing::warn!("Crawl deadline passed, skipping remaining mutuals");
                    break;
                }
                snapshots.push(self.ingest_user(mutual).await?);
            }
        }

        Ok(snapshots)
    }
}

/// Writes a snapshot's records in one transaction
///
/// Only successful scrapes have records to write. Ratings and watchlist
/// statuses are consolidated to one row per film first. A failed write
/// leaves nothing of the snapshot behind.
pub fn write_snapshot(storage: &mut dyn Storage, snapshot: &UserSnapshot) -> StorageResult<()> {
    if !snapshot.status.is_success() {
        return Ok(());
    }

    storage.write_atomically(&mut |tx: &mut dyn Storage| write_records(tx, snapshot))
}

fn write_records(storage: &mut dyn Storage, snapshot: &UserSnapshot) -> StorageResult<()> {
    let username = snapshot.username.as_str();
    storage.upsert_user(&snapshot.profile)?;

    let titles: Vec<(&str, &str)> = snapshot
        .films
        .iter()
        .map(|f| (f.film_identifier.as_str(), f.display_name.as_str()))
        .chain(
            snapshot
                .watchlist
                .iter()
                .map(|w| (w.film_identifier.as_str(), w.display_name.as_str())),
        )
        .collect();
    storage.upsert_films(&titles)?;

    let user_films = consolidate_user_films(snapshot.user_films.clone());
    storage.upsert_user_films(username, &user_films)?;

    storage.upsert_liked_reviews(username, &snapshot.liked_reviews)?;
    storage.upsert_liked_review_counts(username, &snapshot.liked_counts)?;

    let mut edges = person_edges(username, EdgeKind::Follower, &snapshot.followers);
    edges.extend(person_edges(username, EdgeKind::Following, &snapshot.following));
    storage.upsert_follows(&edges)?;

    storage.upsert_user_mutuals(username, &snapshot.mutuals)?;
    Ok(())
}
