//! Bounded HTTP fetcher
//!
//! This module handles every HTTP request a scrape session makes:
//! - Building the HTTP client with browser-like request headers
//! - Capping in-flight requests with a per-session semaphore
//! - Applying the per-fetch timeout and the optional session deadline
//! - Classifying failures
//!
//! Failures never propagate. Callers get a `FetchResult` to inspect, or an
//! absent page from `fetch_page`, and skip what could not be fetched.

use crate::config::Config;
use crate::extract::is_page_not_found;
use crate::{ConfigError, TasteError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// The page was fetched
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// HTTP 404; the body is kept so the not-found page can be inspected
    NotFound {
        /// Final URL after redirects
        final_url: Url,
        /// Page body content (empty if it could not be read)
        body: String,
    },

    /// Any other non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, undecodable body, etc.)
    NetworkError {
        /// Error description
        error: String,
    },

    /// The session deadline passed before the fetch could finish
    DeadlineExceeded,
}

/// A page whose body was read, successful or not-found
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Page body content
    pub body: String,
}

impl FetchedPage {
    /// Returns true if the site reported the page as missing
    ///
    /// Either by status code or by the not-found marker in the body, which
    /// the site also serves with a 200 on some paths.
    pub fn is_not_found(&self) -> bool {
        self.status_code == StatusCode::NOT_FOUND.as_u16() || is_page_not_found(&self.body)
    }
}

/// Builds an HTTP client with proper configuration
///
/// Every request carries the configured browser-like `User-Agent`, `Accept`
/// and `Accept-Language` headers and the per-fetch timeout.
///
/// # Arguments
///
/// * `config` - The scraper configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(TasteError)` - A header value was not representable, or the
///   client could not be built
///
/// # Example
///
/// ```no_run
/// use boxd_taste::config::Config;
/// use boxd_taste::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, TasteError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value("user-agent", &config.http.user_agent)?);
    headers.insert(ACCEPT, header_value("accept", &config.http.accept)?);
    headers.insert(
        ACCEPT_LANGUAGE,
        header_value("accept-language", &config.http.accept_language)?,
    );

    let client = Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.scraper.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeader {
        name,
        value: value.to_string(),
    })
}

/// The per-session execution context every crawl runs under
///
/// Clones share one semaphore, so a whole scrape session (every feed and
/// every review hydration) stays under a single in-flight ceiling. Two
/// sessions built separately do not share a ceiling.
#[derive(Debug, Clone)]
pub struct BoundedFetcher {
    client: Client,
    permits: Arc<Semaphore>,
    ceiling: usize,
    deadline: Option<Instant>,
}

impl BoundedFetcher {
    /// Creates a fetcher allowing `max_concurrent` requests in flight
    ///
    /// A ceiling of zero is raised to one.
    pub fn new(client: Client, max_concurrent: usize) -> Self {
        let ceiling = max_concurrent.max(1);
        Self {
            client,
            permits: Arc::new(Semaphore::new(ceiling)),
            ceiling,
            deadline: None,
        }
    }

    /// Builds the client and session context described by `config`
    ///
    /// The session deadline, when configured, starts counting now.
    pub fn from_config(config: &Config) -> Result<Self, TasteError> {
        let client = build_http_client(config)?;
        let fetcher = Self::new(client, config.scraper.max_concurrent_requests as usize);

        Ok(match config.scraper.crawl_deadline_secs {
            Some(secs) => fetcher.with_deadline(Instant::now() + Duration::from_secs(secs)),
            None => fetcher,
        })
    }

    /// Sets the instant after which no fetch of this session may finish
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Maximum number of requests in flight
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Returns true once the session deadline has passed
    pub fn deadline_passed(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    /// Fetches a URL under the concurrency ceiling
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | `Success` |
    /// | 404 | `NotFound` with body |
    /// | other status | `HttpError` |
    /// | timeout, connection or body error | `NetworkError` |
    /// | session deadline passed | `DeadlineExceeded` |
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        match self.deadline {
            Some(deadline) => {
                if Instant::now() >= deadline {
                    return FetchResult::DeadlineExceeded;
                }
                match tokio::time::timeout_at(deadline, self.fetch_bounded(url)).await {
                    Ok(result) => result,
                    Err(_) => FetchResult::DeadlineExceeded,
                }
            }
            None => self.fetch_bounded(url).await,
        }
    }

    async fn fetch_bounded(&self, url: &Url) -> FetchResult {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                return FetchResult::NetworkError {
                    error: format!("Fetcher closed: {}", e),
                }
            }
        };

        tracing::debug!("Fetching {}", url);

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(&e),
        };

        let status = response.status();
        let final_url = response.url().clone();

        if status == StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return FetchResult::NotFound { final_url, body };
        }

        if !status.is_success() {
            return FetchResult::HttpError {
                status_code: status.as_u16(),
            };
        }

        match response.text().await {
            Ok(body) => FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                body,
            },
            Err(e) => FetchResult::NetworkError {
                error: format!("Failed to read body: {}", e),
            },
        }
    }

    /// Fetches a URL, reducing every failure to `None`
    ///
    /// Not-found pages are returned so callers can tell a missing user from
    /// a failed fetch.
    pub async fn fetch_page(&self, url: &Url) -> Option<FetchedPage> {
        match self.fetch(url).await {
            FetchResult::Success {
                final_url,
                status_code,
                body,
            } => Some(FetchedPage {
                url: final_url,
                status_code,
                body,
            }),
            FetchResult::NotFound { final_url, body } => Some(FetchedPage {
                url: final_url,
                status_code: StatusCode::NOT_FOUND.as_u16(),
                body,
            }),
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Skipping {}: HTTP {}", url, status_code);
                None
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Skipping {}: {}", url, error);
                None
            }
            FetchResult::DeadlineExceeded => {
                tracing::warn!("Skipping {}: crawl deadline exceeded", url);
                None
            }
        }
    }

    /// Fetches every URL concurrently, at most `ceiling` at a time
    ///
    /// Results line up with `urls`; completion order is not observable.
    pub async fn fetch_pages(&self, urls: &[Url]) -> Vec<Option<FetchedPage>> {
        let futures = urls.iter().map(|url| self.fetch_page(url));
        futures::future::join_all(futures).await
    }
}

fn classify_error(error: &reqwest::Error) -> FetchResult {
    let error = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else {
        error.to_string()
    };
    FetchResult::NetworkError { error }
}
