/// Feed outcome definitions
///
/// A feed crawl always finishes in one of these states. Partial results
/// caused by failed page fetches still count as `Success`.
use std::fmt;

/// Terminal state of a feed crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedStatus {
    /// The feed was walked; records may still be incomplete or empty
    Success,

    /// Page 1 carried a "page not found" marker
    UserNotFound,

    /// The username failed validation; nothing was fetched
    BadUsername,
}

impl FeedStatus {
    /// Returns true if the feed was walked
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Converts the status to its database/console string
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::UserNotFound => "user_not_found",
            Self::BadUsername => "bad_username",
        }
    }

    /// Parses a status from its database string
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "user_not_found" => Some(Self::UserNotFound),
            "bad_username" => Some(Self::BadUsername),
            _ => None,
        }
    }
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Records collected from one feed together with how the crawl ended
#[derive(Debug, Clone, PartialEq)]
pub struct FeedResult<T> {
    pub status: FeedStatus,
    pub records: Vec<T>,
}

impl<T> FeedResult<T> {
    pub fn success(records: Vec<T>) -> Self {
        Self {
            status: FeedStatus::Success,
            records,
        }
    }

    pub fn user_not_found() -> Self {
        Self {
            status: FeedStatus::UserNotFound,
            records: Vec::new(),
        }
    }

    pub fn bad_username() -> Self {
        Self {
            status: FeedStatus::BadUsername,
            records: Vec::new(),
        }
    }

    /// Returns true if the feed was walked
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Transforms the records while keeping the status
    pub fn map<U>(self, f: impl FnOnce(Vec<T>) -> Vec<U>) -> FeedResult<U> {
        FeedResult {
            status: self.status,
            records: f(self.records),
        }
    }
}
