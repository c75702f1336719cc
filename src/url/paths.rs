use crate::model::UNKNOWN_REVIEWER;
use crate::UrlError;
use url::Url;

/// First path segments that belong to the site rather than to a member
pub const RESERVED_PATHS: &[&str] = &[
    "film", "films", "review", "reviews", "likes", "activity", "journal", "search", "lists",
    "members", "about", "contact", "settings", "sign-in", "sign-up", "login", "logout",
    "create-account", "pro", "patron", "welcome", "legal", "api",
];

/// Returns true if `segment` is a site path rather than a username
pub fn is_reserved_path(segment: &str) -> bool {
    let lowered = segment.to_lowercase();
    RESERVED_PATHS.contains(&lowered.as_str())
}

/// The paginated listings scraped for each user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// `/<user>/films/ratings/`
    Ratings,
    /// `/<user>/films/reviews/`
    ReviewedFilms,
    /// `/<user>/watchlist/`
    Watchlist,
    /// `/<user>/reviews/`
    Reviews,
    /// `/<user>/likes/reviews/`
    LikedReviews,
    /// `/<user>/followers/`
    Followers,
    /// `/<user>/following/`
    Following,
}

impl FeedKind {
    /// Path below the user segment, without surrounding slashes
    pub fn path(&self) -> &'static str {
        match self {
            Self::Ratings => "films/ratings",
            Self::ReviewedFilms => "films/reviews",
            Self::Watchlist => "watchlist",
            Self::Reviews => "reviews",
            Self::LikedReviews => "likes/reviews",
            Self::Followers => "followers",
            Self::Following => "following",
        }
    }

    /// Path fragment shared by every numbered page of this feed
    pub fn pagination_fragment(&self) -> String {
        format!("/{}/page/", self.path())
    }

    /// Whether page 1 of the feed advertises the total page count
    ///
    /// The likes feed does not; it is walked by following "next" links.
    pub fn advertises_page_count(&self) -> bool {
        !matches!(self, Self::LikedReviews)
    }
}

/// URL templates for one site origin
#[derive(Debug, Clone)]
pub struct SiteUrls {
    base: Url,
}

impl SiteUrls {
    /// Creates templates rooted at `base` (scheme + authority; any path is ignored)
    pub fn new(base: &str) -> Result<Self, UrlError> {
        let mut base = Url::parse(base).map_err(|e| UrlError::Parse(e.to_string()))?;
        if base.host_str().is_none() {
            return Err(UrlError::Parse(format!("base URL has no host: {}", base)));
        }
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    /// The site origin
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `/<user>/`
    pub fn profile(&self, username: &str) -> Url {
        self.with_path(&format!("/{}/", username))
    }

    /// `/<user>/<feed>/` for page 1, `/<user>/<feed>/page/<n>/` afterwards
    pub fn feed(&self, username: &str, kind: FeedKind, page: u32) -> Url {
        if page <= 1 {
            self.with_path(&format!("/{}/{}/", username, kind.path()))
        } else {
            self.with_path(&format!("/{}/{}/page/{}/", username, kind.path(), page))
        }
    }

    fn with_path(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url
    }
}

/// The two identifying parts of a review permalink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPermalink {
    pub reviewer: String,
    pub film_slug: String,
}

/// Parses `/<reviewer>/film/<slug>/...` out of a URL
///
/// Returns None when the path does not have that shape. A reviewer segment
/// that is a reserved site path is reported as `unknown`.
pub fn parse_review_permalink(url: &Url) -> Option<ReviewPermalink> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    if segments.len() < 3 || !segments[1].eq_ignore_ascii_case("film") {
        return None;
    }

    let reviewer = if is_reserved_path(segments[0]) {
        UNKNOWN_REVIEWER.to_string()
    } else {
        segments[0].to_string()
    };

    Some(ReviewPermalink {
        reviewer,
        film_slug: segments[2].to_string(),
    })
}

/// Parses `/film/<slug>/...` and returns the slug
pub fn film_slug_from_path(href: &str) -> Option<String> {
    let path = href
        .split(&['?', '#'][..])
        .next()
        .unwrap_or_default();

    // Accept absolute URLs by looking only at their path
    let path = match Url::parse(path) {
        Ok(url) => url.path().to_string(),
        Err(_) => path.to_string(),
    };

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some("film"), Some(slug)) => Some(slug.to_string()),
        _ => None,
    }
}

/// Extracts the page number from `.../page/<n>/`
pub fn page_number_from_path(path: &str) -> Option<u32> {
    let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
    let mut number = None;

    while let Some(segment) = segments.next() {
        if segment == "page" {
            if let Some(n) = segments.peek().and_then(|n| n.parse::<u32>().ok()) {
                number = Some(n);
            }
        }
    }

    number
}
