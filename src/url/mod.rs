//! URL handling module for boxd-taste
//!
//! This module provides URL canonicalization for deduplication, the URL
//! templates every feed is fetched from, review-permalink parsing, and the
//! username gate.

mod canonical;
mod paths;
mod username;

// Re-export main functions
pub use canonical::{canonicalize_absolute, canonicalize_url, is_likes_url, same_site};
pub use paths::{
    film_slug_from_path, is_reserved_path, page_number_from_path, parse_review_permalink,
    FeedKind, ReviewPermalink, SiteUrls, RESERVED_PATHS,
};
pub use username::validate_username;
