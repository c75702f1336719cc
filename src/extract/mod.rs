//! Markup extraction for boxd-taste
//!
//! Every extractor here is a pure function over page HTML. Each walks an
//! ordered chain of patterns: the most specific selector first, then looser
//! heuristics, and finally a raw-text scan. "Not found" is a normal outcome
//! and comes back as `None` (or a documented sentinel), never as an error.
//!
//! Parsed documents (`scraper::Html`) never outlive the call that created
//! them, so none of these functions hold parser state across an `.await`.

mod film;
mod pagination;
mod people;
mod profile;
mod rating;
mod review;

pub use film::{
    extract_film_identifier, extract_film_title, film_tiles, is_liked, parse_ratings_page,
    parse_reviewed_films_page, parse_watchlist_page,
};
pub use pagination::{find_next_page_url, is_page_not_found, parse_page_count, MAX_PAGE_COUNT};
pub use people::parse_people_page;
pub use profile::{count_review_permalinks, parse_display_name, parse_reviews_written};
pub use rating::{
    extract_review_rating, extract_tile_rating, normalize_possible_fraction,
    parse_rating_from_class, parse_rating_glyphs, snap_to_half_star,
};
pub use review::{extract_review_urls, parse_review_detail, reviewer_from_review_url};

use scraper::{ElementRef, Selector};
use url::Url;

/// Resolves an href against the page it appeared on
///
/// Returns None if the link cannot point at another page:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: schemes
/// - anything that does not resolve to HTTP(S)
pub(crate) fn resolve_href(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match page_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}

/// Returns the first element under `scope` matching any selector, in order
///
/// Selectors are tried one at a time so that an earlier, more specific
/// pattern always wins over a later, looser one.
pub(crate) fn first_match<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    for css in selectors {
        let Ok(selector) = Selector::parse(css) else {
            tracing::trace!("Skipping unparseable selector {}", css);
            continue;
        };
        if let Some(element) = scope.select(&selector).next() {
            return Some(element);
        }
    }
    None
}

/// Returns every element under `scope` matching `css`
pub(crate) fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Whitespace-normalized text content of an element
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First non-empty attribute among `names`, checked in order
pub(crate) fn first_attr(element: ElementRef<'_>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        element
            .value()
            .attr(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}
