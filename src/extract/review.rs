//! Review permalinks: harvesting them from likes pages and hydrating each
//! into a `ReviewRecord`

use super::film::extract_film_title;
use super::rating::extract_review_rating;
use super::{resolve_href, select_all, text_of};
use crate::model::{ReviewRecord, UNKNOWN_REVIEWER, UNKNOWN_TITLE};
use crate::url::{
    canonicalize_absolute, film_slug_from_path, is_likes_url, parse_review_permalink, same_site,
};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

/// Permalinks in raw markup: an optional origin, then `/<user>/film/<slug>...`
///
/// The user segment is restricted to username characters so that the host
/// of an absolute URL is never mistaken for a reviewer.
const RAW_PERMALINK: &str = r#"(https?://[A-Za-z0-9.\-:]+)?(/[A-Za-z0-9_]+/film/[^"'\s?#<>]+)"#;

/// Anchors that link the reviewed film from a review page's header
const HEADING_ANCHORS: &[&str] = &[
    "h1 a[href]",
    "h2 a[href]",
    "a.headline[href]",
    "a[data-track-action][href]",
];

/// Collects the review permalinks on one page of a likes feed
///
/// Anchors are read first, then the raw markup is scanned for permalinks
/// that only appear in scripts or data attributes. Links to other sites and
/// `.../likes/` sub-pages are dropped. URLs come back canonical, in first-seen
/// order, without duplicates.
pub fn extract_review_urls(html: &str, page_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);

    let from_anchors = select_all(document.root_element(), "a[href]")
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_href(href, page_url))
        .collect::<Vec<_>>();

    let from_markup = Regex::new(RAW_PERMALINK)
        .map(|re| {
            re.captures_iter(html)
                .filter_map(|caps| {
                    let path = caps.get(2)?.as_str();
                    match caps.get(1) {
                        Some(origin) => Url::parse(&format!("{}{}", origin.as_str(), path)).ok(),
                        None => resolve_href(path, page_url),
                    }
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let mut seen = HashSet::new();
    from_anchors
        .into_iter()
        .chain(from_markup)
        .filter(|url| same_site(url, page_url))
        .filter(|url| parse_review_permalink(url).is_some())
        .map(|url| canonicalize_absolute(url).to_string())
        .filter(|url| !is_likes_url(url))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Reviewer username from a review permalink, or `unknown`
pub fn reviewer_from_review_url(review_url: &str) -> String {
    Url::parse(review_url)
        .ok()
        .and_then(|url| parse_review_permalink(&url))
        .map(|permalink| permalink.reviewer)
        .unwrap_or_else(|| UNKNOWN_REVIEWER.to_string())
}

/// Builds a review record from a review detail page
///
/// # Arguments
///
/// * `html` - The review page
/// * `review_url` - URL the page was fetched from
///
/// # Returns
///
/// * `Some(ReviewRecord)` - Always, for a review permalink; a missing title
///   becomes `Unknown` and a missing rating stays `None`
/// * `None` - `review_url` is a `.../likes/` sub-page, not a review
pub fn parse_review_detail(html: &str, review_url: &Url) -> Option<ReviewRecord> {
    let review_url = canonicalize_absolute(review_url.clone()).to_string();
    if is_likes_url(&review_url) {
        return None;
    }

    let document = Html::parse_document(html);
    let root = document.root_element();

    let film_title = heading_film_title(root)
        .or_else(|| extract_film_title(root))
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    Some(ReviewRecord {
        reviewer: reviewer_from_review_url(&review_url),
        film_title,
        rating: extract_review_rating(root),
        review_url,
    })
}

fn heading_film_title(root: ElementRef<'_>) -> Option<String> {
    HEADING_ANCHORS
        .iter()
        .flat_map(|css| select_all(root, css))
        .filter(|a| {
            a.value()
                .attr("href")
                .and_then(film_slug_from_path)
                .is_some()
        })
        .map(text_of)
        .find(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://letterboxd.com/jane/likes/reviews/").unwrap()
    }

    #[test]
    fn test_extract_review_urls_from_anchors() {
        let html = r#"
            <a href="/bob/film/heat/">Bob on Heat</a>
            <a href="/bob/film/heat/likes/">3 likes</a>
            <a href="https://letterboxd.com/amy/film/ran/?from=likes">Amy on Ran</a>
            <a href="/film/heat/">Heat</a>
            <a href="https://example.com/evil/film/x/">Elsewhere</a>
        "#;
        assert_eq!(
            extract_review_urls(html, &page()),
            vec![
                "https://letterboxd.com/bob/film/heat/",
                "https://letterboxd.com/amy/film/ran/",
            ]
        );
    }

    #[test]
    fn test_extract_review_urls_from_markup() {
        let html = r#"<div data-review-url="/carl/film/alien/"></div>
                      <script>["https://letterboxd.com/dee/film/ran/2/"]</script>"#;
        assert_eq!(
            extract_review_urls(html, &page()),
            vec![
                "https://letterboxd.com/carl/film/alien/",
                "https://letterboxd.com/dee/film/ran/2/",
            ]
        );
    }

    #[test]
    fn test_host_is_not_a_reviewer() {
        let html = r#"<a href="https://letterboxd.com/film/heat/">Heat</a>"#;
        assert!(extract_review_urls(html, &page()).is_empty());
    }

    #[test]
    fn test_reviewer_from_review_url() {
        assert_eq!(
            reviewer_from_review_url("https://letterboxd.com/bob/film/heat/"),
            "bob"
        );
        assert_eq!(reviewer_from_review_url("not a url"), "unknown");
        assert_eq!(
            reviewer_from_review_url("https://letterboxd.com/film/heat/"),
            "unknown"
        );
    }

    #[test]
    fn test_parse_review_detail() {
        let url = Url::parse("https://letterboxd.com/bob/film/heat/?x=1").unwrap();
        let html = r#"
            <header class="film-header">
                <h1><a href="/bob/">Bob</a> <a href="/film/heat/">Heat</a></h1>
            </header>
            <span class="rating rated-45">★★★★½</span>
        "#;
        let record = parse_review_detail(html, &url).unwrap();
        assert_eq!(record.reviewer, "bob");
        assert_eq!(record.film_title, "Heat");
        assert_eq!(record.rating, Some(4.5));
        assert_eq!(record.review_url, "https://letterboxd.com/bob/film/heat/");
    }

    #[test]
    fn test_parse_review_detail_defaults() {
        let url = Url::parse("https://letterboxd.com/bob/film/heat/").unwrap();
        let record = parse_review_detail("<p>Nothing here</p>", &url).unwrap();
        assert_eq!(record.film_title, "Unknown");
        assert_eq!(record.rating, None);
    }

    #[test]
    fn test_parse_review_detail_rejects_likes_page() {
        let url = Url::parse("https://letterboxd.com/bob/film/heat/likes/").unwrap();
        assert_eq!(parse_review_detail("<p></p>", &url), None);
    }
}
