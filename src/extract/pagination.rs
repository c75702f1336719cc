//! Page-count, next-link and not-found detection

use super::{first_attr, first_match, resolve_href, select_all, text_of};
use crate::url::page_number_from_path;
use regex::Regex;
use scraper::Html;
use url::Url;

/// Largest page count believed from a listing page
///
/// Larger labels are ignored as if absent.
pub const MAX_PAGE_COUNT: u32 = 10_000;

/// Markers the site puts on its 404 page
const NOT_FOUND_MARKERS: &[&str] = &["Page not found", "page-not-found"];

/// Explicit "next page" controls, most specific first
const NEXT_SELECTORS: &[&str] = &[
    "a[rel='next']",
    "link[rel='next']",
    "div.paginate-nextprev a[rel='next']",
    "div.paginate-nextprev a.next",
    "a.next",
    "a.paginate-next",
    "a.load-more",
];

/// Returns true if the page is the site's "page not found" page
///
/// The site serves its 404 page with a 200 on some paths, so the body is
/// checked rather than the status code.
pub fn is_page_not_found(html: &str) -> bool {
    NOT_FOUND_MARKERS.iter().any(|marker| html.contains(marker))
}

/// Number of pages a paginated feed advertises
///
/// The largest numeric pagination link wins; otherwise the trailing page
/// number of a "last" link; otherwise 1. Counts above `MAX_PAGE_COUNT`
/// are skipped.
pub fn parse_page_count(html: &str) -> u32 {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let largest_link = select_all(root, "div.paginate-pages a")
        .into_iter()
        .chain(select_all(root, "div.paginate-pages li"))
        .filter_map(|el| text_of(el).parse::<u32>().ok())
        .filter(|count| *count <= MAX_PAGE_COUNT)
        .max();
    if let Some(count) = largest_link {
        return count.max(1);
    }

    first_match(root, &["link[rel='last']", "a[rel='last']"])
        .and_then(|el| first_attr(el, &["href"]))
        .and_then(|href| page_number_from_path(&href))
        .filter(|count| *count <= MAX_PAGE_COUNT)
        .map(|count| count.max(1))
        .unwrap_or(1)
}

/// Finds the URL of the page after `current`
///
/// # Arguments
///
/// * `html` - The current page
/// * `current` - URL the page was fetched from, used to resolve hrefs
/// * `fragment` - Path fragment every page of this feed shares, e.g.
///   `/likes/reviews/page/`
///
/// # Returns
///
/// The first match of, in order: an explicit next/load-more control; an
/// anchor whose href contains `fragment` (preferring the one numbered one
/// past `current`); a raw-text occurrence of `fragment` followed by a page
/// number. None when the page has no way forward.
pub fn find_next_page_url(html: &str, current: &Url, fragment: &str) -> Option<Url> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    for css in NEXT_SELECTORS {
        let next = select_all(root, css).into_iter().find_map(|el| {
            first_attr(el, &["href", "data-href"]).and_then(|href| resolve_href(&href, current))
        });
        if next.is_some() {
            return next;
        }
    }

    let wanted = page_number_from_path(current.path()).unwrap_or(1) + 1;

    let candidates: Vec<Url> = select_all(root, "a[href]")
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains(fragment))
        .filter_map(|href| resolve_href(href, current))
        .collect();

    if !candidates.is_empty() {
        return candidates
            .iter()
            .find(|url| page_number_from_path(url.path()) == Some(wanted))
            .or_else(|| candidates.first())
            .cloned();
    }

    raw_scan_next(html, current, fragment, wanted)
}

fn raw_scan_next(html: &str, current: &Url, fragment: &str, wanted: u32) -> Option<Url> {
    let pattern = format!(r#"["']([^"'\s<>]*{}\d+/?)["']"#, regex::escape(fragment));
    let re = Regex::new(&pattern).ok()?;

    let candidates: Vec<Url> = re
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| resolve_href(m.as_str(), current))
        .collect();

    candidates
        .iter()
        .find(|url| page_number_from_path(url.path()) == Some(wanted))
        .or_else(|| candidates.first())
        .cloned()
}
