//! Profile page extraction: display name and review counts

use super::{first_attr, first_match, resolve_href, select_all, text_of};
use crate::url::parse_review_permalink;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

/// Headings the site uses for itself rather than for the member
const SITE_HEADINGS: &[&str] = &["Letterboxd", "Your life in film"];

/// Display name from a profile page
///
/// Profile headings are tried first; failing those, the `og:title` meta
/// tag's "<name>’s profile" text.
pub fn parse_display_name(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let heading = ["h1.person-display-name", "h1.profile-name", "h1"]
        .iter()
        .flat_map(|css| select_all(root, css))
        .map(text_of)
        .find(|text| !text.is_empty() && !SITE_HEADINGS.iter().any(|s| text.contains(s)));
    if heading.is_some() {
        return heading;
    }

    let og_title = first_match(root, &["meta[property='og:title']"])
        .and_then(|meta| first_attr(meta, &["content"]))?;
    let re = Regex::new(r"^(.+?)(?:’|'|â€™)s profile").ok()?;
    re.captures(&og_title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

/// "Reviews written" count advertised on a profile page
///
/// Looks at every anchor to `/<username>/reviews/`: its own text, then a
/// counter child (`span.value`, `span.count`, `span.stat-value`, `strong`),
/// then `data-count`/`data-value`/`data-stat` attributes. Returns None when
/// no anchor carries a number.
pub fn parse_reviews_written(html: &str, username: &str) -> Option<u32> {
    let document = Html::parse_document(html);
    let target = format!("/{}/reviews/", username.to_lowercase());

    select_all(document.root_element(), "a[href]")
        .into_iter()
        .filter(|a| {
            a.value()
                .attr("href")
                .map(|href| href_path(href).to_lowercase() == target)
                .unwrap_or(false)
        })
        .find_map(count_in_anchor)
}

fn count_in_anchor(anchor: ElementRef<'_>) -> Option<u32> {
    first_number(&text_of(anchor))
        .or_else(|| {
            first_match(
                anchor,
                &["span.value", "span.count", "span.stat-value", "strong"],
            )
            .and_then(|child| first_number(&text_of(child)))
        })
        .or_else(|| {
            first_attr(anchor, &["data-count", "data-value", "data-stat"])
                .and_then(|value| first_number(&value))
        })
}

fn href_path(href: &str) -> String {
    match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href
            .split(&['?', '#'][..])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// First integer in `text`, with thousands separators removed
fn first_number(text: &str) -> Option<u32> {
    let re = Regex::new(r"\d[\d,]*").ok()?;
    re.find(text)?.as_str().replace(',', "").parse().ok()
}

/// Counts the distinct films `username` has reviewed on one page
///
/// Review permalinks (`/<username>/film/<slug>/`) are collected from the
/// main content's anchors and from a raw scan of its markup, keyed by
/// lowercased slug.
pub fn count_review_permalinks(html: &str, username: &str, page_url: &Url) -> usize {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let scope = first_match(root, &["div.col-main", "main", "section.section"]).unwrap_or(root);

    let mut slugs: HashSet<String> = select_all(scope, "a[href]")
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_href(href, page_url))
        .filter_map(|url| parse_review_permalink(&url))
        .filter(|permalink| permalink.reviewer.eq_ignore_ascii_case(username))
        .map(|permalink| permalink.film_slug.to_lowercase())
        .collect();

    let pattern = format!(
        r#"(?i)/{}/film/([^/"'\s?#<>]+)/"#,
        regex::escape(username)
    );
    if let Ok(re) = Regex::new(&pattern) {
        let markup = scope.html();
        slugs.extend(
            re.captures_iter(&markup)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_lowercase()),
        );
    }

    slugs.len()
}
