use super::select_all;
use crate::url::is_reserved_path;
use scraper::Html;

/// Parses a followers/following page into usernames
///
/// People are linked as `/<username>/`. Anchors inside the member table are
/// preferred; pages without one fall back to every such anchor. Reserved
/// site paths are never usernames. The result is sorted and de-duplicated.
pub fn parse_people_page(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut people = usernames_from(select_all(root, "table a[href]"));
    if people.is_empty() {
        people = usernames_from(select_all(root, "a[href]"));
    }

    people.sort();
    people.dedup();
    people
}

fn usernames_from<'a>(anchors: impl IntoIterator<Item = scraper::ElementRef<'a>>) -> Vec<String> {
    anchors
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter_map(username_from_href)
        .collect()
}

/// `/<username>/` with exactly two slashes
fn username_from_href(href: &str) -> Option<String> {
    let href = href.trim();
    if !href.starts_with('/') || !href.ends_with('/') || href.matches('/').count() != 2 {
        return None;
    }

    let name = &href[1..href.len() - 1];
    if name.is_empty() || is_reserved_path(name) {
        return None;
    }

    Some(name.to_string())
}
