//! Film tiles: the poster grid shared by the ratings, reviewed-films and
//! watchlist feeds

use super::rating::extract_tile_rating;
use super::{first_attr, first_match, select_all, text_of};
use crate::model::{FilmFact, WatchlistEntry};
use crate::url::film_slug_from_path;
use scraper::{ElementRef, Html};
use std::collections::HashSet;

/// Tile containers, most specific first
const TILE_SELECTORS: &[&str] = &[
    "li.poster-container",
    "li.griditem",
    "ul.poster-list > li",
    "div.poster-grid li",
];

/// The lazy poster component that carries a tile's film attributes
const LAZY_POSTER: &str = "div.react-component[data-component-class='LazyPoster']";

const COMPONENT_SELECTORS: &[&str] = &[
    LAZY_POSTER,
    "[data-component-class='LazyPoster']",
    "div.react-component[data-item-slug]",
    "[data-item-slug]",
    "[data-film-slug]",
    "[data-target-link]",
];

const SLUG_ATTRS: &[&str] = &["data-item-slug", "data-film-slug"];
const LINK_ATTRS: &[&str] = &["data-target-link", "data-item-link"];
const TITLE_ATTRS: &[&str] = &[
    "data-item-full-display-name",
    "data-item-name",
    "data-film-name",
    "data-item-title",
    "data-title",
];

/// Selects the film tiles on a listing page
///
/// Tries the known tile containers in order. Pages that render bare poster
/// components fall back to each component, widened to its parent element
/// when that parent holds no other poster.
pub fn film_tiles(root: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    for css in TILE_SELECTORS {
        let tiles = select_all(root, css);
        if !tiles.is_empty() {
            return tiles;
        }
    }

    select_all(root, LAZY_POSTER)
        .into_iter()
        .map(|component| {
            component
                .parent()
                .and_then(ElementRef::wrap)
                .filter(|parent| select_all(*parent, LAZY_POSTER).len() == 1)
                .unwrap_or(component)
        })
        .collect()
}

fn poster_component(tile: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if first_attr(tile, SLUG_ATTRS).is_some() || first_attr(tile, LINK_ATTRS).is_some() {
        return Some(tile);
    }
    first_match(tile, COMPONENT_SELECTORS)
}

/// Film identifier (slug) for a tile
///
/// Component attributes first (`data-item-slug`, `data-film-slug`, then a
/// `/film/<slug>/` target link), then any `/film/<slug>/` anchor in the tile.
pub fn extract_film_identifier(tile: ElementRef<'_>) -> Option<String> {
    if let Some(component) = poster_component(tile) {
        if let Some(slug) = first_attr(component, SLUG_ATTRS) {
            return Some(slug);
        }
        if let Some(slug) = first_attr(component, LINK_ATTRS).and_then(|l| film_slug_from_path(&l)) {
            return Some(slug);
        }
    }

    select_all(tile, "a[href]")
        .into_iter()
        .find_map(|a| a.value().attr("href").and_then(film_slug_from_path))
}

/// Human-readable title for a tile
///
/// Component attributes, then the text of a `/film/` anchor, then the
/// poster image's alt text, then an anchor's `title` attribute.
pub fn extract_film_title(tile: ElementRef<'_>) -> Option<String> {
    if let Some(title) = poster_component(tile).and_then(|c| first_attr(c, TITLE_ATTRS)) {
        return Some(title);
    }

    let anchor_text = select_all(tile, "a[href]")
        .into_iter()
        .filter(|a| a.value().attr("href").and_then(film_slug_from_path).is_some())
        .map(text_of)
        .find(|text| !text.is_empty());
    if anchor_text.is_some() {
        return anchor_text;
    }

    if let Some(alt) = first_match(tile, &["img[alt]"]).and_then(|img| first_attr(img, &["alt"])) {
        let alt = alt.strip_prefix("Poster for ").unwrap_or(&alt).trim().to_string();
        if !alt.is_empty() {
            return Some(alt);
        }
    }

    first_match(tile, &["a[title]"]).and_then(|a| first_attr(a, &["title"]))
}

/// Whether the tile shows the user's "liked" marker
pub fn is_liked(tile: ElementRef<'_>) -> bool {
    first_match(tile, &[".liked", "span.like", ".icon-liked"]).is_some()
}

/// Parses one page of a user's ratings feed
///
/// Tiles without an identifier are dropped. `reviewed` is left false; the
/// ratings crawler fills it in from the reviewed-films feed.
pub fn parse_ratings_page(html: &str) -> Vec<FilmFact> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut films = Vec::new();

    for tile in film_tiles(document.root_element()) {
        let Some(film_identifier) = extract_film_identifier(tile) else {
            tracing::trace!("Dropping ratings tile without a film identifier");
            continue;
        };
        if !seen.insert(film_identifier.clone()) {
            continue;
        }

        let display_name = extract_film_title(tile).unwrap_or_else(|| film_identifier.clone());

        films.push(FilmFact {
            film_identifier,
            display_name,
            rating: extract_tile_rating(tile),
            liked: is_liked(tile),
            reviewed: false,
        });
    }

    films
}

/// Parses one page of a user's reviewed-films feed into film identifiers
pub fn parse_reviewed_films_page(html: &str) -> HashSet<String> {
    let document = Html::parse_document(html);

    film_tiles(document.root_element())
        .into_iter()
        .filter_map(extract_film_identifier)
        .collect()
}

/// Parses one page of a user's watchlist
pub fn parse_watchlist_page(html: &str) -> Vec<WatchlistEntry> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for tile in film_tiles(document.root_element()) {
        let Some(film_identifier) = extract_film_identifier(tile) else {
            continue;
        };
        if !seen.insert(film_identifier.clone()) {
            continue;
        }

        let display_name = extract_film_title(tile).unwrap_or_else(|| film_identifier.clone());
        entries.push(WatchlistEntry {
            film_identifier,
            display_name,
        });
    }

    entries
}
