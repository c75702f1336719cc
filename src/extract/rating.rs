//! Star-rating extraction
//!
//! Ratings appear on the site in three shapes: a `rated-N` class where N is
//! tenths of a star (`rated-35` is 3.5), a run of star glyphs (`★★★½`), and,
//! on some tiles, a bare numeric attribute that may be a 0-1 fraction of the
//! five-star scale.

use super::{first_attr, first_match, text_of};
use scraper::ElementRef;

const FULL_STAR: char = '★';
const HALF_STAR: char = '½';
const CLASS_PREFIX: &str = "rated-";

/// Parses a rating from an element's class list
///
/// The first `rated-N` class decides: N must be a multiple of 5 between 5
/// and 50, giving N/10 stars. Anything else yields None.
///
/// # Arguments
///
/// * `classes` - The element's class names, e.g. `element.value().classes()`
///
/// # Returns
///
/// * `Some(stars)` - A half-star value between 0.5 and 5.0
/// * `None` - No `rated-` class, or one outside the grid
pub fn parse_rating_from_class<'a>(classes: impl IntoIterator<Item = &'a str>) -> Option<f64> {
    let class = classes
        .into_iter()
        .find(|c| c.starts_with(CLASS_PREFIX))?;

    let tenths: u32 = class[CLASS_PREFIX.len()..].parse().ok()?;
    if (5..=50).contains(&tenths) && tenths % 5 == 0 {
        Some(f64::from(tenths) / 10.0)
    } else {
        None
    }
}

/// Parses a rating from star glyphs
///
/// Counts `★` as whole stars and adds half a star for `½`. Text without a
/// single full-star glyph yields None.
pub fn parse_rating_glyphs(text: &str) -> Option<f64> {
    let full = text.chars().filter(|c| *c == FULL_STAR).count();
    if full == 0 {
        return None;
    }

    let half = if text.contains(HALF_STAR) { 0.5 } else { 0.0 };
    let stars = full as f64 + half;

    (stars <= 5.0).then_some(stars)
}

/// Rescales a 0-1 fraction of the five-star scale to stars
///
/// Only values strictly between 0 and 1 that are not already on the
/// half-star grid are treated as fractions; they become `round(v * 5, 1)`.
/// Everything else is returned unchanged.
pub fn normalize_possible_fraction(value: f64) -> f64 {
    if value > 0.0 && value < 1.0 && !on_half_star_grid(value) {
        (value * 5.0 * 10.0).round() / 10.0
    } else {
        value
    }
}

fn on_half_star_grid(value: f64) -> bool {
    (value * 2.0).fract().abs() < 1e-9
}

/// Rating chain for a ratings-feed tile
///
/// 1. `rated-N` class on the tile's rating span
/// 2. star glyphs in that span
/// 3. star glyphs anywhere in the tile's viewing data
/// 4. a numeric `data-rating` attribute, possibly a fraction
///
/// The result is snapped to the nearest half star; a value that snaps to
/// zero is absent.
pub fn extract_tile_rating(tile: ElementRef<'_>) -> Option<f64> {
    let span = first_match(tile, &["span.rating[class*='rated-']", "span.rating"]);

    let from_span = span.and_then(|span| {
        parse_rating_from_class(span.value().classes())
            .or_else(|| parse_rating_glyphs(&text_of(span)))
    });

    from_span
        .or_else(|| {
            first_match(tile, &[".poster-viewingdata"])
                .and_then(|data| parse_rating_glyphs(&text_of(data)))
        })
        .or_else(|| numeric_rating_attr(tile))
        .map(normalize_possible_fraction)
        .map(snap_to_half_star)
        .filter(|stars| *stars > 0.0 && *stars <= 5.0)
}

/// Rounds a star value to the nearest half star
pub fn snap_to_half_star(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

fn numeric_rating_attr(tile: ElementRef<'_>) -> Option<f64> {
    let raw = first_attr(tile, &["data-rating"]).or_else(|| {
        first_match(tile, &["[data-rating]"]).and_then(|el| first_attr(el, &["data-rating"]))
    })?;

    let value: f64 = raw.parse().ok()?;
    (value > 0.0 && value <= 5.0).then_some(value)
}

/// Rating chain for a review detail page
///
/// Class first, then glyphs. Review pages never carry fractional ratings.
pub fn extract_review_rating(scope: ElementRef<'_>) -> Option<f64> {
    if let Some(span) = first_match(scope, &["span.rating[class*='rated-']"]) {
        if let Some(stars) = parse_rating_from_class(span.value().classes()) {
            return Some(stars);
        }
    }

    first_match(scope, &["span.rating"]).and_then(|span| parse_rating_glyphs(&text_of(span)))
}
