use url::Url;

/// Reduces a URL to scheme, authority and path for use as a dedup key
///
/// Relative references are resolved against `base` first. The query string
/// and fragment are dropped; nothing else is rewritten, so the result of
/// canonicalizing a canonical URL is the same URL.
///
/// Empty input, input that cannot be resolved, and non-HTTP(S) references
/// (`mailto:`, `javascript:` ...) are returned unchanged.
///
/// # Examples
///
/// ```
/// use boxd_taste::url::canonicalize_url;
/// use url::Url;
///
/// let base = Url::parse("https://letterboxd.com").unwrap();
/// assert_eq!(
///     canonicalize_url("/jane/film/heat/?from=likes#comments", &base),
///     "https://letterboxd.com/jane/film/heat/"
/// );
/// ```
pub fn canonicalize_url(raw: &str, base: &Url) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return raw.to_string();
    }

    match base.join(trimmed) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            canonicalize_absolute(url).to_string()
        }
        _ => raw.to_string(),
    }
}

/// Strips query and fragment from an already-absolute URL
pub fn canonicalize_absolute(mut url: Url) -> Url {
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Returns true if the URL is a "likes" sub-page rather than a review
///
/// Likes feeds list both `/<reviewer>/film/<slug>/` permalinks and their
/// `/<reviewer>/film/<slug>/likes/` pages; the latter must be discarded or
/// every review would be counted twice.
pub fn is_likes_url(raw: &str) -> bool {
    let path = match Url::parse(raw) {
        Ok(url) => url.path().to_string(),
        Err(_) => raw
            .split(&['?', '#'][..])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    path.trim_end_matches('/').ends_with("/likes")
}

/// Returns true if both URLs point at the same site, ignoring a `www.` prefix
pub fn same_site(a: &Url, b: &Url) -> bool {
    fn bare_host(url: &Url) -> Option<String> {
        url.host_str()
            .map(|h| h.to_lowercase().trim_start_matches("www.").to_string())
    }

    bare_host(a).is_some() && bare_host(a) == bare_host(b) && a.port() == b.port()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://letterboxd.com").unwrap()
    }

    #[test]
    fn test_strips_query_and_fragment() {
        assert_eq!(
            canonicalize_url("https://letterboxd.com/jane/film/heat/?page=2#top", &base()),
            "https://letterboxd.com/jane/film/heat/"
        );
    }

    #[test]
    fn test_resolves_relative_reference() {
        assert_eq!(
            canonicalize_url("/jane/likes/reviews/page/2/", &base()),
            "https://letterboxd.com/jane/likes/reviews/page/2/"
        );
    }

    #[test]
    fn test_keeps_path_untouched() {
        // Trailing slashes and case are part of the key
        assert_eq!(
            canonicalize_url("https://letterboxd.com/Jane/film/Heat", &base()),
            "https://letterboxd.com/Jane/film/Heat"
        );
    }

    #[test]
    fn test_empty_input_unchanged() {
        assert_eq!(canonicalize_url("", &base()), "");
    }

    #[test]
    fn test_non_http_reference_unchanged() {
        assert_eq!(
            canonicalize_url("mailto:someone@example.com", &base()),
            "mailto:someone@example.com"
        );
        assert_eq!(
            canonicalize_url("javascript:void(0)", &base()),
            "javascript:void(0)"
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "https://letterboxd.com/jane/film/heat/?x=1#y",
            "/jane/film/heat/1/",
            "relative/path?q",
            "https://www.letterboxd.com",
            "",
            "mailto:someone@example.com",
            "http://[::1",
        ];

        for input in inputs {
            let once = canonicalize_url(input, &base());
            let twice = canonicalize_url(&once, &base());
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_is_likes_url() {
        assert!(is_likes_url("https://letterboxd.com/jane/film/heat/likes/"));
        assert!(is_likes_url("https://letterboxd.com/jane/film/heat/likes"));
        assert!(is_likes_url("/jane/film/heat/likes/?sort=new"));
        assert!(!is_likes_url("https://letterboxd.com/jane/film/heat/"));
        assert!(!is_likes_url("https://letterboxd.com/jane/likes/reviews/"));
        assert!(!is_likes_url("https://letterboxd.com/jane/film/likes-and-dislikes/"));
    }

    #[test]
    fn test_same_site_ignores_www() {
        let a = Url::parse("https://www.letterboxd.com/a/").unwrap();
        let b = Url::parse("https://letterboxd.com/b/").unwrap();
        let c = Url::parse("https://example.com/").unwrap();

        assert!(same_site(&a, &b));
        assert!(!same_site(&a, &c));
    }

    #[test]
    fn test_same_site_respects_port() {
        let a = Url::parse("http://127.0.0.1:8080/").unwrap();
        let b = Url::parse("http://127.0.0.1:9090/").unwrap();
        assert!(!same_site(&a, &b));
    }
}
