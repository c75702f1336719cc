use crate::UrlError;

/// Longest username the site hands out
const MAX_USERNAME_LEN: usize = 30;

/// The single gate every public scraping entry point passes usernames through
///
/// Accepts 1 to 30 ASCII letters, digits or underscores
/// (`^[A-Za-z0-9_]{1,30}$`); anything else would either be rejected by the
/// site or smuggle extra path segments into the feed URLs.
pub fn validate_username(username: &str) -> Result<&str, UrlError> {
    let valid = !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(username)
    } else {
        Err(UrlError::InvalidUsername(username.to_string()))
    }
}
