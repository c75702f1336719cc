use super::username_ok;
use crate::crawler::fetcher::BoundedFetcher;
use crate::extract::{
    count_review_permalinks, parse_display_name, parse_page_count, parse_reviews_written,
};
use crate::model::UserProfile;
use crate::state::FeedStatus;
use crate::url::{FeedKind, SiteUrls};

/// Scrapes a user's profile page
///
/// The reviews-written count is read from the profile when it is shown
/// there, and estimated from the reviews feed otherwise. A profile page
/// that cannot be fetched yields an empty profile with `Success`.
pub async fn scrape_profile(
    fetcher: &BoundedFetcher,
    urls: &SiteUrls,
    username: &str,
) -> (FeedStatus, UserProfile) {
    let mut profile = UserProfile {
        username: username.to_string(),
        ..UserProfile::default()
    };

    if !username_ok(username) {
        return (FeedStatus::BadUsername, profile);
    }

    let Some(page) = fetcher.fetch_page(&urls.profile(username)).await else {
        return (FeedStatus::Success, profile);
    };
    if page.is_not_found() {
        tracing::info!("Profile for {} not found", username);
        return (FeedStatus::UserNotFound, profile);
    }

    profile.display_name = parse_display_name(&page.body);
    profile.reviews_written = match parse_reviews_written(&page.body, username) {
        Some(count) => count,
        None => estimate_reviews_written(fetcher, urls, username).await,
    };

    tracing::info!(
        "Profile for {}: {:?}, {} review(s)",
        username,
        profile.display_name,
        profile.reviews_written
    );
    (FeedStatus::Success, profile)
}

/// Estimates how many reviews a user has written from the reviews feed
///
/// Counts distinct review permalinks on page 1 and on the last page:
/// `(pages - 1) * per_page + last_page_count`. Only those two pages are
/// fetched. A missing, unreadable or empty first page counts as zero. A
/// last page that is unreadable or shows no permalinks is assumed full.
pub async fn estimate_reviews_written(
    fetcher: &BoundedFetcher,
    urls: &SiteUrls,
    username: &str,
) -> u32 {
    if !username_ok(username) {
        return 0;
    }

    let first_url = urls.feed(username, FeedKind::Reviews, 1);
    let Some(first) = fetcher.fetch_page(&first_url).await else {
        return 0;
    };
    if first.is_not_found() {
        return 0;
    }

    let per_page = count_review_permalinks(&first.body, username, &first.url) as u32;
    if per_page == 0 {
        return 0;
    }

    let pages = parse_page_count(&first.body);
    if pages <= 1 {
        return per_page;
    }

    let last_url = urls.feed(username, FeedKind::Reviews, pages);
    let last_count = match fetcher.fetch_page(&last_url).await {
        Some(last) if !last.is_not_found() => {
            count_review_permalinks(&last.body, username, &last.url) as u32
        }
        _ => 0,
    };
    let last_count = if last_count == 0 { per_page } else { last_count };

    (pages - 1)
        .saturating_mul(per_page)
        .saturating_add(last_count)
}
