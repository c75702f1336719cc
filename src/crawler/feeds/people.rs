use super::username_ok;
use crate::crawler::fetcher::BoundedFetcher;
use crate::crawler::paginator::crawl_feed;
use crate::extract::parse_people_page;
use crate::model::{EdgeKind, PersonEdge};
use crate::state::FeedResult;
use crate::url::{FeedKind, SiteUrls};

/// Crawls the usernames following `username`
pub async fn crawl_followers(
    fetcher: &BoundedFetcher,
    urls: &SiteUrls,
    username: &str,
) -> FeedResult<String> {
    crawl_people(fetcher, urls, username, EdgeKind::Follower).await
}

/// Crawls the usernames `username` follows
pub async fn crawl_following(
    fetcher: &BoundedFetcher,
    urls: &SiteUrls,
    username: &str,
) -> FeedResult<String> {
    crawl_people(fetcher, urls, username, EdgeKind::Following).await
}

/// Crawls one side of a user's follow graph
///
/// Usernames come back sorted and unique. The user never appears in their
/// own list.
pub async fn crawl_people(
    fetcher: &BoundedFetcher,
    urls: &SiteUrls,
    username: &str,
    kind: EdgeKind,
) -> FeedResult<String> {
    if !username_ok(username) {
        return FeedResult::bad_username();
    }

    let feed = match kind {
        EdgeKind::Follower => FeedKind::Followers,
        EdgeKind::Following => FeedKind::Following,
    };

    let result = crawl_feed(fetcher, urls, username, feed, |body, _| parse_people_page(body))
        .await
        .map(|mut names| {
            names.retain(|name| !name.eq_ignore_ascii_case(username));
            names.sort();
            names.dedup();
            names
        });

    tracing::info!(
        "{} for {}: {} ({})",
        feed.path(),
        username,
        result.records.len(),
        result.status
    );
    result
}

/// Turns a crawled list into follow edges rooted at `username`
pub fn person_edges(username: &str, kind: EdgeKind, others: &[String]) -> Vec<PersonEdge> {
    others
        .iter()
        .map(|other| PersonEdge {
            username: username.to_string(),
            other: other.clone(),
            kind,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_edges() {
        let edges = person_edges("jane", EdgeKind::Follower, &["amy".to_string()]);
        assert_eq!(
            edges,
            vec![PersonEdge {
                username: "jane".to_string(),
                other: "amy".to_string(),
                kind: EdgeKind::Follower,
            }]
        );
    }
}
