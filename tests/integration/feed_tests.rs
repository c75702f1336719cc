//! Integration tests for the feed crawlers
//!
//! These tests use wiremock to stand in for the film site and check how
//! many requests each pagination strategy makes, how missing users are
//! reported, and what the coordinator persists.

use boxd_taste::config::Config;
use boxd_taste::crawler::feeds::estimate_reviews_written;
use boxd_taste::crawler::{
    build_http_client, crawl_known_total, crawl_liked_reviews, crawl_next_links, crawl_ratings,
    crawl_watchlist, BoundedFetcher, Coordinator,
};
use boxd_taste::extract::{extract_review_urls, parse_ratings_page};
use boxd_taste::state::FeedStatus;
use boxd_taste::storage::{SqliteStorage, Storage, Table};
use boxd_taste::url::{FeedKind, SiteUrls};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.scraper.base_url = base_url.to_string();
    config.scraper.request_timeout_secs = 5;
    config
}

fn session(server: &MockServer) -> (BoundedFetcher, SiteUrls) {
    let config = test_config(&server.uri());
    let fetcher = BoundedFetcher::from_config(&config).expect("Failed to build fetcher");
    let urls = SiteUrls::new(&server.uri()).expect("Failed to parse base URL");
    (fetcher, urls)
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404)
        .set_body_string("<html><body><h1>Page not found</h1></body></html>")
        .insert_header("content-type", "text/html")
}

/// A poster tile in the ratings/watchlist grid
fn tile(slug: &str, name: &str, rating_class: Option<&str>) -> String {
    let rating = rating_class
        .map(|class| format!(r#"<span class="rating {}"></span>"#, class))
        .unwrap_or_default();
    format!(
        r#"<li class="poster-container">
             <div class="really-lazy-load" data-component-class="LazyPoster"
                  data-item-slug="{slug}" data-item-name="{name}"></div>
             <p class="poster-viewingdata">{rating}</p>
           </li>"#
    )
}

fn grid(tiles: &[String], pages: u32) -> String {
    let paginate = if pages > 1 {
        let items: String = (1..=pages)
            .map(|n| format!(r#"<li><a href="page/{n}/">{n}</a></li>"#))
            .collect();
        format!(r#"<div class="paginate-pages"><ul>{}</ul></div>"#, items)
    } else {
        String::new()
    };
    format!(
        r#"<ul class="poster-list">{}</ul>{}"#,
        tiles.concat(),
        paginate
    )
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_known_total_fetches_each_page_once() {
    let server = MockServer::start().await;
    let (fetcher, urls) = session(&server);

    mount(
        &server,
        "/jane/films/ratings/",
        html(&grid(&[tile("heat", "Heat", Some("rated-8"))], 3)),
        1,
    )
    .await;
    mount(
        &server,
        "/jane/films/ratings/page/2/",
        html(&grid(&[tile("ran", "Ran", Some("rated-10"))], 3)),
        1,
    )
    .await;
    mount(
        &server,
        "/jane/films/ratings/page/3/",
        html(&grid(&[tile("alien", "Alien", None)], 3)),
        1,
    )
    .await;

    let result =
        crawl_known_total(&fetcher, &urls, "jane", FeedKind::Ratings, parse_ratings_page).await;

    assert_eq!(result.status, FeedStatus::Success);
    let mut slugs: Vec<_> = result
        .records
        .iter()
        .map(|f| f.film_identifier.as_str())
        .collect();
    slugs.sort();
    assert_eq!(slugs, vec!["alien", "heat", "ran"]);

    let alien = result
        .records
        .iter()
        .find(|f| f.film_identifier == "alien")
        .unwrap();
    assert_eq!(alien.rating, None);
}

#[tokio::test]
async fn test_known_total_skips_failed_page() {
    let server = MockServer::start().await;
    let (fetcher, urls) = session(&server);

    mount(
        &server,
        "/jane/films/ratings/",
        html(&grid(&[tile("heat", "Heat", Some("rated-8"))], 3)),
        1,
    )
    .await;
    mount(
        &server,
        "/jane/films/ratings/page/2/",
        ResponseTemplate::new(500),
        1,
    )
    .await;
    mount(
        &server,
        "/jane/films/ratings/page/3/",
        html(&grid(&[tile("alien", "Alien", Some("rated-6"))], 3)),
        1,
    )
    .await;

    let result =
        crawl_known_total(&fetcher, &urls, "jane", FeedKind::Ratings, parse_ratings_page).await;

    assert_eq!(result.status, FeedStatus::Success);
    let slugs: Vec<_> = result
        .records
        .iter()
        .map(|f| f.film_identifier.as_str())
        .collect();
    assert_eq!(slugs, vec!["heat", "alien"]);
}

#[tokio::test]
async fn test_fetcher_respects_ceiling() {
    let server = MockServer::start().await;
    let delay = Duration::from_millis(200);

    Mock::given(method("GET"))
        .respond_with(html("slow").set_delay(delay))
        .expect(10)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let client = build_http_client(&config).expect("Failed to build client");
    let fetcher = BoundedFetcher::new(client, 2);

    let targets: Vec<url::Url> = (0..10)
        .map(|n| {
            url::Url::parse(&format!("{}/slow/{}/", server.uri(), n)).expect("Bad mock URL")
        })
        .collect();

    let started = Instant::now();
    let pages = fetcher.fetch_pages(&targets).await;
    let elapsed = started.elapsed();

    assert_eq!(pages.len(), 10);
    assert!(pages.iter().all(Option::is_some));
    assert!(
        elapsed >= delay * 5,
        "10 requests at ceiling 2 finished in {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_single_page_feed_makes_one_request() {
    let server = MockServer::start().await;
    let (fetcher, urls) = session(&server);

    mount(
        &server,
        "/jane/watchlist/",
        html(&grid(
            &[tile("heat", "Heat", None), tile("ran", "Ran", None)],
            1,
        )),
        1,
    )
    .await;

    let result = crawl_watchlist(&fetcher, &urls, "jane").await;

    assert_eq!(result.status, FeedStatus::Success);
    assert_eq!(result.records.len(), 2);
    assert_eq!(result.records[0].display_name, "Heat");
}

#[tokio::test]
async fn test_missing_user_is_not_success() {
    let server = MockServer::start().await;
    let (fetcher, urls) = session(&server);

    mount(&server, "/ghost/watchlist/", not_found(), 1).await;

    let result = crawl_watchlist(&fetcher, &urls, "ghost").await;

    assert_eq!(result.status, FeedStatus::UserNotFound);
    assert!(result.records.is_empty());
}

#[tokio::test]
async fn test_bad_username_makes_no_request() {
    let server = MockServer::start().await;
    let (fetcher, urls) = session(&server);

    Mock::given(method("GET"))
        .respond_with(html(""))
        .expect(0)
        .mount(&server)
        .await;

    let result = crawl_watchlist(&fetcher, &urls, "not a user").await;
    assert_eq!(result.status, FeedStatus::BadUsername);

    let likes = crawl_liked_reviews(&fetcher, &urls, "../admin").await;
    assert_eq!(likes.status, FeedStatus::BadUsername);
}

#[tokio::test]
async fn test_ratings_marks_reviewed_films() {
    let server = MockServer::start().await;
    let (fetcher, urls) = session(&server);

    mount(
        &server,
        "/jane/films/ratings/",
        html(&grid(
            &[
                tile("heat", "Heat", Some("rated-7")),
                tile("ran", "Ran", Some("rated-10")),
            ],
            1,
        )),
        1,
    )
    .await;
    mount(
        &server,
        "/jane/films/reviews/",
        html(&grid(&[tile("ran", "Ran", None)], 1)),
        1,
    )
    .await;

    let result = crawl_ratings(&fetcher, &urls, "jane").await;

    assert_eq!(result.status, FeedStatus::Success);
    let heat = &result.records[0];
    let ran = &result.records[1];
    assert_eq!(heat.rating, Some(3.5));
    assert!(!heat.reviewed);
    assert_eq!(ran.rating, Some(5.0));
    assert!(ran.reviewed);
}

#[tokio::test]
async fn test_next_link_cycle_terminates() {
    let server = MockServer::start().await;
    let (fetcher, urls) = session(&server);

    mount(
        &server,
        "/jane/likes/reviews/",
        html(
            r#"<a href="/bob/film/heat/">Bob</a>
               <a class="next" href="/jane/likes/reviews/page/2/">Older</a>"#,
        ),
        1,
    )
    .await;
    mount(
        &server,
        "/jane/likes/reviews/page/2/",
        html(
            r#"<a href="/amy/film/ran/">Amy</a>
               <a class="next" href="/jane/likes/reviews/">Back to start</a>"#,
        ),
        1,
    )
    .await;

    let start = urls.feed("jane", FeedKind::LikedReviews, 1);
    let fragment = FeedKind::LikedReviews.pagination_fragment();
    let result = crawl_next_links(&fetcher, start, &fragment, extract_review_urls).await;

    assert_eq!(result.status, FeedStatus::Success);
    assert_eq!(result.records.len(), 2);
    assert!(result.records[0].ends_with("/bob/film/heat/"));
    assert!(result.records[1].ends_with("/amy/film/ran/"));
}

#[tokio::test]
async fn test_liked_reviews_hydrate_every_permalink() {
    let server = MockServer::start().await;
    let (fetcher, urls) = session(&server);

    mount(
        &server,
        "/jane/likes/reviews/",
        html(
            r#"<a href="/bob/film/heat/">Bob</a>
               <a href="/bob/film/heat/likes/">12 likes</a>
               <a href="/jane/likes/reviews/page/2/">2</a>"#,
        ),
        1,
    )
    .await;
    mount(
        &server,
        "/jane/likes/reviews/page/2/",
        html(r#"<a href="/amy/film/ran/">Amy</a>"#),
        1,
    )
    .await;
    mount(
        &server,
        "/bob/film/heat/",
        html(
            r#"<h1 class="headline"><a href="/film/heat/">Heat</a></h1>
               <span class="rating rated-9"></span>"#,
        ),
        1,
    )
    .await;
    mount(&server, "/amy/film/ran/", not_found(), 1).await;

    let result = crawl_liked_reviews(&fetcher, &urls, "jane").await;

    assert_eq!(result.status, FeedStatus::Success);
    assert_eq!(result.records.len(), 1);
    let review = &result.records[0];
    assert_eq!(review.reviewer, "bob");
    assert_eq!(review.film_title, "Heat");
    assert_eq!(review.rating, Some(4.5));
}

#[tokio::test]
async fn test_passed_deadline_skips_fetching() {
    let server = MockServer::start().await;
    let (fetcher, urls) = session(&server);
    let fetcher = fetcher.with_deadline(tokio::time::Instant::now() - Duration::from_millis(1));

    Mock::given(method("GET"))
        .respond_with(html(""))
        .expect(0)
        .mount(&server)
        .await;

    let result = crawl_watchlist(&fetcher, &urls, "jane").await;

    assert!(fetcher.deadline_passed());
    assert_eq!(result.status, FeedStatus::Success);
    assert!(result.records.is_empty());
}

fn reviews_page(slugs: &[&str], pages: u32) -> ResponseTemplate {
    let anchors: String = slugs
        .iter()
        .map(|slug| format!(r#"<a href="/jane/film/{slug}/">Review of {slug}</a>"#))
        .collect();
    let paginate = if pages > 1 {
        format!(r#"<div class="paginate-pages"><a>1</a><a>{}</a></div>"#, pages)
    } else {
        String::new()
    };
    html(&format!("{}{}", anchors, paginate))
}

#[tokio::test]
async fn test_reviews_estimate_ignores_absurd_page_count() {
    let server = MockServer::start().await;
    let (fetcher, urls) = session(&server);

    mount(&server, "/jane/reviews/", reviews_page(&["heat", "ran"], 4_294_967_295), 1).await;

    assert_eq!(estimate_reviews_written(&fetcher, &urls, "jane").await, 2);
}

#[tokio::test]
async fn test_reviews_estimate_from_first_and_last_page() {
    let server = MockServer::start().await;
    let (fetcher, urls) = session(&server);

    mount(&server, "/jane/reviews/", reviews_page(&["heat", "ran", "alien"], 4), 1).await;
    mount(&server, "/jane/reviews/page/4/", reviews_page(&["jaws"], 4), 1).await;

    assert_eq!(estimate_reviews_written(&fetcher, &urls, "jane").await, 10);
}

#[tokio::test]
async fn test_reviews_estimate_empty_last_page_counts_as_full() {
    let server = MockServer::start().await;
    let (fetcher, urls) = session(&server);

    mount(&server, "/jane/reviews/", reviews_page(&["heat", "ran"], 3), 1).await;
    mount(&server, "/jane/reviews/page/3/", reviews_page(&[], 3), 1).await;

    assert_eq!(estimate_reviews_written(&fetcher, &urls, "jane").await, 6);
}

#[tokio::test]
async fn test_reviews_estimate_empty_first_page_is_zero() {
    let server = MockServer::start().await;
    let (fetcher, urls) = session(&server);

    mount(&server, "/jane/reviews/", reviews_page(&[], 5), 1).await;
    mount(&server, "/jane/reviews/page/5/", reviews_page(&["heat"], 5), 0).await;

    assert_eq!(estimate_reviews_written(&fetcher, &urls, "jane").await, 0);
}

#[tokio::test]
async fn test_coordinator_stores_snapshot() {
    let server = MockServer::start().await;

    mount(
        &server,
        "/jane/",
        html(
            r#"<h1 class="person-display-name">Jane Doe</h1>
               <a href="/jane/reviews/"><span class="value">2</span> Reviews</a>"#,
        ),
        1,
    )
    .await;
    mount(
        &server,
        "/jane/films/ratings/",
        html(&grid(&[tile("heat", "Heat", Some("rated-8"))], 1)),
        1,
    )
    .await;
    mount(&server, "/jane/films/reviews/", html(""), 1).await;
    mount(
        &server,
        "/jane/watchlist/",
        html(&grid(
            &[tile("heat", "Heat", None), tile("ran", "Ran", None)],
            1,
        )),
        1,
    )
    .await;
    mount(&server, "/jane/likes/reviews/", html(""), 1).await;
    mount(
        &server,
        "/jane/followers/",
        html(r#"<table><tr><td><a href="/amy/">Amy</a></td><td><a href="/bob/">Bob</a></td></tr></table>"#),
        1,
    )
    .await;
    mount(
        &server,
        "/jane/following/",
        html(r#"<table><tr><td><a href="/bob/">Bob</a></td></tr></table>"#),
        1,
    )
    .await;

    let config = test_config(&server.uri());
    let storage = SqliteStorage::new_in_memory().expect("Failed to open storage");
    let mut coordinator = Coordinator::new(&config)
        .expect("Failed to build coordinator")
        .with_storage(storage, "test-hash");

    let snapshots = coordinator
        .ingest("jane", false)
        .await
        .expect("Ingest failed");

    assert_eq!(snapshots.len(), 1);
    let snapshot = &snapshots[0];
    assert_eq!(snapshot.status, FeedStatus::Success);
    assert_eq!(snapshot.profile.display_name.as_deref(), Some("Jane Doe"));
    assert_eq!(snapshot.profile.reviews_written, 2);
    assert_eq!(snapshot.mutuals, vec!["bob".to_string()]);

    let storage = coordinator.storage().expect("Storage should be attached");
    assert_eq!(storage.count_rows(Table::Films).unwrap(), 2);

    let films = storage.get_user_films("jane").unwrap();
    assert_eq!(films.len(), 2);
    let heat = films.iter().find(|f| f.film_identifier == "heat").unwrap();
    assert!(heat.watched && heat.in_watchlist);
    assert_eq!(heat.rating, Some(4.0));

    assert_eq!(storage.get_mutuals("jane").unwrap(), vec!["bob".to_string()]);

    let runs = storage.get_recent_runs(5).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].feed_status, Some(FeedStatus::Success));
}

#[tokio::test]
async fn test_coordinator_missing_user_stops_after_profile() {
    let server = MockServer::start().await;

    mount(&server, "/ghost/", not_found(), 1).await;

    let config = test_config(&server.uri());
    let coordinator = Coordinator::new(&config).expect("Failed to build coordinator");
    let snapshot = coordinator.scrape_user("ghost").await;

    assert_eq!(snapshot.status, FeedStatus::UserNotFound);
    assert!(snapshot.films.is_empty());
}
