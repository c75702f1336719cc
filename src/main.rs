//! boxd-taste main entry point
//!
//! This is the command-line interface for scraping a user's film diary.

use boxd_taste::config::{default_config_hash, load_config_with_hash, Config};
use boxd_taste::crawler::{
    crawl_followers, crawl_following, crawl_liked_reviews, crawl_ratings, crawl_reviewed_films,
    crawl_watchlist, scrape_profile, Coordinator,
};
use boxd_taste::output::{
    print_snapshot, render_films, render_people, render_profile, render_reviews,
    render_watchlist,
};
use boxd_taste::state::FeedStatus;
use boxd_taste::storage::open_storage;
use boxd_taste::compute_mutuals;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// boxd-taste: a film-diary profile scraper
///
/// Scrapes a user's ratings, watchlist, liked reviews and follow graph,
/// prints what it found, and optionally stores it in SQLite.
#[derive(Parser, Debug)]
#[command(name = "boxd-taste")]
#[command(version)]
#[command(about = "Scrape a user's film diary", long_about = None)]
struct Cli {
    /// User to scrape
    #[arg(value_name = "USERNAME", required_unless_present = "stats")]
    username: Option<String>,

    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Scrape and print a single feed instead of everything
    #[arg(long, value_enum, value_name = "KIND")]
    feed: Option<FeedArg>,

    /// Store the scrape in the configured database
    #[arg(long, conflicts_with = "feed")]
    store: bool,

    /// Also scrape each mutual of the user
    #[arg(long, conflicts_with = "feed")]
    with_mutuals: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["username", "feed", "store", "with_mutuals"])]
    stats: bool,
}

/// Feeds that can be scraped on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FeedArg {
    Profile,
    Ratings,
    Reviewed,
    Watchlist,
    Likes,
    Followers,
    Following,
    Mutuals,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    (cfg, hash)
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => (Config::default(), default_config_hash()),
    };

    if cli.stats {
        return handle_stats(&config);
    }

    let Some(username) = cli.username.as_deref() else {
        return Err("a USERNAME is required".into());
    };

    match cli.feed {
        Some(feed) => handle_feed(&config, username, feed).await,
        None => handle_scrape(config, config_hash, username, cli.store, cli.with_mutuals).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("boxd_taste=info,warn"),
            1 => EnvFilter::new("boxd_taste=debug,info"),
            2 => EnvFilter::new("boxd_taste=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use boxd_taste::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --feed mode: scrapes and prints one feed
async fn handle_feed(
    config: &Config,
    username: &str,
    feed: FeedArg,
) -> Result<(), Box<dyn std::error::Error>> {
    let coordinator = Coordinator::new(config)?;
    let fetcher = coordinator.fetcher();
    let urls = coordinator.urls();

    let (status, rendered) = match feed {
        FeedArg::Profile => {
            let (status, profile) = scrape_profile(fetcher, urls, username).await;
            (status, render_profile(&profile))
        }
        FeedArg::Ratings => {
            let result = crawl_ratings(fetcher, urls, username).await;
            (result.status, render_films(&result.records))
        }
        FeedArg::Reviewed => {
            let result = crawl_reviewed_films(fetcher, urls, username).await;
            (result.status, render_people("Reviewed films", &result.records))
        }
        FeedArg::Watchlist => {
            let result = crawl_watchlist(fetcher, urls, username).await;
            (result.status, render_watchlist(&result.records))
        }
        FeedArg::Likes => {
            let result = crawl_liked_reviews(fetcher, urls, username).await;
            (result.status, render_reviews(&result.records))
        }
        FeedArg::Followers => {
            let result = crawl_followers(fetcher, urls, username).await;
            (result.status, render_people("Followers", &result.records))
        }
        FeedArg::Following => {
            let result = crawl_following(fetcher, urls, username).await;
            (result.status, render_people("Following", &result.records))
        }
        FeedArg::Mutuals => {
            let (followers, following) = tokio::join!(
                crawl_followers(fetcher, urls, username),
                crawl_following(fetcher, urls, username),
            );
            let status = if followers.is_success() {
                following.status
            } else {
                followers.status
            };
            let mutuals = compute_mutuals(&followers.records, &following.records);
            (status, render_people("Mutuals", &mutuals))
        }
    };

    println!("=== {} ({}) ===\n{}", username, status, rendered);
    report_status(username, status);
    Ok(())
}

/// Handles the main scrape: every feed, optionally stored and fanned out
async fn handle_scrape(
    config: Config,
    config_hash: String,
    username: &str,
    store: bool,
    with_mutuals: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut coordinator = Coordinator::new(&config)?;

    if store {
        tracing::info!("Storing results in {}", config.output.database_path);
        let storage = open_storage(Path::new(&config.output.database_path))?;
        coordinator = coordinator.with_storage(storage, config_hash);
    }

    match coordinator.ingest(username, with_mutuals).await {
        Ok(snapshots) => {
            for snapshot in &snapshots {
                print_snapshot(snapshot);
            }
            if let Some(root) = snapshots.first() {
                report_status(username, root.status);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}

fn report_status(username: &str, status: FeedStatus) {
    match status {
        FeedStatus::Success => tracing::info!("Scrape of {} completed", username),
        FeedStatus::UserNotFound => tracing::warn!("User {} was not found", username),
        FeedStatus::BadUsername => tracing::warn!("{:?} is not a valid username", username),
    }
}
