//! Statistics from the scrape database
//!
//! This module provides functionality for extracting and displaying
//! row counts and recent runs from the storage layer.

use crate::storage::{RunRecord, Storage, Table};
use crate::TasteError;

/// Number of recent runs shown by `--stats`
pub const RECENT_RUN_LIMIT: usize = 10;

/// Database statistics summary
#[derive(Debug, Clone)]
pub struct ScrapeStatistics {
    /// Row count for every table, in `Table::ALL` order
    pub row_counts: Vec<(Table, u64)>,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

impl ScrapeStatistics {
    /// Row count for one table
    pub fn rows(&self, table: Table) -> u64 {
        self.row_counts
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(ScrapeStatistics)` - Successfully loaded statistics
/// * `Err(TasteError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<ScrapeStatistics, TasteError> {
    let mut row_counts = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        row_counts.push((table, storage.count_rows(table)?));
    }

    let recent_runs = storage.get_recent_runs(RECENT_RUN_LIMIT)?;

    Ok(ScrapeStatistics {
        row_counts,
        recent_runs,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &ScrapeStatistics) {
    println!("=== Scrape Statistics ===\n");

    println!("Rows by Table:");
    for (table, count) in &stats.row_counts {
        println!("  {}: {}", table.name(), count);
    }
    println!();

    if stats.recent_runs.is_empty() {
        println!("No scrape runs recorded");
        return;
    }

    println!("Recent Runs ({}):", stats.recent_runs.len());
    for run in &stats.recent_runs {
        let outcome = run
            .feed_status
            .map(|s| s.to_db_string())
            .unwrap_or("-");
        println!(
            "  #{} {} [{}] {} started {}",
            run.id,
            run.username,
            run.status.to_db_string(),
            outcome,
            run.started_at
        );
    }
}
