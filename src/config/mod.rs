//! Configuration module for boxd-taste
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional, so an empty file (or no file at all) yields a
//! working configuration.
//!
//! # Example
//!
//! ```no_run
//! use boxd_taste::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("boxd-taste.toml")).unwrap();
//! println!("Scraping {}", config.scraper.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, HttpConfig, OutputConfig, ScraperConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, default_config_hash, load_config, load_config_with_hash, parse_config,
};
