//! State module for tracking how feed crawls end
//!
//! # Components
//!
//! - `FeedStatus`: terminal state of a feed crawl (success, user not found, bad username)
//! - `FeedResult`: a feed's records paired with its status

mod feed_status;

// Re-export main types
pub use feed_status::{FeedResult, FeedStatus};
