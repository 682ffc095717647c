//! Output module for statistics and control-surface responses
//!
//! This module handles:
//! - Collecting per-site and index-wide statistics
//! - The serializable response envelopes returned to callers

mod response;
pub mod stats;

pub use response::{ApiResponse, SearchResponse, StatisticsResponse};
pub use stats::{load_statistics, print_statistics, IndexStatistics, SiteStatistics, TotalStatistics};
