//! Cache Module
//!
//! Per-flag decision cache and its hit/miss/invalidation statistics.

mod decision;
mod stats;

// Re-export public types
pub use decision::DecisionCache;
pub use stats::{CacheCounters, CacheStats};
