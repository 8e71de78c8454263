//! Strategy Module
//!
//! Typed strategy configuration and the pure evaluator that turns a flag
//! definition plus a request context into an enable decision.

mod config;
mod evaluator;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use config::{ConfiguredStrategy, Strategy, StrategyType};
pub use evaluator::{evaluate, evaluate_at, rollout_bucket};
