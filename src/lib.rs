//! Flag Keeper - feature flag evaluation engine
//!
//! Evaluates feature flags per request context, keeps a per-flag decision
//! cache coherent with every mutation, and records an append-only audit trail.

pub mod audit;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;
pub mod strategy;

pub use config::Config;
pub use error::{FlagError, Result, DEFAULT_FALLBACK_MESSAGE};
pub use models::{AuditAction, AuditEntry, FlagChanges, FlagDefinition, NewFlag, RequestContext};
pub use service::FlagService;
pub use strategy::{ConfiguredStrategy, Strategy, StrategyType};
