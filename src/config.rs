//! Configuration Module
//!
//! Handles loading engine configuration from environment variables.

use std::env;

/// Engine configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment assigned to flags created without one
    pub default_environment: String,
    /// Actor recorded when a caller does not name one
    pub default_actor: String,
    /// Default number of entries returned by `recent_audit`
    pub audit_recent_limit: usize,
    /// Whether evaluation consults the decision cache
    pub decision_cache: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FLAG_DEFAULT_ENVIRONMENT` - Environment for new flags (default: development)
    /// - `FLAG_DEFAULT_ACTOR` - Fallback actor name (default: system)
    /// - `FLAG_AUDIT_RECENT_LIMIT` - Recent audit page size (default: 20)
    /// - `FLAG_DECISION_CACHE` - Enable the decision cache (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_environment: env::var("FLAG_DEFAULT_ENVIRONMENT")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.default_environment),
            default_actor: env::var("FLAG_DEFAULT_ACTOR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.default_actor),
            audit_recent_limit: env::var("FLAG_AUDIT_RECENT_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.audit_recent_limit),
            decision_cache: env::var("FLAG_DECISION_CACHE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.decision_cache),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_environment: "development".to_string(),
            default_actor: "system".to_string(),
            audit_recent_limit: 20,
            decision_cache: true,
        }
    }
}
