//! Flag Service
//!
//! Orchestrates the flag store, decision cache and audit log. Every mutation
//! follows the same sequence under a per-key lock:
//! 1. Check the precondition against the store
//! 2. Write to the store
//! 3. Invalidate the cached decisions for the key
//! 4. Append an audit entry (failures are logged, never returned)
//! 5. Return the resulting flag

mod locks;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::audit::{AuditLog, InMemoryAuditLog};
use crate::cache::{CacheStats, DecisionCache};
use crate::config::Config;
use crate::error::{FlagError, Result, DEFAULT_FALLBACK_MESSAGE};
use crate::models::{
    AuditAction, AuditEntry, AuditRecord, FlagChanges, FlagDefinition, NewFlag, RequestContext,
};
use crate::store::{FlagDraft, FlagPatch, FlagStore, InMemoryFlagStore};
use crate::strategy::{self, ConfiguredStrategy, StrategyType};

pub use locks::{KeyGuard, KeyLocks};

const DELETE_REASON: &str = "Flag deleted";
const TOGGLE_REASON: &str = "Flag toggled";

// == Flag Service ==
/// Entry point for the HTTP and interception layers.
#[derive(Clone)]
pub struct FlagService {
    store: Arc<dyn FlagStore>,
    audit: Arc<dyn AuditLog>,
    cache: Arc<RwLock<DecisionCache>>,
    locks: Arc<KeyLocks>,
    config: Config,
}

impl FlagService {
    // == Constructors ==
    pub fn new(store: Arc<dyn FlagStore>, audit: Arc<dyn AuditLog>, config: Config) -> Self {
        Self {
            store,
            audit,
            cache: Arc::new(RwLock::new(DecisionCache::new())),
            locks: Arc::new(KeyLocks::new()),
            config,
        }
    }

    /// Creates a service over in-memory store and audit log.
    pub fn in_memory(config: Config) -> Self {
        Self::new(
            Arc::new(InMemoryFlagStore::new()),
            Arc::new(InMemoryAuditLog::new()),
            config,
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // == Evaluate ==
    /// Decides whether `flag_key` is on for `context`.
    ///
    /// Never fails: a missing flag, a disabled flag or a store error all
    /// resolve to `false`. Missing flags are not cached, so arbitrary keys
    /// cannot grow the cache.
    pub async fn evaluate(&self, flag_key: &str, context: &RequestContext) -> bool {
        let environment = context.environment.as_str();

        if self.config.decision_cache {
            if let Some(decision) = self.cache.read().await.get(flag_key, environment) {
                debug!("Cache hit for flag {} in {}", flag_key, environment);
                return decision;
            }
        }

        // Read before the store so a racing invalidation voids our fill
        let generation = self.cache.read().await.generation();

        let (decision, cacheable) = match self
            .store
            .find_by_key_and_environment(flag_key, environment)
            .await
        {
            Ok(Some(flag)) if !flag.enabled => (false, true),
            Ok(Some(flag)) => (
                strategy::evaluate(&flag, context),
                flag.strategy.is_context_independent(),
            ),
            Ok(None) => {
                warn!(
                    "Flag {} not found in {}, defaulting to false",
                    flag_key, environment
                );
                (false, false)
            }
            Err(err) => {
                warn!(
                    "Flag {} lookup failed, defaulting to false: {}",
                    flag_key, err
                );
                (false, false)
            }
        };

        if self.config.decision_cache && cacheable {
            let stored = self
                .cache
                .write()
                .await
                .put(flag_key, environment, decision, generation);
            if !stored {
                debug!("Discarded stale decision for flag {}", flag_key);
            }
        }

        decision
    }

    /// Decision point guard: `Ok(())` when the flag is on.
    pub async fn require(&self, flag_key: &str, context: &RequestContext) -> Result<()> {
        self.require_or(flag_key, context, DEFAULT_FALLBACK_MESSAGE)
            .await
    }

    /// Like [`require`](Self::require), reporting `message` when the flag is off.
    pub async fn require_or(
        &self,
        flag_key: &str,
        context: &RequestContext,
        message: &str,
    ) -> Result<()> {
        if self.evaluate(flag_key, context).await {
            Ok(())
        } else {
            warn!("Feature {} is disabled, blocking execution", flag_key);
            Err(FlagError::FeatureDisabled {
                flag_key: flag_key.to_string(),
                message: message.to_string(),
            })
        }
    }

    // == Create ==
    /// Rejects an existing key with `Duplicate` before the strategy config is
    /// validated.
    pub async fn create_flag(&self, new_flag: NewFlag) -> Result<FlagDefinition> {
        info!("Creating new flag: {}", new_flag.flag_key);

        let _guard = self.locks.acquire(&new_flag.flag_key).await;

        if self.store.exists_by_key(&new_flag.flag_key).await? {
            return Err(FlagError::Duplicate(new_flag.flag_key));
        }

        let strategy = ConfiguredStrategy::new(
            new_flag.strategy_type.unwrap_or(StrategyType::Boolean),
            new_flag.strategy_config.as_ref(),
        )?;

        let draft = FlagDraft {
            flag_key: new_flag.flag_key,
            description: new_flag.description,
            enabled: new_flag.enabled.unwrap_or(false),
            strategy,
            environment: new_flag
                .environment
                .unwrap_or_else(|| self.config.default_environment.clone()),
            actor: new_flag
                .created_by
                .unwrap_or_else(|| self.config.default_actor.clone()),
        };
        let created = self.store.create(draft).await?;

        self.invalidate(&created.flag_key).await;
        self.record_audit(AuditRecord::new(
            &created,
            AuditAction::Create,
            None,
            Some(created.snapshot()),
            new_flag.reason,
        ))
        .await;

        Ok(created)
    }

    // == Update ==
    /// Applies the fields set in `changes`; everything else is kept.
    pub async fn update_flag(&self, flag_key: &str, changes: FlagChanges) -> Result<FlagDefinition> {
        info!("Updating flag: {}", flag_key);

        let _guard = self.locks.acquire(flag_key).await;

        let existing = self
            .store
            .find_by_key(flag_key)
            .await?
            .ok_or_else(|| FlagError::NotFound(flag_key.to_string()))?;

        let patch = FlagPatch {
            strategy: merge_strategy(&existing.strategy, &changes)?,
            description: changes.description,
            enabled: changes.enabled,
            environment: changes.environment,
            actor: changes
                .updated_by
                .unwrap_or_else(|| self.config.default_actor.clone()),
        };
        let updated = self.store.update(flag_key, patch).await?;

        self.invalidate(flag_key).await;
        self.record_audit(AuditRecord::new(
            &updated,
            AuditAction::Update,
            Some(existing.snapshot()),
            Some(updated.snapshot()),
            changes.reason,
        ))
        .await;

        Ok(updated)
    }

    // == Delete ==
    pub async fn delete_flag(&self, flag_key: &str) -> Result<()> {
        info!("Deleting flag: {}", flag_key);

        let _guard = self.locks.acquire(flag_key).await;

        if !self.store.exists_by_key(flag_key).await? {
            return Err(FlagError::NotFound(flag_key.to_string()));
        }
        let deleted = self.store.delete(flag_key).await?;

        self.invalidate(flag_key).await;
        self.record_audit(AuditRecord::new(
            &deleted,
            AuditAction::Delete,
            Some(deleted.snapshot()),
            None,
            Some(DELETE_REASON.to_string()),
        ))
        .await;

        Ok(())
    }

    // == Toggle ==
    pub async fn toggle_flag(&self, flag_key: &str) -> Result<FlagDefinition> {
        info!("Toggling flag: {}", flag_key);

        let _guard = self.locks.acquire(flag_key).await;

        let existing = self
            .store
            .find_by_key(flag_key)
            .await?
            .ok_or_else(|| FlagError::NotFound(flag_key.to_string()))?;
        let toggled = self
            .store
            .toggle(flag_key, &self.config.default_actor)
            .await?;

        self.invalidate(flag_key).await;
        self.record_audit(AuditRecord::new(
            &toggled,
            AuditAction::Toggle,
            Some(existing.snapshot()),
            Some(toggled.snapshot()),
            Some(TOGGLE_REASON.to_string()),
        ))
        .await;

        Ok(toggled)
    }

    // == Queries ==
    pub async fn list_flags(&self, environment: &str) -> Result<Vec<FlagDefinition>> {
        info!("Fetching all flags for environment: {}", environment);
        self.store.list_by_environment(environment).await
    }

    pub async fn get_flag(&self, flag_key: &str) -> Result<Option<FlagDefinition>> {
        self.store.find_by_key(flag_key).await
    }

    /// Flags in every environment whose master switch equals `enabled`.
    pub async fn flags_by_enabled(&self, enabled: bool) -> Result<Vec<FlagDefinition>> {
        self.store.list_by_enabled(enabled).await
    }

    /// Audit history of one key, newest first.
    pub async fn audit_log(&self, flag_key: &str) -> Result<Vec<AuditEntry>> {
        self.audit.list_by_key(flag_key).await
    }

    /// Audit history of one flag id, newest first. Survives the key being
    /// deleted and re-created under a new id.
    pub async fn audit_log_by_id(&self, flag_id: u64) -> Result<Vec<AuditEntry>> {
        self.audit.list_by_flag_id(flag_id).await
    }

    /// Most recent audit entries across all keys; `None` uses the configured limit.
    pub async fn recent_audit(&self, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
        let limit = limit.unwrap_or(self.config.audit_recent_limit);
        info!("Fetching recent audit logs, limit: {}", limit);
        self.audit.list_recent(limit).await
    }

    /// Zero-based page of the audit trail across all keys, newest first.
    pub async fn recent_audit_page(&self, page: usize, size: usize) -> Result<Vec<AuditEntry>> {
        info!("Fetching audit page {} of size {}", page, size);
        self.audit.list_page(page, size).await
    }

    pub async fn audit_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuditEntry>> {
        self.audit.list_between(start, end).await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    // == Helpers ==
    async fn invalidate(&self, flag_key: &str) {
        let removed = self.cache.write().await.invalidate(flag_key);
        debug!("Invalidated {} cached decisions for flag {}", removed, flag_key);
    }

    async fn record_audit(&self, record: AuditRecord) {
        let action = record.action;
        let flag_key = record.flag_key.clone();

        match self.audit.append(record).await {
            Ok(_) => info!("Audit logged: {} on flag {}", action, flag_key),
            Err(err) => warn!(
                "Audit write failed for {} on flag {}: {}",
                action, flag_key, err
            ),
        }
    }
}

/// Resolves the strategy a change-set asks for.
///
/// A new type alone re-reads the stored config object and a new config alone
/// is read under the stored type.
fn merge_strategy(
    existing: &ConfiguredStrategy,
    changes: &FlagChanges,
) -> Result<Option<ConfiguredStrategy>> {
    let strategy = match (&changes.strategy_type, &changes.strategy_config) {
        (None, None) => return Ok(None),
        (Some(strategy_type), Some(config)) => {
            ConfiguredStrategy::new(strategy_type.clone(), Some(config))?
        }
        (Some(strategy_type), None) => existing.with_type(strategy_type.clone())?,
        (None, Some(config)) => existing.with_config(config)?,
    };
    Ok(Some(strategy))
}
