//! In-memory flag store backed by a HashMap keyed on flag key.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{FlagError, Result};
use crate::models::FlagDefinition;
use crate::store::{FlagDraft, FlagPatch, FlagStore};

// == In-Memory Flag Store ==
#[derive(Debug)]
pub struct InMemoryFlagStore {
    /// flag key -> definition
    flags: RwLock<HashMap<String, FlagDefinition>>,
    next_id: AtomicU64,
}

impl InMemoryFlagStore {
    pub fn new() -> Self {
        Self {
            flags: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the current number of stored flags.
    pub async fn len(&self) -> usize {
        self.flags.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.flags.read().await.is_empty()
    }
}

impl Default for InMemoryFlagStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlagStore for InMemoryFlagStore {
    async fn create(&self, draft: FlagDraft) -> Result<FlagDefinition> {
        let mut flags = self.flags.write().await;
        if flags.contains_key(&draft.flag_key) {
            return Err(FlagError::Duplicate(draft.flag_key));
        }

        let now = Utc::now();
        let flag = FlagDefinition {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            flag_key: draft.flag_key,
            description: draft.description,
            enabled: draft.enabled,
            strategy: draft.strategy,
            environment: draft.environment,
            created_by: draft.actor.clone(),
            updated_by: draft.actor,
            created_at: now,
            updated_at: now,
        };

        flags.insert(flag.flag_key.clone(), flag.clone());
        Ok(flag)
    }

    async fn find_by_key(&self, flag_key: &str) -> Result<Option<FlagDefinition>> {
        Ok(self.flags.read().await.get(flag_key).cloned())
    }

    async fn find_by_key_and_environment(
        &self,
        flag_key: &str,
        environment: &str,
    ) -> Result<Option<FlagDefinition>> {
        Ok(self
            .flags
            .read()
            .await
            .get(flag_key)
            .filter(|flag| flag.environment == environment)
            .cloned())
    }

    async fn list_by_environment(&self, environment: &str) -> Result<Vec<FlagDefinition>> {
        let mut flags: Vec<FlagDefinition> = self
            .flags
            .read()
            .await
            .values()
            .filter(|flag| flag.environment == environment)
            .cloned()
            .collect();
        flags.sort_by(|a, b| a.flag_key.cmp(&b.flag_key));
        Ok(flags)
    }

    async fn list_by_enabled(&self, enabled: bool) -> Result<Vec<FlagDefinition>> {
        let mut flags: Vec<FlagDefinition> = self
            .flags
            .read()
            .await
            .values()
            .filter(|flag| flag.enabled == enabled)
            .cloned()
            .collect();
        flags.sort_by(|a, b| a.flag_key.cmp(&b.flag_key));
        Ok(flags)
    }

    async fn update(&self, flag_key: &str, patch: FlagPatch) -> Result<FlagDefinition> {
        let mut flags = self.flags.write().await;
        let flag = flags
            .get_mut(flag_key)
            .ok_or_else(|| FlagError::NotFound(flag_key.to_string()))?;

        if let Some(description) = patch.description {
            flag.description = Some(description);
        }
        if let Some(enabled) = patch.enabled {
            flag.enabled = enabled;
        }
        if let Some(strategy) = patch.strategy {
            flag.strategy = strategy;
        }
        if let Some(environment) = patch.environment {
            flag.environment = environment;
        }
        flag.updated_by = patch.actor;
        flag.updated_at = Utc::now();

        Ok(flag.clone())
    }

    async fn delete(&self, flag_key: &str) -> Result<FlagDefinition> {
        self.flags
            .write()
            .await
            .remove(flag_key)
            .ok_or_else(|| FlagError::NotFound(flag_key.to_string()))
    }

    async fn toggle(&self, flag_key: &str, actor: &str) -> Result<FlagDefinition> {
        let mut flags = self.flags.write().await;
        let flag = flags
            .get_mut(flag_key)
            .ok_or_else(|| FlagError::NotFound(flag_key.to_string()))?;

        flag.enabled = !flag.enabled;
        flag.updated_by = actor.to_string();
        flag.updated_at = Utc::now();

        Ok(flag.clone())
    }

    async fn exists_by_key(&self, flag_key: &str) -> Result<bool> {
        Ok(self.flags.read().await.contains_key(flag_key))
    }
}
