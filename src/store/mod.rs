//! Flag Store Module
//!
//! Persistence contract for flag definitions plus an in-memory implementation.
//! The store owns flag lifetime and assigns ids and timestamps.

mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::FlagDefinition;
use crate::strategy::ConfiguredStrategy;

pub use memory::InMemoryFlagStore;

// == Flag Draft ==
/// A fully resolved flag ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagDraft {
    pub flag_key: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub strategy: ConfiguredStrategy,
    pub environment: String,
    /// Recorded as both `created_by` and `updated_by`
    pub actor: String,
}

// == Flag Patch ==
/// Fields to overwrite on an existing flag; `None` keeps the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagPatch {
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub strategy: Option<ConfiguredStrategy>,
    pub environment: Option<String>,
    pub actor: String,
}

// == Flag Store ==
/// Source of truth for flag definitions.
///
/// Keys are unique across environments. Every write refreshes
/// `updated_by`/`updated_at`.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Inserts a new flag; fails with `Duplicate` if the key exists.
    async fn create(&self, draft: FlagDraft) -> Result<FlagDefinition>;

    async fn find_by_key(&self, flag_key: &str) -> Result<Option<FlagDefinition>>;

    async fn find_by_key_and_environment(
        &self,
        flag_key: &str,
        environment: &str,
    ) -> Result<Option<FlagDefinition>>;

    /// Flags in `environment`, ordered by key.
    async fn list_by_environment(&self, environment: &str) -> Result<Vec<FlagDefinition>>;

    /// Flags across all environments whose master switch equals `enabled`,
    /// ordered by key.
    async fn list_by_enabled(&self, enabled: bool) -> Result<Vec<FlagDefinition>>;

    /// Applies a partial update; fails with `NotFound` if the key is absent.
    async fn update(&self, flag_key: &str, patch: FlagPatch) -> Result<FlagDefinition>;

    /// Removes the flag and returns it as it was.
    async fn delete(&self, flag_key: &str) -> Result<FlagDefinition>;

    /// Flips `enabled` unconditionally.
    async fn toggle(&self, flag_key: &str, actor: &str) -> Result<FlagDefinition>;

    async fn exists_by_key(&self, flag_key: &str) -> Result<bool>;
}
