//! Audit Log Module
//!
//! Append-only record of every flag mutation with before/after snapshots.
//! Entries are never updated or deleted once written.

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{AuditEntry, AuditRecord};

pub use memory::InMemoryAuditLog;

// == Audit Log ==
/// Persistence contract for audit entries.
///
/// All listings are newest-first.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Writes `record`, assigning its id and a timestamp that never goes
    /// backwards within this log.
    async fn append(&self, record: AuditRecord) -> Result<AuditEntry>;

    async fn list_by_key(&self, flag_key: &str) -> Result<Vec<AuditEntry>>;

    /// History of one flag by id. Unlike the key, an id is never reused, so a
    /// re-created key does not merge its history with the deleted flag's.
    async fn list_by_flag_id(&self, flag_id: u64) -> Result<Vec<AuditEntry>>;

    /// The `limit` most recently written entries across all keys.
    async fn list_recent(&self, limit: usize) -> Result<Vec<AuditEntry>>;

    /// Page `page` (zero-based) of `size` entries across all keys.
    async fn list_page(&self, page: usize, size: usize) -> Result<Vec<AuditEntry>>;

    /// Entries whose timestamp falls within `start..=end`.
    async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuditEntry>>;
}
