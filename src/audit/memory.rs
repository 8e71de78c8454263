//! In-memory audit log kept in write order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::audit::AuditLog;
use crate::error::Result;
use crate::models::{AuditEntry, AuditRecord};

// == In-Memory Audit Log ==
/// Grows without bound; retention is left to the caller.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    /// Oldest first, so iterating in reverse yields newest-first
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, record: AuditRecord) -> Result<AuditEntry> {
        let mut entries = self.entries.write().await;

        // Clamp to the previous entry so timestamps never go backwards
        let now = Utc::now();
        let timestamp = entries
            .last()
            .map_or(now, |last| now.max(last.timestamp));
        let id = entries.len() as u64 + 1;

        let entry = AuditEntry::from_record(record, id, timestamp);
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn list_by_key(&self, flag_key: &str) -> Result<Vec<AuditEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|entry| entry.flag_key == flag_key)
            .cloned()
            .collect())
    }

    async fn list_by_flag_id(&self, flag_id: u64) -> Result<Vec<AuditEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|entry| entry.flag_id == flag_id)
            .cloned()
            .collect())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_page(&self, page: usize, size: usize) -> Result<Vec<AuditEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .skip(page.saturating_mul(size))
            .take(size)
            .cloned()
            .collect())
    }

    async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuditEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|entry| entry.timestamp >= start && entry.timestamp <= end)
            .cloned()
            .collect())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditAction;
    use chrono::Duration;

    fn record(flag_key: &str, action: AuditAction) -> AuditRecord {
        record_for(1, flag_key, action)
    }

    fn record_for(flag_id: u64, flag_key: &str, action: AuditAction) -> AuditRecord {
        AuditRecord {
            flag_id,
            flag_key: flag_key.to_string(),
            action,
            old_value: None,
            new_value: None,
            changed_by: "system".to_string(),
            reason: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_append_assigns_ids() {
        let log = InMemoryAuditLog::new();

        let first = log.append(record("dark_mode", AuditAction::Create)).await.unwrap();
        let second = log.append(record("dark_mode", AuditAction::Toggle)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(second.timestamp >= first.timestamp);
        assert_eq!(log.len().await, 2);
    }

    #[tokio::test]
    async fn test_list_by_key_newest_first() {
        let log = InMemoryAuditLog::new();
        log.append(record("dark_mode", AuditAction::Create)).await.unwrap();
        log.append(record("beta_api", AuditAction::Create)).await.unwrap();
        log.append(record("dark_mode", AuditAction::Update)).await.unwrap();
        log.append(record("dark_mode", AuditAction::Delete)).await.unwrap();

        let actions: Vec<AuditAction> = log
            .list_by_key("dark_mode")
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.action)
            .collect();
        assert_eq!(
            actions,
            vec![AuditAction::Delete, AuditAction::Update, AuditAction::Create]
        );
        assert!(log.list_by_key("unknown").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_recent_limits() {
        let log = InMemoryAuditLog::new();
        for key in ["a", "b", "c", "d"] {
            log.append(record(key, AuditAction::Create)).await.unwrap();
        }

        let keys: Vec<String> = log
            .list_recent(2)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.flag_key)
            .collect();
        assert_eq!(keys, vec!["d", "c"]);

        assert_eq!(log.list_recent(100).await.unwrap().len(), 4);
        assert!(log.list_recent(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_page_walks_newest_first() {
        let log = InMemoryAuditLog::new();
        for key in ["a", "b", "c", "d", "e"] {
            log.append(record(key, AuditAction::Create)).await.unwrap();
        }

        let page = |entries: Vec<AuditEntry>| -> Vec<String> {
            entries.into_iter().map(|entry| entry.flag_key).collect()
        };
        assert_eq!(page(log.list_page(0, 2).await.unwrap()), vec!["e", "d"]);
        assert_eq!(page(log.list_page(1, 2).await.unwrap()), vec!["c", "b"]);
        assert_eq!(page(log.list_page(2, 2).await.unwrap()), vec!["a"]);
        assert!(log.list_page(3, 2).await.unwrap().is_empty());
        assert!(log.list_page(0, 0).await.unwrap().is_empty());
        assert!(log.list_page(usize::MAX, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_flag_id_separates_recreated_key() {
        let log = InMemoryAuditLog::new();
        log.append(record_for(1, "dark_mode", AuditAction::Create)).await.unwrap();
        log.append(record_for(1, "dark_mode", AuditAction::Delete)).await.unwrap();
        log.append(record_for(2, "dark_mode", AuditAction::Create)).await.unwrap();

        let first: Vec<AuditAction> = log
            .list_by_flag_id(1)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.action)
            .collect();
        assert_eq!(first, vec![AuditAction::Delete, AuditAction::Create]);
        assert_eq!(log.list_by_flag_id(2).await.unwrap().len(), 1);
        assert_eq!(log.list_by_key("dark_mode").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_between() {
        let log = InMemoryAuditLog::new();
        let before = Utc::now() - Duration::seconds(1);
        log.append(record("dark_mode", AuditAction::Create)).await.unwrap();
        let after = Utc::now() + Duration::seconds(1);

        assert_eq!(log.list_between(before, after).await.unwrap().len(), 1);
        assert!(log
            .list_between(after, after + Duration::hours(1))
            .await
            .unwrap()
            .is_empty());
    }
}
