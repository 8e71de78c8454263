//! Audit trail records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::FlagDefinition;
use crate::strategy::StrategyType;

/// Reason recorded when a mutation does not supply one.
pub const DEFAULT_AUDIT_REASON: &str = "No reason provided";

// == Audit Action ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Toggle,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Toggle => "TOGGLE",
        };
        f.write_str(name)
    }
}

// == Flag Snapshot ==
/// The audited fields of a flag at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagSnapshot {
    pub enabled: bool,
    pub strategy_type: StrategyType,
    pub strategy_config: Map<String, Value>,
    pub environment: String,
    pub description: Option<String>,
}

// == Audit Record ==
/// An audit entry that has not been written yet.
///
/// The log assigns `id` and `timestamp` on append.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub flag_id: u64,
    pub flag_key: String,
    pub action: AuditAction,
    pub old_value: Option<FlagSnapshot>,
    pub new_value: Option<FlagSnapshot>,
    pub changed_by: String,
    pub reason: String,
}

impl AuditRecord {
    /// Builds a record for a mutation of `flag`, attributed to its last writer.
    pub fn new(
        flag: &FlagDefinition,
        action: AuditAction,
        old_value: Option<FlagSnapshot>,
        new_value: Option<FlagSnapshot>,
        reason: Option<String>,
    ) -> Self {
        Self {
            flag_id: flag.id,
            flag_key: flag.flag_key.clone(),
            action,
            old_value,
            new_value,
            changed_by: flag.updated_by.clone(),
            reason: reason.unwrap_or_else(|| DEFAULT_AUDIT_REASON.to_string()),
        }
    }
}

// == Audit Entry ==
/// An immutable, written audit entry.
///
/// `flag_id` is a weak reference: the flag may since have been deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: u64,
    pub flag_id: u64,
    pub flag_key: String,
    pub action: AuditAction,
    pub old_value: Option<FlagSnapshot>,
    pub new_value: Option<FlagSnapshot>,
    pub changed_by: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn from_record(record: AuditRecord, id: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            flag_id: record.flag_id,
            flag_key: record.flag_key,
            action: record.action,
            old_value: record.old_value,
            new_value: record.new_value,
            changed_by: record.changed_by,
            reason: record.reason,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Strategy;

    fn flag() -> FlagDefinition {
        let now = Utc::now();
        FlagDefinition {
            id: 3,
            flag_key: "beta_api".to_string(),
            description: None,
            enabled: false,
            strategy: Strategy::Boolean.into(),
            environment: "development".to_string(),
            created_by: "alice".to_string(),
            updated_by: "bob".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_record_defaults_reason() {
        let flag = flag();
        let record = AuditRecord::new(&flag, AuditAction::Create, None, Some(flag.snapshot()), None);
        assert_eq!(record.reason, DEFAULT_AUDIT_REASON);
        assert_eq!(record.changed_by, "bob");
        assert_eq!(record.flag_id, 3);
        assert!(record.old_value.is_none());
    }

    #[test]
    fn test_action_serialization() {
        assert_eq!(serde_json::to_value(AuditAction::Toggle).unwrap(), "TOGGLE");
        assert_eq!(AuditAction::Delete.to_string(), "DELETE");
    }
}
