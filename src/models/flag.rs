//! Flag definitions and the change-sets used to create and update them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::FlagSnapshot;
use crate::strategy::{ConfiguredStrategy, StrategyType};

// == Flag Definition ==
/// A stored feature flag.
///
/// `flag_key` never changes after creation. `id`, `created_at` and
/// `updated_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagDefinition {
    pub id: u64,
    pub flag_key: String,
    pub description: Option<String>,
    /// Master switch, checked before any strategy runs
    pub enabled: bool,
    #[serde(flatten)]
    pub strategy: ConfiguredStrategy,
    pub environment: String,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FlagDefinition {
    pub fn strategy_type(&self) -> &StrategyType {
        self.strategy.strategy_type()
    }

    /// Captures the audited fields of this flag.
    pub fn snapshot(&self) -> FlagSnapshot {
        FlagSnapshot {
            enabled: self.enabled,
            strategy_type: self.strategy_type().clone(),
            strategy_config: self.strategy.config().clone(),
            environment: self.environment.clone(),
            description: self.description.clone(),
        }
    }
}

// == New Flag ==
/// Definition submitted to create a flag.
///
/// Unset fields take the engine defaults: disabled, BOOLEAN strategy, the
/// configured default environment and actor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlag {
    pub flag_key: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub strategy_type: Option<StrategyType>,
    /// Untyped config object, validated against `strategy_type` on create
    #[serde(default)]
    pub strategy_config: Option<Value>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl NewFlag {
    pub fn new(flag_key: impl Into<String>) -> Self {
        Self {
            flag_key: flag_key.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn strategy(mut self, strategy_type: StrategyType, config: Value) -> Self {
        self.strategy_type = Some(strategy_type);
        self.strategy_config = Some(config);
        self
    }

    pub fn strategy_type(mut self, strategy_type: StrategyType) -> Self {
        self.strategy_type = Some(strategy_type);
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn created_by(mut self, actor: impl Into<String>) -> Self {
        self.created_by = Some(actor.into());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

// == Flag Changes ==
/// Partial update: only the fields that are `Some` are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagChanges {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub strategy_type: Option<StrategyType>,
    #[serde(default)]
    pub strategy_config: Option<Value>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl FlagChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn strategy_type(mut self, strategy_type: StrategyType) -> Self {
        self.strategy_type = Some(strategy_type);
        self
    }

    pub fn strategy_config(mut self, config: Value) -> Self {
        self.strategy_config = Some(config);
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn updated_by(mut self, actor: impl Into<String>) -> Self {
        self.updated_by = Some(actor.into());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Strategy;
    use serde_json::json;

    fn sample_flag() -> FlagDefinition {
        let now = Utc::now();
        FlagDefinition {
            id: 7,
            flag_key: "dark_mode".to_string(),
            description: Some("Dark theme".to_string()),
            enabled: true,
            strategy: Strategy::Percentage { percentage: 50 }.into(),
            environment: "production".to_string(),
            created_by: "alice".to_string(),
            updated_by: "alice".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_flag_serializes_strategy_fields() {
        let value = serde_json::to_value(sample_flag()).unwrap();
        assert_eq!(value["flagKey"], "dark_mode");
        assert_eq!(value["strategyType"], "PERCENTAGE");
        assert_eq!(value["strategyConfig"], json!({"percentage": 50}));
        assert_eq!(value["environment"], "production");
    }

    #[test]
    fn test_snapshot_captures_audited_fields() {
        let snapshot = sample_flag().snapshot();
        assert!(snapshot.enabled);
        assert_eq!(snapshot.strategy_type, StrategyType::Percentage);
        assert_eq!(snapshot.strategy_config.get("percentage"), Some(&json!(50)));
        assert_eq!(snapshot.environment, "production");
        assert_eq!(snapshot.description.as_deref(), Some("Dark theme"));
    }

    #[test]
    fn test_new_flag_deserialize() {
        let json = r#"{
            "flagKey": "beta_api",
            "strategyType": "WHITELIST",
            "strategyConfig": {"whitelist": ["u1", "u2"]}
        }"#;
        let new_flag: NewFlag = serde_json::from_str(json).unwrap();
        assert_eq!(new_flag.flag_key, "beta_api");
        assert_eq!(new_flag.strategy_type, Some(StrategyType::Whitelist));
        assert!(new_flag.enabled.is_none());
        assert!(new_flag.environment.is_none());
    }

    #[test]
    fn test_changes_deserialize_partial() {
        let changes: FlagChanges = serde_json::from_str(r#"{"enabled": false}"#).unwrap();
        assert_eq!(changes.enabled, Some(false));
        assert!(changes.description.is_none());
        assert!(changes.strategy_type.is_none());
    }
}
