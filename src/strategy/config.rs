//! Strategy Configuration Module
//!
//! Parses the untyped `strategyConfig` object submitted with a flag into a
//! typed [`Strategy`], rejecting configs whose fields have the wrong shape.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::error::{FlagError, Result};

// == Strategy Type ==
/// Name of an evaluation strategy as submitted by callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StrategyType {
    Boolean,
    Percentage,
    Whitelist,
    Blacklist,
    UserAttribute,
    DatetimeRange,
    KillSwitch,
    /// A name this engine does not recognise, kept as submitted
    Unknown(String),
}

impl StrategyType {
    pub fn as_str(&self) -> &str {
        match self {
            StrategyType::Boolean => "BOOLEAN",
            StrategyType::Percentage => "PERCENTAGE",
            StrategyType::Whitelist => "WHITELIST",
            StrategyType::Blacklist => "BLACKLIST",
            StrategyType::UserAttribute => "USER_ATTRIBUTE",
            StrategyType::DatetimeRange => "DATETIME_RANGE",
            StrategyType::KillSwitch => "KILL_SWITCH",
            StrategyType::Unknown(name) => name,
        }
    }
}

impl From<String> for StrategyType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "BOOLEAN" => StrategyType::Boolean,
            "PERCENTAGE" => StrategyType::Percentage,
            "WHITELIST" => StrategyType::Whitelist,
            "BLACKLIST" => StrategyType::Blacklist,
            "USER_ATTRIBUTE" => StrategyType::UserAttribute,
            "DATETIME_RANGE" => StrategyType::DatetimeRange,
            "KILL_SWITCH" => StrategyType::KillSwitch,
            _ => StrategyType::Unknown(name),
        }
    }
}

impl From<&str> for StrategyType {
    fn from(name: &str) -> Self {
        StrategyType::from(name.to_string())
    }
}

impl From<StrategyType> for String {
    fn from(strategy_type: StrategyType) -> Self {
        strategy_type.as_str().to_string()
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Strategy ==
/// The typed evaluation rule read out of a strategy config.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Boolean,
    /// Rollout to `percentage` of identifiers; an absent value reads as 0
    Percentage { percentage: i64 },
    Whitelist { whitelist: Vec<String> },
    Blacklist { blacklist: Vec<String> },
    /// `None` means no requirement was configured, which never matches
    UserAttribute {
        attributes: Option<BTreeMap<String, String>>,
    },
    /// Closed interval; a missing bound leaves that side open
    DatetimeRange {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
    KillSwitch,
    Unknown,
}

impl Strategy {
    /// Reads `config` as the configuration of `strategy_type`.
    ///
    /// Keys the strategy does not use are ignored.
    pub fn parse(strategy_type: &StrategyType, config: &Map<String, Value>) -> Result<Self> {
        let strategy = match strategy_type {
            StrategyType::Boolean => Strategy::Boolean,
            StrategyType::Percentage => Strategy::Percentage {
                percentage: read_integer(config, "percentage")?.unwrap_or(0),
            },
            StrategyType::Whitelist => Strategy::Whitelist {
                whitelist: read_string_list(config, "whitelist")?,
            },
            StrategyType::Blacklist => Strategy::Blacklist {
                blacklist: read_string_list(config, "blacklist")?,
            },
            StrategyType::UserAttribute => Strategy::UserAttribute {
                attributes: read_string_map(config, "attributes")?,
            },
            StrategyType::DatetimeRange => {
                let start = read_timestamp(config, "start")?;
                let end = read_timestamp(config, "end")?;
                if let (Some(start), Some(end)) = (start, end) {
                    if start > end {
                        return Err(FlagError::InvalidStrategyConfig(format!(
                            "start {} is after end {}",
                            start.to_rfc3339(),
                            end.to_rfc3339()
                        )));
                    }
                }
                Strategy::DatetimeRange { start, end }
            }
            StrategyType::KillSwitch => Strategy::KillSwitch,
            StrategyType::Unknown(_) => Strategy::Unknown,
        };

        Ok(strategy)
    }

    /// True when the decision does not depend on the request context or the clock.
    pub fn is_context_independent(&self) -> bool {
        matches!(
            self,
            Strategy::Boolean | Strategy::KillSwitch | Strategy::Unknown
        )
    }

    fn strategy_type(&self) -> StrategyType {
        match self {
            Strategy::Boolean => StrategyType::Boolean,
            Strategy::Percentage { .. } => StrategyType::Percentage,
            Strategy::Whitelist { .. } => StrategyType::Whitelist,
            Strategy::Blacklist { .. } => StrategyType::Blacklist,
            Strategy::UserAttribute { .. } => StrategyType::UserAttribute,
            Strategy::DatetimeRange { .. } => StrategyType::DatetimeRange,
            Strategy::KillSwitch => StrategyType::KillSwitch,
            Strategy::Unknown => StrategyType::Unknown("UNKNOWN".to_string()),
        }
    }

    /// Renders the rule as an untyped config object.
    fn to_config(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            Strategy::Percentage { percentage } => {
                map.insert("percentage".to_string(), json!(percentage));
            }
            Strategy::Whitelist { whitelist } => {
                map.insert("whitelist".to_string(), json!(whitelist));
            }
            Strategy::Blacklist { blacklist } => {
                map.insert("blacklist".to_string(), json!(blacklist));
            }
            Strategy::UserAttribute {
                attributes: Some(attributes),
            } => {
                map.insert("attributes".to_string(), json!(attributes));
            }
            Strategy::DatetimeRange { start, end } => {
                if let Some(start) = start {
                    map.insert("start".to_string(), json!(start.to_rfc3339()));
                }
                if let Some(end) = end {
                    map.insert("end".to_string(), json!(end.to_rfc3339()));
                }
            }
            _ => {}
        }
        map
    }
}

// == Configured Strategy ==
/// A strategy type, the config object exactly as submitted, and the rule
/// read from it.
///
/// The submitted object is what gets stored, serialized and audited. The
/// typed rule is only used for evaluation, so switching the type re-reads the
/// same object instead of discarding keys the previous type ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfiguredStrategy {
    strategy_type: StrategyType,
    config: Map<String, Value>,
    rule: Strategy,
}

impl ConfiguredStrategy {
    /// Validates `config` for `strategy_type`.
    ///
    /// `None` and JSON `null` are treated as an empty object.
    pub fn new(strategy_type: StrategyType, config: Option<&Value>) -> Result<Self> {
        let config = match config {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(FlagError::InvalidStrategyConfig(format!(
                    "strategyConfig must be an object, got {}",
                    other
                )))
            }
        };
        let rule = Strategy::parse(&strategy_type, &config)?;
        Ok(Self {
            strategy_type,
            config,
            rule,
        })
    }

    /// Same config read under another type.
    pub fn with_type(&self, strategy_type: StrategyType) -> Result<Self> {
        let rule = Strategy::parse(&strategy_type, &self.config)?;
        Ok(Self {
            strategy_type,
            config: self.config.clone(),
            rule,
        })
    }

    /// Replacement config read under the current type.
    pub fn with_config(&self, config: &Value) -> Result<Self> {
        Self::new(self.strategy_type.clone(), Some(config))
    }

    pub fn strategy_type(&self) -> &StrategyType {
        &self.strategy_type
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn rule(&self) -> &Strategy {
        &self.rule
    }

    pub fn is_context_independent(&self) -> bool {
        self.rule.is_context_independent()
    }
}

impl Default for ConfiguredStrategy {
    fn default() -> Self {
        Strategy::Boolean.into()
    }
}

impl From<Strategy> for ConfiguredStrategy {
    fn from(rule: Strategy) -> Self {
        Self {
            strategy_type: rule.strategy_type(),
            config: rule.to_config(),
            rule,
        }
    }
}

impl Serialize for ConfiguredStrategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("strategyType", &self.strategy_type)?;
        map.serialize_entry("strategyConfig", &self.config)?;
        map.end()
    }
}

// == Field Readers ==
fn invalid_field(field: &str, expected: &str, got: &Value) -> FlagError {
    FlagError::InvalidStrategyConfig(format!("'{}' must be {}, got {}", field, expected, got))
}

fn read_integer(config: &Map<String, Value>, field: &str) -> Result<Option<i64>> {
    match config.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid_field(field, "an integer", value)),
    }
}

fn read_string_list(config: &Map<String, Value>, field: &str) -> Result<Vec<String>> {
    match config.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid_field(field, "a list of strings", item))
            })
            .collect(),
        Some(other) => Err(invalid_field(field, "a list of strings", other)),
    }
}

fn read_string_map(
    config: &Map<String, Value>,
    field: &str,
) -> Result<Option<BTreeMap<String, String>>> {
    match config.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(entries)) => entries
            .iter()
            .map(|(key, value)| {
                value
                    .as_str()
                    .map(|v| (key.clone(), v.to_string()))
                    .ok_or_else(|| invalid_field(field, "a map of strings", value))
            })
            .collect::<Result<BTreeMap<_, _>>>()
            .map(Some),
        Some(other) => Err(invalid_field(field, "a map of strings", other)),
    }
}

fn read_timestamp(config: &Map<String, Value>, field: &str) -> Result<Option<DateTime<Utc>>> {
    match config.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| {
                FlagError::InvalidStrategyConfig(format!(
                    "'{}' is not an RFC 3339 timestamp: {}",
                    field, e
                ))
            }),
        Some(other) => Err(invalid_field(field, "an RFC 3339 string", other)),
    }
}
