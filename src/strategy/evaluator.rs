//! Strategy Evaluator
//!
//! Pure dispatch from a flag's strategy to an enable decision. The master
//! `enabled` switch is checked by the caller before this runs.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use murmur3::murmur3_32;

use crate::models::{FlagDefinition, RequestContext};
use crate::strategy::Strategy;

/// Evaluates `flag` for `context` against the current time.
pub fn evaluate(flag: &FlagDefinition, context: &RequestContext) -> bool {
    evaluate_at(flag, context, Utc::now())
}

/// Evaluates `flag` for `context` as if the clock read `now`.
pub fn evaluate_at(flag: &FlagDefinition, context: &RequestContext, now: DateTime<Utc>) -> bool {
    match flag.strategy.rule() {
        Strategy::Boolean => true,
        Strategy::Percentage { percentage } => {
            evaluate_percentage(&flag.flag_key, context, *percentage)
        }
        Strategy::Whitelist { whitelist } => is_listed(whitelist, context),
        Strategy::Blacklist { blacklist } => !is_listed(blacklist, context),
        Strategy::UserAttribute { attributes } => match (attributes, &context.attributes) {
            (Some(required), Some(actual)) => required
                .iter()
                .all(|(key, value)| actual.get(key) == Some(value)),
            _ => false,
        },
        Strategy::DatetimeRange { start, end } => {
            start.map_or(true, |start| now >= start) && end.map_or(true, |end| now <= end)
        }
        // Emergency off, whatever else is configured
        Strategy::KillSwitch => false,
        Strategy::Unknown => flag.enabled,
    }
}

/// Stable rollout bucket in `0..100` for a flag key and identifier.
///
/// MurmurHash3 (x86, 32-bit, seed 0) over `flag_key + identifier`.
pub fn rollout_bucket(flag_key: &str, identifier: &str) -> u32 {
    let input = format!("{}{}", flag_key, identifier);
    let hash = murmur3_32(&mut Cursor::new(input.as_bytes()), 0).unwrap_or(0);
    hash % 100
}

fn evaluate_percentage(flag_key: &str, context: &RequestContext, percentage: i64) -> bool {
    if percentage <= 0 {
        return false;
    }
    if percentage >= 100 {
        return true;
    }

    match context.bucketing_id() {
        Some(identifier) => i64::from(rollout_bucket(flag_key, identifier)) < percentage,
        None => false,
    }
}

/// Membership by user id or IP address; an empty list matches nobody.
fn is_listed(list: &[String], context: &RequestContext) -> bool {
    let contains = |candidate: &Option<String>| {
        candidate
            .as_deref()
            .is_some_and(|value| list.iter().any(|entry| entry == value))
    };
    contains(&context.user_id) || contains(&context.ip_address)
}
