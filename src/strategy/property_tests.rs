//! Property-Based Tests for Strategy Module
//!
//! Uses proptest to check evaluator invariants over arbitrary contexts.

use chrono::Utc;
use proptest::prelude::*;

use crate::models::{FlagDefinition, RequestContext};
use crate::strategy::{evaluate, rollout_bucket, Strategy as FlagStrategy};

// == Strategies ==
/// Generates flag keys in the lowercase snake form flags use
fn flag_key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_]{1,32}".prop_map(|s| s)
}

/// Generates user or session identifiers
fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9-]{1,24}".prop_map(|s| s)
}

/// Generates arbitrary request contexts, including anonymous ones
fn context_strategy() -> impl Strategy<Value = RequestContext> {
    (
        prop::option::of(identifier_strategy()),
        prop::option::of(identifier_strategy()),
        prop::option::of("[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}"),
        prop::collection::hash_map("[a-z]{1,8}", "[a-z]{1,8}", 0..4),
    )
        .prop_map(|(user_id, session_id, ip_address, attributes)| RequestContext {
            user_id,
            session_id,
            ip_address,
            user_role: None,
            attributes: Some(attributes),
            environment: "development".to_string(),
        })
}

fn flag(flag_key: &str, enabled: bool, strategy: FlagStrategy) -> FlagDefinition {
    let now = Utc::now();
    FlagDefinition {
        id: 1,
        flag_key: flag_key.to_string(),
        description: None,
        enabled,
        strategy: strategy.into(),
        environment: "development".to_string(),
        created_by: "system".to_string(),
        updated_by: "system".to_string(),
        created_at: now,
        updated_at: now,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_boolean_ignores_context(key in flag_key_strategy(), ctx in context_strategy()) {
        prop_assert!(evaluate(&flag(&key, true, FlagStrategy::Boolean), &ctx));
    }

    #[test]
    fn prop_kill_switch_always_off(
        key in flag_key_strategy(),
        enabled in any::<bool>(),
        ctx in context_strategy(),
    ) {
        prop_assert!(!evaluate(&flag(&key, enabled, FlagStrategy::KillSwitch), &ctx));
    }

    #[test]
    fn prop_percentage_is_deterministic(
        key in flag_key_strategy(),
        id in identifier_strategy(),
        percentage in 0i64..=100,
    ) {
        let flag = flag(&key, true, FlagStrategy::Percentage { percentage });
        let ctx = RequestContext::new("development").with_user_id(id);
        let first = evaluate(&flag, &ctx);
        for _ in 0..5 {
            prop_assert_eq!(evaluate(&flag, &ctx), first);
        }
    }

    #[test]
    fn prop_percentage_is_monotonic(
        key in flag_key_strategy(),
        id in identifier_strategy(),
        low in 0i64..=100,
        high in 0i64..=100,
    ) {
        prop_assume!(low < high);
        let ctx = RequestContext::new("development").with_user_id(id);
        let at_low = evaluate(&flag(&key, true, FlagStrategy::Percentage { percentage: low }), &ctx);
        let at_high = evaluate(&flag(&key, true, FlagStrategy::Percentage { percentage: high }), &ctx);
        prop_assert!(!at_low || at_high, "raising the rollout must not turn a user off");
    }

    #[test]
    fn prop_percentage_boundaries(
        key in flag_key_strategy(),
        id in identifier_strategy(),
        below in -1000i64..=0,
        above in 100i64..1000,
    ) {
        let ctx = RequestContext::new("development").with_user_id(id);
        let none = flag(&key, true, FlagStrategy::Percentage { percentage: below });
        let all = flag(&key, true, FlagStrategy::Percentage { percentage: above });
        prop_assert!(!evaluate(&none, &ctx), "non-positive rollout must be off");
        prop_assert!(evaluate(&all, &ctx), "full rollout must be on");
    }

    #[test]
    fn prop_bucket_in_range(key in flag_key_strategy(), id in identifier_strategy()) {
        prop_assert!(rollout_bucket(&key, &id) < 100);
    }

    #[test]
    fn prop_whitelisted_user_is_on(
        key in flag_key_strategy(),
        id in identifier_strategy(),
        others in prop::collection::vec(identifier_strategy(), 0..5),
    ) {
        let mut whitelist = others;
        whitelist.push(id.clone());
        let flag = flag(&key, true, FlagStrategy::Whitelist { whitelist });
        prop_assert!(evaluate(&flag, &RequestContext::new("development").with_user_id(id)));
    }

    #[test]
    fn prop_blacklisted_user_is_off(
        key in flag_key_strategy(),
        id in identifier_strategy(),
        others in prop::collection::vec(identifier_strategy(), 0..5),
    ) {
        let mut blacklist = others;
        blacklist.push(id.clone());
        let flag = flag(&key, true, FlagStrategy::Blacklist { blacklist });
        prop_assert!(!evaluate(&flag, &RequestContext::new("development").with_user_id(id)));
    }

    #[test]
    fn prop_unlisted_user_passes_blacklist(
        key in flag_key_strategy(),
        id in identifier_strategy(),
        blacklist in prop::collection::vec(identifier_strategy(), 0..5),
    ) {
        prop_assume!(!blacklist.contains(&id));
        let flag = flag(&key, true, FlagStrategy::Blacklist { blacklist });
        prop_assert!(evaluate(&flag, &RequestContext::new("development").with_user_id(id)));
    }
}
