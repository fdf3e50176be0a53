/*!
Resolver module for streamkeys.

This module wires together:
- `context`: the runtime values (`ResolveContext`) deferred entries are resolved against
- `resolved`: the concrete output records (`ResolvedConfig` and friends)

Typical usage:
- Load a `Config` with `config::load*`.
- Build a `ResolveContext` (builder methods or JSON).
- Call `resolve_deferred` (or `Config::resolve`).

Example:
```no_run
use streamkeys::config;
use streamkeys::resolver::{ResolveContext, resolve_deferred};

let cfg = config::load_from_path("config/default.json")?;
let ctx = ResolveContext::new().with_base_time(1000.0).with_amount(500.0);
let resolved = resolve_deferred(&cfg, &ctx)?;
# Ok::<(), anyhow::Error>(())
```

Resolution is pure and deterministic: the same config and context always give
the same `ResolvedConfig`, including for seeded `true?false` choices.
*/

pub mod context;
pub mod resolved;

pub use context::{ResolveContext, load_context_from_path_async, load_context_from_str};
pub use resolved::{ResolvedActions, ResolvedConfig, ResolvedSwap, ResolvedTrigger, ResolvedTriggers};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{
    ActionKind, ActionRef, AmountValue, Config, FlagValue, TimeExpr, TriggerKind, TriggerRule,
};
use crate::error::ResolutionError;

/// Resolve every deferred value in `config` against `ctx`.
pub fn resolve_deferred(
    config: &Config,
    ctx: &ResolveContext,
) -> Result<ResolvedConfig, ResolutionError> {
    let mut triggers = ResolvedTriggers::default();

    for (idx, t) in config.bits().iter().enumerate() {
        triggers
            .bits
            .push(resolve_rule(config, ctx, TriggerKind::Bits, idx, &t.rule)?);
    }
    for (idx, t) in config.subs().iter().enumerate() {
        let mut resolved = resolve_rule(config, ctx, TriggerKind::Subs, idx, &t.rule)?;
        let path = format!("triggers.subs[{idx}].community");
        resolved.community = Some(resolve_flag(
            t.community,
            ctx.community,
            ctx.seed,
            &path,
            "community",
        )?);
        triggers.subs.push(resolved);
    }
    for (idx, t) in config.donations().iter().enumerate() {
        triggers
            .donations
            .push(resolve_rule(config, ctx, TriggerKind::Donations, idx, &t.rule)?);
    }

    let action_swap = config
        .swap_action()
        .map(|swap| {
            let randomize = resolve_flag(
                swap.randomize,
                ctx.randomize,
                ctx.seed,
                "supported_actions.action_swap.randomize",
                "randomize",
            )?;
            Ok::<_, ResolutionError>(ResolvedSwap {
                map_from: swap.map_from.clone(),
                map_to: swap.map_to.clone(),
                randomize,
            })
        })
        .transpose()?;

    Ok(ResolvedConfig {
        triggers,
        supported_actions: ResolvedActions {
            action_macro: config.macro_action().cloned(),
            action_swap,
        },
    })
}

impl Config {
    /// Shorthand for `resolve_deferred(self, ctx)`.
    pub fn resolve(&self, ctx: &ResolveContext) -> Result<ResolvedConfig, ResolutionError> {
        resolve_deferred(self, ctx)
    }
}

fn resolve_rule(
    config: &Config,
    ctx: &ResolveContext,
    kind: TriggerKind,
    idx: usize,
    rule: &TriggerRule,
) -> Result<ResolvedTrigger, ResolutionError> {
    let path = format!("triggers.{kind}[{idx}]");

    let amount = match rule.amount {
        AmountValue::Literal(v) => v,
        AmountValue::Unset | AmountValue::PendingOverride => {
            let amount_path = format!("{path}.amount");
            let v = ctx
                .amount_for(kind, idx)
                .ok_or_else(|| ResolutionError::MissingContext {
                    path: amount_path.clone(),
                    field: "amount",
                })?;
            if !v.is_finite() || v < 0.0 {
                return Err(ResolutionError::InvalidContext {
                    path: amount_path,
                    field: "amount",
                });
            }
            v
        }
    };

    let time = match rule.time {
        TimeExpr::BasePlusAmount => {
            let time_path = format!("{path}.time");
            let base = ctx.base_time.ok_or_else(|| ResolutionError::MissingContext {
                path: time_path.clone(),
                field: "base_time",
            })?;
            let time = base + amount;
            // A finite base can still overflow once the amount is added.
            if !base.is_finite() || !time.is_finite() {
                return Err(ResolutionError::InvalidContext {
                    path: time_path,
                    field: "base_time",
                });
            }
            time
        }
    };

    let mut actions = Vec::with_capacity(rule.actions.len());
    for (i, action) in rule.actions.iter().enumerate() {
        match action {
            ActionRef::Action(kind) => actions.push(*kind),
            ActionRef::PendingOverride => {
                let names = ctx
                    .actions
                    .as_ref()
                    .ok_or_else(|| ResolutionError::MissingContext {
                        path: format!("{path}.actions[{i}]"),
                        field: "actions",
                    })?;
                for (j, name) in names.iter().enumerate() {
                    match name.parse::<ActionKind>() {
                        Ok(kind) if config.supports(kind) => actions.push(kind),
                        _ => {
                            return Err(ResolutionError::UnknownAction {
                                path: format!("{path}.actions[{i}] (context.actions[{j}])"),
                                name: name.clone(),
                            });
                        }
                    }
                }
            }
        }
    }

    Ok(ResolvedTrigger {
        amount,
        actions,
        time,
        community: None,
    })
}

fn resolve_flag(
    flag: FlagValue,
    supplied: Option<bool>,
    seed: Option<u64>,
    path: &str,
    field: &'static str,
) -> Result<bool, ResolutionError> {
    match flag {
        FlagValue::Literal(b) => Ok(b),
        FlagValue::Default(b) => Ok(supplied.unwrap_or(b)),
        FlagValue::PendingOverride => supplied.ok_or_else(|| ResolutionError::MissingContext {
            path: path.to_string(),
            field,
        }),
        FlagValue::Choice(a, b) => match (supplied, seed) {
            (Some(v), _) => Ok(v),
            (None, Some(seed)) => Ok(seeded_pick(seed, path, a, b)),
            (None, None) => Err(ResolutionError::MissingContext {
                path: path.to_string(),
                field,
            }),
        },
    }
}

/// Deterministic pick between `a` and `b`, keyed by the seed and the field path
/// so separate choices under one seed are independent.
fn seeded_pick(seed: u64, path: &str, a: bool, b: bool) -> bool {
    let key = path
        .bytes()
        .fold(seed, |acc, byte| acc.rotate_left(5) ^ u64::from(byte));
    let mut rng = StdRng::seed_from_u64(key);
    if rng.random_bool(0.5) { a } else { b }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::utils::expression;
    use serde_json::{Value, json};

    fn document() -> Value {
        json!({
            "triggers": {
                "bits": [
                    {"amount": "", "actions": ["config"], "time": "?base_time + amount"}
                ],
                "subs": [
                    {
                        "amount": "config",
                        "actions": ["config"],
                        "time": "?base_time + amount",
                        "community": "?true"
                    }
                ],
                "donations": [
                    {"amount": "config", "actions": ["config"], "time": "?base_time + amount"},
                    {"amount": 25, "actions": ["action_swap"], "time": "?base_time + amount"}
                ]
            },
            "supported_actions": {
                "action_macro": {"keys": ["w_down,s_down", 60000, "w_up,s_up"]},
                "action_swap": {
                    "map_from": ["w", "a", "d", "s"],
                    "map_to": ["s", "d", "a", "w"],
                    "randomize": "true?false"
                }
            }
        })
    }

    fn full_context() -> ResolveContext {
        ResolveContext::new()
            .with_base_time(1000.0)
            .with_amount(500.0)
            .with_actions(["action_macro"])
            .with_seed(42)
    }

    fn collect_strings(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.push(s.clone()),
            Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
            Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
            _ => {}
        }
    }

    #[test]
    fn test_time_is_base_plus_amount() {
        let cfg = config::load(&document()).unwrap();
        let resolved = resolve_deferred(&cfg, &full_context()).unwrap();
        assert_eq!(resolved.triggers.subs[0].time, 1500.0);
        assert_eq!(resolved.triggers.donations[0].time, 1500.0);
        assert_eq!(resolved.triggers.donations[1].time, 1025.0);
        assert_eq!(resolved.triggers.donations[1].amount, 25.0);
    }

    #[test]
    fn test_unset_amount_takes_context_amount() {
        let cfg = config::load(&document()).unwrap();
        let resolved = cfg.resolve(&full_context()).unwrap();
        let bits = &resolved.triggers.bits[0];
        assert_eq!(bits.amount, 500.0);
        assert_eq!(bits.time, 1500.0);

        let resolved = cfg
            .resolve(&full_context().with_entry_amount(TriggerKind::Bits, 0, 100.0))
            .unwrap();
        assert_eq!(resolved.triggers.bits[0].time, 1100.0);

        let no_amount = ResolveContext::new()
            .with_base_time(1000.0)
            .with_actions(["action_macro"])
            .with_seed(1);
        assert_eq!(
            cfg.resolve(&no_amount).unwrap_err(),
            ResolutionError::MissingContext {
                path: "triggers.bits[0].amount".into(),
                field: "amount"
            }
        );
    }

    #[test]
    fn test_no_deferred_markers_survive() {
        let cfg = config::load(&document()).unwrap();
        let resolved = resolve_deferred(&cfg, &full_context()).unwrap();
        let value = serde_json::to_value(&resolved).unwrap();
        let mut strings = Vec::new();
        collect_strings(&value, &mut strings);
        assert!(!strings.is_empty());
        for s in strings {
            assert!(!expression::is_deferred(&s), "deferred marker left in {s:?}");
            assert_ne!(s, "config");
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let cfg = config::load(&document()).unwrap();
        let ctx = full_context();
        assert_eq!(
            resolve_deferred(&cfg, &ctx).unwrap(),
            resolve_deferred(&cfg, &ctx).unwrap()
        );
    }

    #[test]
    fn test_missing_base_time() {
        let cfg = config::load(&document()).unwrap();
        let ctx = ResolveContext::new()
            .with_amount(500.0)
            .with_actions(["action_macro"])
            .with_seed(1);
        let err = resolve_deferred(&cfg, &ctx).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::MissingContext {
                path: "triggers.bits[0].time".into(),
                field: "base_time"
            }
        );
    }

    #[test]
    fn test_missing_amount_override() {
        let cfg = config::load(&document()).unwrap();
        let ctx = ResolveContext::new()
            .with_base_time(1000.0)
            .with_actions(["action_macro"])
            .with_seed(1);
        let err = resolve_deferred(&cfg, &ctx).unwrap_err();
        assert_eq!(err.path(), "triggers.bits[0].amount");

        let ctx = ctx.with_entry_amount(TriggerKind::Bits, 0, 0.0);
        let err = resolve_deferred(&cfg, &ctx).unwrap_err();
        assert_eq!(err.path(), "triggers.subs[0].amount");

        let ctx = ctx
            .with_entry_amount(TriggerKind::Subs, 0, 1.0)
            .with_entry_amount(TriggerKind::Donations, 0, 10.0);
        let resolved = resolve_deferred(&cfg, &ctx).unwrap();
        assert_eq!(resolved.triggers.subs[0].time, 1001.0);
        assert_eq!(resolved.triggers.donations[0].time, 1010.0);
        assert_eq!(resolved.triggers.bits[0].time, 1000.0);
    }

    #[test]
    fn test_invalid_context_numbers() {
        let cfg = config::load(&document()).unwrap();
        let err = resolve_deferred(&cfg, &full_context().with_base_time(f64::NAN)).unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidContext { field: "base_time", .. }));

        let err = resolve_deferred(&cfg, &full_context().with_amount(-3.0)).unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidContext { field: "amount", .. }));
    }

    #[test]
    fn test_overflowing_deadline_is_rejected() {
        let cfg = config::load(&json!({
            "triggers": {
                "bits": [
                    {"amount": 1.7e308, "actions": ["action_macro"], "time": "?base_time + amount"}
                ],
                "subs": [],
                "donations": []
            },
            "supported_actions": {"action_macro": {"keys": ["enter"]}}
        }))
        .unwrap();
        let err = resolve_deferred(&cfg, &ResolveContext::new().with_base_time(1.7e308)).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::InvalidContext {
                path: "triggers.bits[0].time".into(),
                field: "base_time"
            }
        );

        let resolved = resolve_deferred(&cfg, &ResolveContext::new().with_base_time(-1.7e308)).unwrap();
        assert_eq!(resolved.triggers.bits[0].time, 0.0);
    }

    #[test]
    fn test_negative_base_time_resolves() {
        let cfg = config::load(&document()).unwrap();
        let resolved = resolve_deferred(&cfg, &full_context().with_base_time(-2000.0)).unwrap();
        assert_eq!(resolved.triggers.bits[0].time, -1500.0);
        assert_eq!(resolved.triggers.donations[1].time, -1975.0);
    }

    #[test]
    fn test_config_actions_expand_from_context() {
        let cfg = config::load(&document()).unwrap();
        let ctx = full_context().with_actions(["action_swap", "action_macro"]);
        let resolved = resolve_deferred(&cfg, &ctx).unwrap();
        assert_eq!(
            resolved.triggers.bits[0].actions,
            vec![ActionKind::Swap, ActionKind::Macro]
        );
        assert_eq!(resolved.triggers.donations[1].actions, vec![ActionKind::Swap]);

        let missing = ResolveContext::new()
            .with_base_time(0.0)
            .with_amount(1.0)
            .with_seed(3);
        assert!(matches!(
            resolve_deferred(&cfg, &missing),
            Err(ResolutionError::MissingContext { field: "actions", .. })
        ));

        let unknown = full_context().with_actions(["action_teleport"]);
        assert!(matches!(
            resolve_deferred(&cfg, &unknown),
            Err(ResolutionError::UnknownAction { .. })
        ));
    }

    #[test]
    fn test_community_default_and_override() {
        let cfg = config::load(&document()).unwrap();
        let resolved = resolve_deferred(&cfg, &full_context()).unwrap();
        assert_eq!(resolved.triggers.subs[0].community, Some(true));
        assert_eq!(resolved.triggers.bits[0].community, None);

        let resolved = resolve_deferred(&cfg, &full_context().with_community(false)).unwrap();
        assert_eq!(resolved.triggers.subs[0].community, Some(false));
    }

    #[test]
    fn test_randomize_choice() {
        let cfg = config::load(&document()).unwrap();
        let pinned = resolve_deferred(&cfg, &full_context().with_randomize(true)).unwrap();
        assert!(pinned.supported_actions.action_swap.unwrap().randomize);

        let no_seed = ResolveContext::new()
            .with_base_time(0.0)
            .with_amount(1.0)
            .with_actions(["action_macro"]);
        let err = resolve_deferred(&cfg, &no_seed).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::MissingContext {
                path: "supported_actions.action_swap.randomize".into(),
                field: "randomize"
            }
        );
    }

    #[test]
    fn test_flag_resolution_rules() {
        assert_eq!(resolve_flag(FlagValue::Literal(false), Some(true), None, "p", "f"), Ok(false));
        assert_eq!(resolve_flag(FlagValue::Default(true), None, None, "p", "f"), Ok(true));
        assert_eq!(resolve_flag(FlagValue::Default(true), Some(false), None, "p", "f"), Ok(false));
        assert!(resolve_flag(FlagValue::PendingOverride, None, Some(9), "p", "f").is_err());
        assert_eq!(resolve_flag(FlagValue::Choice(true, true), None, Some(9), "p", "f"), Ok(true));
        assert_eq!(
            resolve_flag(FlagValue::Choice(true, false), None, Some(9), "p", "f"),
            resolve_flag(FlagValue::Choice(true, false), None, Some(9), "p", "f"),
        );
    }

    #[test]
    fn test_shipped_config_resolves_with_example_context() {
        let cfg = config::load_from_str(include_str!("../../config/default.json")).unwrap();
        let ctx = load_context_from_str(include_str!("../../config/context.example.json")).unwrap();
        let resolved = cfg.resolve(&ctx).unwrap();
        assert_eq!(resolved.triggers.bits[0].time, 1500.0);
        assert_eq!(resolved.triggers.subs[0].time, 1500.0);
        assert_eq!(resolved.triggers.donations[0].time, 1500.0);
        assert_eq!(resolved.triggers.donations[1].time, 1060.0);
        assert_eq!(resolved.triggers.subs[0].community, Some(true));
        assert_eq!(
            resolved.triggers.get(TriggerKind::Donations)[1].actions,
            vec![ActionKind::Macro]
        );
    }

    #[test]
    fn test_context_not_needed_without_deferred_values() {
        let cfg = config::load(&json!({
            "triggers": {"bits": [], "subs": [], "donations": []},
            "supported_actions": {"action_macro": {"keys": ["enter"]}}
        }))
        .unwrap();
        let resolved = resolve_deferred(&cfg, &ResolveContext::new()).unwrap();
        assert!(resolved.supported_actions.action_macro.is_some());
        assert!(resolved.supported_actions.action_swap.is_none());
    }
}
