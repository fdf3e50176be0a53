//! Record-level decoding: raw JSON entries into typed records.
//!
//! Each function receives the dotted path of the entry it decodes and prefixes
//! every finding with it.

use serde::Deserialize;
use serde_json::Value;
use serde_valid::Validate;
use std::collections::{BTreeSet, HashSet};

use super::deferred::{AmountValue, BASE_TIME, FlagValue, OVERRIDE_SENTINEL, TimeExpr, json_kind};
use super::keys::{Key, KeyCombo};
use super::models::{
    ActionKind, ActionRef, BitsTrigger, DonationTrigger, MacroAction, MacroStep, RawMacro,
    RawSwap, RawTrigger, SubsTrigger, SwapAction, TriggerKind, TriggerRule,
};
use crate::error::SchemaError;
use crate::utils::expression;

/// Deserialize `value` into `T`, then run its declarative constraints.
fn decode<'a, T>(path: &str, value: &'a Value) -> Result<T, SchemaError>
where
    T: Deserialize<'a> + Validate,
{
    let raw = T::deserialize(value).map_err(|e| SchemaError::Malformed {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    raw.validate()
        .map_err(|errors| SchemaError::invalid(path, errors.to_string()))?;
    Ok(raw)
}

/// A decoded trigger entry, typed by its category.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DecodedTrigger {
    Bits(BitsTrigger),
    Subs(SubsTrigger),
    Donations(DonationTrigger),
}

/// Decode one trigger entry of category `kind`.
pub(crate) fn trigger_entry(
    kind: TriggerKind,
    path: &str,
    value: &Value,
    supported: &BTreeSet<ActionKind>,
) -> Result<DecodedTrigger, SchemaError> {
    let raw: RawTrigger = decode(path, value)?;

    // `Some` exactly for subs entries.
    let community = match (kind, &raw.community) {
        (TriggerKind::Subs, None) => return Err(SchemaError::missing(format!("{path}.community"))),
        (TriggerKind::Subs, Some(v)) => Some(
            FlagValue::from_json(v)
                .map_err(|msg| SchemaError::invalid(format!("{path}.community"), msg))?,
        ),
        (_, Some(_)) => {
            return Err(SchemaError::UnexpectedField {
                path: format!("{path}.community"),
            });
        }
        (_, None) => None,
    };

    let time = time_expr(path, &raw)?;

    let amount = match &raw.amount {
        Some(v) => AmountValue::from_json(v)
            .map_err(|msg| SchemaError::invalid(format!("{path}.amount"), msg))?,
        None => return Err(SchemaError::missing(format!("{path}.amount"))),
    };

    let actions = raw
        .actions
        .iter()
        .enumerate()
        .map(|(i, name)| action_ref(&format!("{path}.actions[{i}]"), name, supported))
        .collect::<Result<Vec<_>, _>>()?;

    let rule = TriggerRule {
        amount,
        actions,
        time,
    };
    Ok(match community {
        Some(community) => DecodedTrigger::Subs(SubsTrigger { rule, community }),
        None if kind == TriggerKind::Donations => DecodedTrigger::Donations(DonationTrigger { rule }),
        None => DecodedTrigger::Bits(BitsTrigger { rule }),
    })
}

/// Check `time` is `?base_time + <field>` and that `<field>` is a numeric sibling.
fn time_expr(path: &str, raw: &RawTrigger) -> Result<TimeExpr, SchemaError> {
    let time_path = format!("{path}.time");
    let expr = expression::parse_offset_expr(&raw.time).ok_or_else(|| {
        SchemaError::invalid(
            &time_path,
            format!("'{}' does not match '?{BASE_TIME} + <field>'", raw.time),
        )
    })?;

    if expr.base != BASE_TIME {
        return Err(SchemaError::invalid(
            &time_path,
            format!("unknown context value '{}' (expected '{BASE_TIME}')", expr.base),
        ));
    }

    match expr.field.as_str() {
        "amount" if raw.amount.is_some() => Ok(TimeExpr::BasePlusAmount),
        "community" | "actions" | "time" if referenced_present(raw, &expr.field) => {
            Err(SchemaError::invalid(
                &time_path,
                format!("field '{}' is not numeric", expr.field),
            ))
        }
        field => Err(SchemaError::missing(format!("{path}.{field}"))),
    }
}

fn referenced_present(raw: &RawTrigger, field: &str) -> bool {
    match field {
        "community" => raw.community.is_some(),
        "actions" | "time" => true,
        _ => false,
    }
}

fn action_ref(
    path: &str,
    name: &str,
    supported: &BTreeSet<ActionKind>,
) -> Result<ActionRef, SchemaError> {
    if name == OVERRIDE_SENTINEL {
        return Ok(ActionRef::PendingOverride);
    }
    match name.parse::<ActionKind>() {
        Ok(kind) if supported.contains(&kind) => Ok(ActionRef::Action(kind)),
        _ => Err(SchemaError::UnknownAction {
            path: path.to_string(),
            name: name.to_string(),
        }),
    }
}

/// Decode `action_macro`: odd-length, combos at even indexes, delays at odd ones.
pub(crate) fn macro_action(path: &str, value: &Value) -> Result<MacroAction, SchemaError> {
    let raw: RawMacro = decode(path, value)?;

    if raw.keys.len() % 2 == 0 {
        return Err(SchemaError::invalid(
            format!("{path}.keys"),
            format!(
                "expected an odd number of items alternating key combos and delays, got {}",
                raw.keys.len()
            ),
        ));
    }

    let keys = raw
        .keys
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let item_path = format!("{path}.keys[{i}]");
            if i % 2 == 0 {
                let s = item.as_str().ok_or_else(|| {
                    SchemaError::invalid(
                        &item_path,
                        format!("expected a key combo string, got {}", json_kind(item)),
                    )
                })?;
                s.parse::<KeyCombo>()
                    .map(MacroStep::Keys)
                    .map_err(|e| SchemaError::invalid(&item_path, e.to_string()))
            } else {
                item.as_u64().map(MacroStep::Delay).ok_or_else(|| {
                    SchemaError::invalid(
                        &item_path,
                        format!(
                            "expected a non-negative integer delay in milliseconds, got {item}"
                        ),
                    )
                })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MacroAction { keys })
}

/// Decode `action_swap`: equal-length maps of recognized, non-repeating keys.
pub(crate) fn swap_action(path: &str, value: &Value) -> Result<SwapAction, SchemaError> {
    let raw: RawSwap = decode(path, value)?;

    if raw.map_from.len() != raw.map_to.len() {
        return Err(SchemaError::invalid(
            format!("{path}.map_to"),
            format!(
                "map_from has {} keys but map_to has {}",
                raw.map_from.len(),
                raw.map_to.len()
            ),
        ));
    }

    let map_from = key_list(&format!("{path}.map_from"), &raw.map_from)?;
    let map_to = key_list(&format!("{path}.map_to"), &raw.map_to)?;

    let randomize = match &raw.randomize {
        Some(v) => FlagValue::from_json(v)
            .map_err(|msg| SchemaError::invalid(format!("{path}.randomize"), msg))?,
        None => FlagValue::Literal(false),
    };

    Ok(SwapAction {
        map_from,
        map_to,
        randomize,
    })
}

fn key_list(path: &str, names: &[String]) -> Result<Vec<Key>, SchemaError> {
    let mut seen = HashSet::with_capacity(names.len());
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let item_path = format!("{path}[{i}]");
            let key = name
                .parse::<Key>()
                .map_err(|e| SchemaError::invalid(&item_path, e.to_string()))?;
            if !seen.insert(key) {
                return Err(SchemaError::invalid(
                    &item_path,
                    format!("key '{key}' appears twice; a swap must map keys one-to-one"),
                ));
            }
            Ok(key)
        })
        .collect()
}
