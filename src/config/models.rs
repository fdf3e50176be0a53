use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_valid::Validate;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::deferred::{AmountValue, FlagValue, TimeExpr};
use super::keys::{Key, KeyCombo};

// ---------------------------------------------------------------------------
// Raw document (as written on disk)
// ---------------------------------------------------------------------------

/// Root of a configuration document.
///
/// Trigger entries and action parameters are kept as raw JSON here and decoded
/// one by one by the loader, so every finding can name the exact entry it
/// concerns. The `schemars` overrides describe their real shape for tooling.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// Trigger lists keyed by category: `bits`, `subs` and `donations`.
    #[serde(default)]
    #[schemars(with = "Option<TriggerSections>")]
    pub triggers: Option<BTreeMap<String, Vec<Value>>>,

    /// Supported user actions keyed by action name.
    #[serde(default)]
    #[schemars(with = "Option<SupportedActions>")]
    pub supported_actions: Option<BTreeMap<String, Value>>,

    /// Alternative nesting: `{ "user_actions": { "supported_actions": { ... } } }`.
    #[serde(default)]
    pub user_actions: Option<UserActionsDocument>,
}

/// The `user_actions` wrapper object.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UserActionsDocument {
    #[serde(default)]
    #[schemars(with = "SupportedActions")]
    pub supported_actions: BTreeMap<String, Value>,
}

/// Schema view of `triggers`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TriggerSections {
    pub bits: Vec<RawTrigger>,
    pub subs: Vec<RawTrigger>,
    pub donations: Vec<RawTrigger>,
}

/// Schema view of `supported_actions`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SupportedActions {
    #[serde(default)]
    pub action_macro: Option<RawMacro>,
    #[serde(default)]
    pub action_swap: Option<RawSwap>,
}

/// One trigger entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RawTrigger {
    /// `""` (unset), `"config"` (supplied at resolve time) or a non-negative number.
    #[serde(default)]
    pub amount: Option<Value>,

    /// Action names to run when the trigger fires; `"config"` defers to the context.
    #[validate(min_items = 1)]
    pub actions: Vec<String>,

    /// Deadline expression, `?base_time + amount`.
    pub time: String,

    /// Subs only: `"?true"`, `"?false"`, `"true?false"`, `"config"` or a boolean.
    #[serde(default)]
    pub community: Option<Value>,
}

/// `action_macro` parameters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RawMacro {
    /// Alternating key combos and delays (ms): `["w_down,s_down", 60000, "w_up,s_up"]`.
    #[validate(min_items = 1)]
    pub keys: Vec<Value>,
}

/// `action_swap` parameters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RawSwap {
    #[validate(min_items = 1)]
    pub map_from: Vec<String>,

    #[validate(min_items = 1)]
    pub map_to: Vec<String>,

    /// `"true?false"` to let the runtime decide, or a boolean. Defaults to `false`.
    #[serde(default)]
    pub randomize: Option<Value>,
}

// ---------------------------------------------------------------------------
// Typed, validated configuration
// ---------------------------------------------------------------------------

/// Trigger category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Bits,
    Subs,
    Donations,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 3] = [TriggerKind::Bits, TriggerKind::Subs, TriggerKind::Donations];

    pub fn as_str(self) -> &'static str {
        match self {
            TriggerKind::Bits => "bits",
            TriggerKind::Subs => "subs",
            TriggerKind::Donations => "donations",
        }
    }
}

impl FromStr for TriggerKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TriggerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported user action.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ActionKind {
    #[serde(rename = "action_macro")]
    Macro,
    #[serde(rename = "action_swap")]
    Swap,
}

impl ActionKind {
    pub const ALL: [ActionKind; 2] = [ActionKind::Macro, ActionKind::Swap];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Macro => "action_macro",
            ActionKind::Swap => "action_swap",
        }
    }
}

impl FromStr for ActionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry in a trigger's `actions` list.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ActionRef {
    Action(ActionKind),
    /// `"config"`: replaced by the context's action list.
    PendingOverride,
}

/// Fields shared by every trigger category.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerRule {
    pub amount: AmountValue,
    pub actions: Vec<ActionRef>,
    pub time: TimeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitsTrigger {
    pub rule: TriggerRule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubsTrigger {
    pub rule: TriggerRule,
    /// Whether community (gifted) subs count.
    pub community: FlagValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DonationTrigger {
    pub rule: TriggerRule,
}

/// One step of a key macro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MacroStep {
    Keys(KeyCombo),
    /// Pause in milliseconds.
    Delay(u64),
}

impl MacroStep {
    pub fn delay(&self) -> Option<Duration> {
        match self {
            MacroStep::Delay(ms) => Some(Duration::from_millis(*ms)),
            MacroStep::Keys(_) => None,
        }
    }
}

/// `action_macro`: key combos separated by delays, always starting and ending with a combo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroAction {
    pub keys: Vec<MacroStep>,
}

impl MacroAction {
    /// Sum of all delays.
    pub fn total_delay(&self) -> Duration {
        self.keys.iter().filter_map(MacroStep::delay).sum()
    }
}

/// `action_swap`: a bijective key remap.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapAction {
    pub map_from: Vec<Key>,
    pub map_to: Vec<Key>,
    pub randomize: FlagValue,
}

impl SwapAction {
    /// Iterate `(from, to)` pairs in document order.
    pub fn pairs(&self) -> impl Iterator<Item = (Key, Key)> + '_ {
        self.map_from.iter().copied().zip(self.map_to.iter().copied())
    }

    /// Where `key` is remapped to, if it is part of the swap.
    pub fn target_of(&self, key: Key) -> Option<Key> {
        self.pairs().find(|(from, _)| *from == key).map(|(_, to)| to)
    }
}

/// A validated configuration. Immutable once loaded; build one with `config::load`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub(crate) bits: Vec<BitsTrigger>,
    pub(crate) subs: Vec<SubsTrigger>,
    pub(crate) donations: Vec<DonationTrigger>,
    pub(crate) macro_action: Option<MacroAction>,
    pub(crate) swap_action: Option<SwapAction>,
}

impl Config {
    pub fn bits(&self) -> &[BitsTrigger] {
        &self.bits
    }

    pub fn subs(&self) -> &[SubsTrigger] {
        &self.subs
    }

    pub fn donations(&self) -> &[DonationTrigger] {
        &self.donations
    }

    /// Shared trigger fields of one category, in document order.
    pub fn triggers(&self, kind: TriggerKind) -> Vec<&TriggerRule> {
        match kind {
            TriggerKind::Bits => self.bits.iter().map(|t| &t.rule).collect(),
            TriggerKind::Subs => self.subs.iter().map(|t| &t.rule).collect(),
            TriggerKind::Donations => self.donations.iter().map(|t| &t.rule).collect(),
        }
    }

    /// Total number of trigger entries across categories.
    pub fn trigger_count(&self) -> usize {
        self.bits.len() + self.subs.len() + self.donations.len()
    }

    pub fn macro_action(&self) -> Option<&MacroAction> {
        self.macro_action.as_ref()
    }

    pub fn swap_action(&self) -> Option<&SwapAction> {
        self.swap_action.as_ref()
    }

    /// Whether the document declared `action`.
    pub fn supports(&self, action: ActionKind) -> bool {
        match action {
            ActionKind::Macro => self.macro_action.is_some(),
            ActionKind::Swap => self.swap_action.is_some(),
        }
    }

    /// Declared actions, in `ActionKind::ALL` order.
    pub fn supported_actions(&self) -> Vec<ActionKind> {
        ActionKind::ALL
            .into_iter()
            .filter(|a| self.supports(*a))
            .collect()
    }
}
