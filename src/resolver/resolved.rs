use serde::Serialize;

use crate::config::{ActionKind, Key, MacroAction, TriggerKind};

/// Fully concrete configuration handed to a trigger engine.
///
/// Serializes to the same outline as the input document, with every deferred
/// marker replaced by its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub triggers: ResolvedTriggers,
    pub supported_actions: ResolvedActions,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResolvedTriggers {
    pub bits: Vec<ResolvedTrigger>,
    pub subs: Vec<ResolvedTrigger>,
    pub donations: Vec<ResolvedTrigger>,
}

impl ResolvedTriggers {
    pub fn get(&self, kind: TriggerKind) -> &[ResolvedTrigger] {
        match kind {
            TriggerKind::Bits => &self.bits,
            TriggerKind::Subs => &self.subs,
            TriggerKind::Donations => &self.donations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTrigger {
    pub amount: f64,
    pub actions: Vec<ActionKind>,
    /// Deadline: `base_time + amount`.
    pub time: f64,
    /// Subs only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResolvedActions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_macro: Option<MacroAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_swap: Option<ResolvedSwap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSwap {
    pub map_from: Vec<Key>,
    pub map_to: Vec<Key>,
    pub randomize: bool,
}
