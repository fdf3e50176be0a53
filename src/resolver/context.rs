use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::TriggerKind;

/// Runtime values consumed by `resolve_deferred`.
///
/// Every field is optional; resolution fails only when a deferred value actually
/// needs a field that is missing. Deserializable from JSON, e.g.
/// `{ "base_time": 1000, "amount": 500, "amounts": { "subs[0]": 5 } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolveContext {
    /// Timestamp that `?base_time + amount` deadlines are offset from.
    #[serde(default)]
    pub base_time: Option<f64>,

    /// Amount used by every unset or `"config"` entry without a per-entry override.
    #[serde(default)]
    pub amount: Option<f64>,

    /// Per-entry amounts keyed `"<kind>[<index>]"`, e.g. `"donations[1]"`.
    #[serde(default)]
    pub amounts: BTreeMap<String, f64>,

    /// Action names substituted for `"config"` in trigger action lists.
    #[serde(default)]
    pub actions: Option<Vec<String>>,

    /// Value for deferred `community` flags.
    #[serde(default)]
    pub community: Option<bool>,

    /// Value for deferred `randomize` flags.
    #[serde(default)]
    pub randomize: Option<bool>,

    /// Seed for `a?b` choices not pinned by `community`/`randomize`.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key used in `amounts` for an entry.
    pub fn entry_key(kind: TriggerKind, index: usize) -> String {
        format!("{kind}[{index}]")
    }

    pub fn with_base_time(mut self, base_time: f64) -> Self {
        self.base_time = Some(base_time);
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_entry_amount(mut self, kind: TriggerKind, index: usize, amount: f64) -> Self {
        self.amounts.insert(Self::entry_key(kind, index), amount);
        self
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_community(mut self, community: bool) -> Self {
        self.community = Some(community);
        self
    }

    pub fn with_randomize(mut self, randomize: bool) -> Self {
        self.randomize = Some(randomize);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Amount for a `"config"` entry: the per-entry value wins over the default.
    pub(crate) fn amount_for(&self, kind: TriggerKind, index: usize) -> Option<f64> {
        self.amounts
            .get(&Self::entry_key(kind, index))
            .copied()
            .or(self.amount)
    }
}

/// Parse a context from a JSON string.
pub fn load_context_from_str(s: &str) -> Result<ResolveContext> {
    serde_json::from_str(s).context("Failed to parse JSON resolve context")
}

/// Read a context from a JSON file asynchronously (Tokio).
pub async fn load_context_from_path_async<P: AsRef<Path>>(path: P) -> Result<ResolveContext> {
    let path_ref = path.as_ref();
    let bytes = tokio::fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read context file {}", path_ref.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON context from {}", path_ref.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_amount_beats_default() {
        let ctx = ResolveContext::new()
            .with_amount(500.0)
            .with_entry_amount(TriggerKind::Donations, 1, 20.0);
        assert_eq!(ctx.amount_for(TriggerKind::Donations, 1), Some(20.0));
        assert_eq!(ctx.amount_for(TriggerKind::Donations, 0), Some(500.0));
        assert_eq!(ResolveContext::new().amount_for(TriggerKind::Bits, 0), None);
    }

    #[test]
    fn test_context_from_json() {
        let ctx = load_context_from_str(
            r#"{"base_time": 1000, "amount": 500, "amounts": {"subs[0]": 3}, "actions": ["action_swap"]}"#,
        )
        .unwrap();
        assert_eq!(ctx.base_time, Some(1000.0));
        assert_eq!(ctx.amount_for(TriggerKind::Subs, 0), Some(3.0));
        assert_eq!(ctx.actions, Some(vec!["action_swap".to_string()]));
    }

    #[test]
    fn test_context_rejects_unknown_fields() {
        assert!(load_context_from_str(r#"{"base": 1}"#).is_err());
    }

    #[tokio::test]
    async fn test_context_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctx.json");
        std::fs::write(&path, r#"{"seed": 7}"#).unwrap();
        let ctx = load_context_from_path_async(&path).await.unwrap();
        assert_eq!(ctx, ResolveContext::new().with_seed(7));
    }
}
