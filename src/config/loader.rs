use anyhow::{Context, Result};
use schemars::{Schema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use super::models::{ActionKind, Config, Document, TriggerKind};
use super::validate::{self, DecodedTrigger};
use crate::error::{ROOT_PATH, SchemaError};

/// Validate a parsed document and build an immutable `Config`.
///
/// Pure: no I/O and no logging. The first violation found is returned.
pub fn load(document: &Value) -> Result<Config, SchemaError> {
    let doc = Document::deserialize(document).map_err(|e| SchemaError::Malformed {
        path: ROOT_PATH.to_string(),
        message: e.to_string(),
    })?;

    let mut cfg = Config::default();

    // Actions first: trigger entries refer to them by name.
    let (actions_path, actions) = supported_actions(&doc)?;
    for (name, params) in actions {
        let path = format!("{actions_path}.{name}");
        match ActionKind::from_str(name) {
            Ok(ActionKind::Macro) => cfg.macro_action = Some(validate::macro_action(&path, params)?),
            Ok(ActionKind::Swap) => cfg.swap_action = Some(validate::swap_action(&path, params)?),
            Err(()) => {
                return Err(SchemaError::UnknownAction {
                    path,
                    name: name.clone(),
                });
            }
        }
    }
    let supported: BTreeSet<ActionKind> = cfg.supported_actions().into_iter().collect();

    let triggers = doc
        .triggers
        .as_ref()
        .ok_or_else(|| SchemaError::missing("triggers"))?;

    if let Some(name) = triggers
        .keys()
        .find(|name| TriggerKind::from_str(name).is_err())
    {
        return Err(SchemaError::UnknownCategory {
            path: format!("triggers.{name}"),
            name: name.clone(),
        });
    }

    for kind in TriggerKind::ALL {
        let entries = triggers
            .get(kind.as_str())
            .ok_or_else(|| SchemaError::missing(format!("triggers.{kind}")))?;

        for (idx, entry) in entries.iter().enumerate() {
            let path = format!("triggers.{kind}[{idx}]");
            match validate::trigger_entry(kind, &path, entry, &supported)? {
                DecodedTrigger::Bits(t) => cfg.bits.push(t),
                DecodedTrigger::Subs(t) => cfg.subs.push(t),
                DecodedTrigger::Donations(t) => cfg.donations.push(t),
            }
        }
    }

    Ok(cfg)
}

/// Locate the supported-actions map: top level or under `user_actions`, never both.
fn supported_actions(doc: &Document) -> Result<(&'static str, &BTreeMap<String, Value>), SchemaError> {
    static EMPTY: BTreeMap<String, Value> = BTreeMap::new();
    match (&doc.supported_actions, &doc.user_actions) {
        (Some(_), Some(_)) => Err(SchemaError::UnexpectedField {
            path: "user_actions".to_string(),
        }),
        (Some(actions), None) => Ok(("supported_actions", actions)),
        (None, Some(user)) => Ok(("user_actions.supported_actions", &user.supported_actions)),
        (None, None) => Ok(("supported_actions", &EMPTY)),
    }
}

/// Load configuration from a string slice.
pub fn load_from_str(s: &str) -> Result<Config, SchemaError> {
    let value: Value = serde_json::from_str(s).map_err(|e| SchemaError::Syntax {
        message: e.to_string(),
    })?;
    load(&value)
}

/// Load configuration from any reader (e.g., a file).
pub fn load_from_reader<R: Read>(reader: R) -> Result<Config, SchemaError> {
    let value: Value = serde_json::from_reader(reader).map_err(|e| SchemaError::Syntax {
        message: e.to_string(),
    })?;
    load(&value)
}

/// Load configuration from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open config file {}", path_ref.display()))?;
    let cfg = load_from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid config file {}", path_ref.display()))?;
    debug!(
        target: "streamkeys::config",
        path = %path_ref.display(),
        triggers = cfg.trigger_count(),
        "Loaded config"
    );
    Ok(cfg)
}

/// Load configuration from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    use tokio::fs;
    let path_ref = path.as_ref();
    let bytes = fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;
    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON config from {}", path_ref.display()))?;
    let cfg = load(&value).with_context(|| format!("Invalid config file {}", path_ref.display()))?;
    debug!(
        target: "streamkeys::config",
        path = %path_ref.display(),
        triggers = cfg.trigger_count(),
        "Loaded config"
    );
    Ok(cfg)
}

/// Generate the JSON Schema for the configuration document (for editors and external tooling).
pub fn generate_schema() -> Schema {
    schema_for!(Document)
}

/// Write the JSON Schema for the configuration document to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> Result<()> {
    let schema = generate_schema();
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}
