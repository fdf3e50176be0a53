//! Configuration module for streamkeys.
//!
//! This module wires together the document models, the key-name vocabulary, the
//! typed deferred values and the loading/validation helpers. Import from here for a
//! convenient, stable API.
//!
//! Example:
//! use streamkeys::config::{Config, load_from_path};
//!
//! let cfg = load_from_path("config/default.json")?;

pub mod deferred;
pub mod keys;
pub mod loader;
pub mod models;
mod validate;

// Re-export core data models
pub use models::{
    ActionKind, ActionRef, BitsTrigger, Config, Document, DonationTrigger, MacroAction, MacroStep,
    RawMacro, RawSwap, RawTrigger, SubsTrigger, SwapAction, TriggerKind, TriggerRule,
};

pub use deferred::{AmountValue, FlagValue, TimeExpr};
pub use keys::{Key, KeyCombo, KeyDirection, KeyStroke};

// Re-export loader utilities
pub use loader::{
    generate_schema, load, load_from_path, load_from_path_async, load_from_reader, load_from_str,
    write_schema_to_writer,
};
