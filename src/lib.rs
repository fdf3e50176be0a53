#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! streamkeys — typed loading and resolution of stream-trigger keyboard action configs.
//!
//! A config document declares triggers (bits, subs, donations) and the user actions
//! (key macros, key swaps) they request. Loading is a two-phase pure transformation:
//! - `config`: validate a document into an immutable, typed `Config` (or a `SchemaError`).
//! - `resolver`: resolve deferred values against a `ResolveContext` into a `ResolvedConfig`
//!   (or a `ResolutionError`).
//! - `utils`: lexing helpers for the deferred string forms.
//!
//! Use `streamkeys::prelude::*` to bring commonly used items into scope quickly.

/// Public module: configuration (models, key names, loader, schema helpers).
pub mod config;
/// Public module: error types for both phases.
pub mod error;
/// Public module: deferred value resolution.
pub mod resolver;
/// Public module: utilities (expression lexing).
pub mod utils;

pub use config::{Config, load};
pub use error::{ResolutionError, SchemaError};
pub use resolver::{ResolveContext, ResolvedConfig, resolve_deferred};

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Map a level name (trace|debug|info|warn|error) to a tracing level.
pub fn parse_level(s: &str) -> Option<tracing::Level> {
    use tracing::Level;
    match s.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize tracing (logging) with a reasonable default.
/// - Uses `level` if given, otherwise the `RUST_LOG` environment variable.
/// - Falls back to `info` level.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing(level: Option<&str>) {
    use tracing_subscriber::fmt;

    let level = level
        .map(str::to_string)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .and_then(|s| parse_level(&s))
        .unwrap_or(tracing::Level::INFO);

    // Logs go to stderr so resolved JSON on stdout stays machine-readable.
    let _ = fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use streamkeys::prelude::*;`
pub mod prelude {
    // Common result/error handling
    pub use anyhow::{Context, Error, Result, anyhow, bail, ensure};
    pub use crate::error::{ResolutionError, SchemaError};

    // Serialization
    pub use serde::{Deserialize, Serialize};

    // Tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    // Core types
    pub use crate::config::{ActionKind, Config, Key, TriggerKind};
    pub use crate::resolver::{ResolveContext, ResolvedConfig, resolve_deferred};

    // Frequently used internal modules
    pub use crate as streamkeys;
    pub use crate::{config, resolver, utils};
}
