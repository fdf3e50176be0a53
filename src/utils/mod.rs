//! Utilities for streamkeys.
//!
//! Submodules:
//! - `expression`: lexing of deferred string forms (`?base_time + amount`, `?true`, `true?false`).

pub mod expression;
