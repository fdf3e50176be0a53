//! Error types for the two configuration phases.
//!
//! Both phases are all-or-nothing: the first violation found is returned and
//! carries the dotted path of the offending field (e.g. `triggers.subs[0].community`).

use thiserror::Error;

/// Path used for findings that concern the document as a whole.
pub const ROOT_PATH: &str = "$";

/// The input document violates a structural or type constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("invalid JSON: {message}")]
    Syntax { message: String },

    #[error("{path}: malformed entry: {message}")]
    Malformed { path: String, message: String },

    #[error("{path}: missing required field")]
    MissingField { path: String },

    #[error("{path}: field is not allowed here")]
    UnexpectedField { path: String },

    #[error("{path}: unknown trigger category '{name}' (expected bits, subs or donations)")]
    UnknownCategory { path: String, name: String },

    #[error("{path}: unknown action '{name}'")]
    UnknownAction { path: String, name: String },

    #[error("{path}: {message}")]
    InvalidValue { path: String, message: String },
}

impl SchemaError {
    /// Dotted path of the offending field.
    pub fn path(&self) -> &str {
        match self {
            SchemaError::Syntax { .. } => ROOT_PATH,
            SchemaError::Malformed { path, .. }
            | SchemaError::MissingField { path }
            | SchemaError::UnexpectedField { path }
            | SchemaError::UnknownCategory { path, .. }
            | SchemaError::UnknownAction { path, .. }
            | SchemaError::InvalidValue { path, .. } => path,
        }
    }

    pub(crate) fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::InvalidValue {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn missing(path: impl Into<String>) -> Self {
        SchemaError::MissingField { path: path.into() }
    }
}

/// A deferred value references context that was not supplied (or is unusable).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("{path}: context field '{field}' was not supplied")]
    MissingContext { path: String, field: &'static str },

    /// Non-finite number, negative amount, or a deadline that overflows.
    #[error("{path}: context field '{field}' is out of range")]
    InvalidContext { path: String, field: &'static str },

    #[error("{path}: context names action '{name}', which is not a supported action")]
    UnknownAction { path: String, name: String },
}

impl ResolutionError {
    /// Dotted path of the deferred value that could not be resolved.
    pub fn path(&self) -> &str {
        match self {
            ResolutionError::MissingContext { path, .. }
            | ResolutionError::InvalidContext { path, .. }
            | ResolutionError::UnknownAction { path, .. } => path,
        }
    }
}
