//! Typed forms of the deferred values a document may carry.
//!
//! On disk these are stringly typed (`"config"`, `"?true"`, `"true?false"`,
//! `"?base_time + amount"`). They are decoded once here and the resolver only
//! ever sees the enums below.

use serde_json::Value;

use crate::utils::expression::{self, BoolSentinel};

/// Sentinel asking for a value supplied by external configuration at resolve time.
pub const OVERRIDE_SENTINEL: &str = "config";

/// Context value that offset expressions are based on.
pub const BASE_TIME: &str = "base_time";

/// Trigger threshold.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AmountValue {
    /// `""`: no threshold in the document; the context supplies it.
    Unset,
    /// A concrete non-negative amount.
    Literal(f64),
    /// `"config"`: supplied by the resolve context.
    PendingOverride,
}

impl AmountValue {
    /// Decode an `amount` field. Returns a human-readable reason on failure.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) if s.trim().is_empty() => Ok(AmountValue::Unset),
            Value::String(s) if s.trim() == OVERRIDE_SENTINEL => Ok(AmountValue::PendingOverride),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("'{s}' is neither empty, \"config\" nor a number"))
                .and_then(Self::literal),
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| format!("{n} is not representable as a number"))
                .and_then(Self::literal),
            other => Err(format!(
                "expected \"\", \"config\" or a number, got {}",
                json_kind(other)
            )),
        }
    }

    fn literal(v: f64) -> Result<Self, String> {
        if v.is_finite() && v >= 0.0 {
            Ok(AmountValue::Literal(v))
        } else {
            Err(format!("amount must be a finite, non-negative number, got {v}"))
        }
    }
}

/// A trigger deadline expression.
///
/// The only form documents may use today is `?base_time + amount`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimeExpr {
    BasePlusAmount,
}

/// Boolean that may be fixed, defaulted, or left to the runtime.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FlagValue {
    /// A JSON boolean.
    Literal(bool),
    /// `?true` / `?false`: the context may override the default.
    Default(bool),
    /// `true?false`: the runtime picks one of the two.
    Choice(bool, bool),
    /// `"config"`: the context must supply the value.
    PendingOverride,
}

impl FlagValue {
    pub fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(FlagValue::Literal(*b)),
            Value::String(s) if s.trim() == OVERRIDE_SENTINEL => Ok(FlagValue::PendingOverride),
            Value::String(s) => match expression::parse_bool_sentinel(s) {
                Some(BoolSentinel::Default(b)) => Ok(FlagValue::Default(b)),
                Some(BoolSentinel::Choice(a, b)) => Ok(FlagValue::Choice(a, b)),
                None => Err(format!(
                    "'{s}' is not a boolean sentinel (expected \"?true\", \"true?false\" or \"config\")"
                )),
            },
            other => Err(format!(
                "expected a boolean or boolean sentinel, got {}",
                json_kind(other)
            )),
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
