/// An offset expression of the form `?base + field`.
///
/// `base` names a value supplied by the resolve context; `field` names a sibling
/// field of the entry the expression lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetExpr {
    pub base: String,
    pub field: String,
}

/// Deferred boolean forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolSentinel {
    /// `?true` / `?false`: a default the context may override.
    Default(bool),
    /// `true?false`: either value, picked by the runtime.
    Choice(bool, bool),
}

/// Parse an offset expression such as `?base_time + amount`.
///
/// Notes:
/// - The leading `?` is mandatory; it marks the string as deferred.
/// - Whitespace around the operands and the `+` is ignored.
/// - Both operands must be plain identifiers (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn parse_offset_expr(s: &str) -> Option<OffsetExpr> {
    let rest = s.trim().strip_prefix('?')?;
    let (base, field) = rest.split_once('+')?;
    let (base, field) = (base.trim(), field.trim());
    if !is_identifier(base) || !is_identifier(field) {
        return None;
    }
    Some(OffsetExpr {
        base: base.to_string(),
        field: field.to_string(),
    })
}

/// Parse `?true`, `?false` or a `a?b` choice between two booleans.
pub fn parse_bool_sentinel(s: &str) -> Option<BoolSentinel> {
    let s = s.trim();
    if let Some(rest) = s.strip_prefix('?') {
        return parse_bool(rest.trim()).map(BoolSentinel::Default);
    }
    let (lhs, rhs) = s.split_once('?')?;
    Some(BoolSentinel::Choice(
        parse_bool(lhs.trim())?,
        parse_bool(rhs.trim())?,
    ))
}

/// True if the string still carries a deferred marker (`?x...` or `x?y`).
#[cfg(test)]
pub(crate) fn is_deferred(s: &str) -> bool {
    let s = s.trim();
    s.starts_with('?') || parse_bool_sentinel(s).is_some()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_expr_basic() {
        let expr = parse_offset_expr("?base_time + amount").unwrap();
        assert_eq!(expr.base, "base_time");
        assert_eq!(expr.field, "amount");
    }

    #[test]
    fn test_offset_expr_whitespace_is_ignored() {
        assert_eq!(
            parse_offset_expr("  ?base_time+amount "),
            parse_offset_expr("?base_time   +   amount")
        );
    }

    #[test]
    fn test_offset_expr_rejects_malformed() {
        assert!(parse_offset_expr("base_time + amount").is_none());
        assert!(parse_offset_expr("?base_time").is_none());
        assert!(parse_offset_expr("?base_time + amount + 3").is_none());
        assert!(parse_offset_expr("?base_time + ").is_none());
        assert!(parse_offset_expr("?1base + amount").is_none());
    }

    #[test]
    fn test_bool_sentinels() {
        assert_eq!(parse_bool_sentinel("?true"), Some(BoolSentinel::Default(true)));
        assert_eq!(parse_bool_sentinel("?false"), Some(BoolSentinel::Default(false)));
        assert_eq!(
            parse_bool_sentinel("true?false"),
            Some(BoolSentinel::Choice(true, false))
        );
        assert_eq!(parse_bool_sentinel("true"), None);
        assert_eq!(parse_bool_sentinel("?yes"), None);
        assert_eq!(parse_bool_sentinel("?true?false"), None);
    }

    #[test]
    fn test_is_deferred() {
        assert!(is_deferred("?base_time + amount"));
        assert!(is_deferred("false?true"));
        assert!(!is_deferred("w_down,s_down"));
        assert!(!is_deferred("action_macro"));
    }
}
