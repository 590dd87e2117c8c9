//! Component routing.
//!
//! Component interactions carry a routing token (the platform's custom id).
//! A token is either a bare routing key (`"colors"`) or a key followed by the
//! delimiter and free-form data (`"confirm:42"`). Resolution is a two-stage
//! lookup:
//!
//! 1. exact match on the whole token;
//! 2. otherwise, split once on the first `:` and look up the prefix.
//!
//! An exact match always wins over a prefix match. There is no
//! longest-prefix search: `"a:b:c"` is looked up as `"a:b:c"`, then `"a"`.

use std::collections::HashMap;

/// Separates a routing key from trailing data in a routing token.
pub const ROUTING_DELIMITER: char = ':';

/// Longest routing token the platform accepts.
pub const MAX_ROUTING_KEY_LEN: usize = 100;

/// How a routing token was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The whole token is a registered key.
    Exact,
    /// The part before the first delimiter is a registered key.
    Prefix,
}

/// A successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a, T> {
    pub unit: &'a T,
    pub kind: MatchKind,
}

/// Returns the part of `token` before the first delimiter, if there is one.
pub fn routing_prefix(token: &str) -> Option<&str> {
    token.split_once(ROUTING_DELIMITER).map(|(prefix, _)| prefix)
}

/// Returns the data after the first delimiter, if there is one.
///
/// ```rust,ignore
/// assert_eq!(routing_payload("confirm:42"), Some("42"));
/// ```
pub fn routing_payload(token: &str) -> Option<&str> {
    token.split_once(ROUTING_DELIMITER).map(|(_, rest)| rest)
}

/// Resolves `token` against `table`: exact match first, then prefix.
pub fn resolve<'a, T>(table: &'a HashMap<String, T>, token: &str) -> Option<Resolution<'a, T>> {
    if let Some(unit) = table.get(token) {
        return Some(Resolution {
            unit,
            kind: MatchKind::Exact,
        });
    }

    let prefix = routing_prefix(token)?;
    table.get(prefix).map(|unit| Resolution {
        unit,
        kind: MatchKind::Prefix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(keys: &[&str]) -> HashMap<String, String> {
        keys.iter()
            .map(|k| (k.to_string(), k.to_string()))
            .collect()
    }

    #[test]
    fn test_prefix_fallback() {
        let table = table(&["confirm"]);
        let resolved = resolve(&table, "confirm:42").unwrap();
        assert_eq!(resolved.unit, "confirm");
        assert_eq!(resolved.kind, MatchKind::Prefix);
    }

    #[test]
    fn test_exact_beats_prefix() {
        let table = table(&["confirm", "confirm:42"]);
        let resolved = resolve(&table, "confirm:42").unwrap();
        assert_eq!(resolved.unit, "confirm:42");
        assert_eq!(resolved.kind, MatchKind::Exact);
    }

    #[test]
    fn test_splits_on_first_delimiter_only() {
        let table = table(&["a", "a:b"]);
        let resolved = resolve(&table, "a:b:c").unwrap();
        assert_eq!(resolved.unit, "a");
        assert_eq!(resolved.kind, MatchKind::Prefix);
    }

    #[test]
    fn test_miss() {
        let table = table(&["confirm"]);
        assert!(resolve(&table, "cancel:1").is_none());
        assert!(resolve(&table, "confirmed").is_none());
        assert!(resolve(&table, ":confirm").is_none());
    }

    #[test]
    fn test_prefix_and_payload() {
        assert_eq!(routing_prefix("confirm:42"), Some("confirm"));
        assert_eq!(routing_payload("confirm:42"), Some("42"));
        assert_eq!(routing_prefix("colors"), None);
        assert_eq!(routing_payload("a:b:c"), Some("b:c"));
    }
}
