//! Sensitive-field sanitizer for PAN-OS configuration trees.
//!
//! A configuration tree is a `serde_json::Value` made of nested objects and
//! arrays. Sanitization walks every object, and for each key that matches a
//! [`SensitiveKeyRules`] rule, replaces the value with an empty string. The
//! replaced value is not descended into, whatever its type.
//!
//! Arrays are unwrapped exactly one level: objects found directly inside an
//! array are sanitized, but arrays nested inside arrays are left untouched.
//! PAN-OS exports do not produce that shape, and keeping the walk shallow
//! keeps the output identical to the historical collector.
//!
//! Matching is case-insensitive and substring-based, so keys such as
//! `subkeychain` or `local-users` are redacted too. False positives are
//! accepted over leaking credentials.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Key names that are always redacted.
pub const SENSITIVE_KEYS: &[&str] = &[
    "pre-shared-key",
    "private-key",
    "public-key",
    "key",
    "bind-password",
    "password",
    "secret",
    "auth-password",
    "priv-password",
    "phash",
    "users",
];

/// Any key containing one of these tokens is redacted.
pub const SENSITIVE_TOKENS: &[&str] = &["password", "secret", "key", "phash", "users"];

/// The built-in rule set, shared by every caller that does not supply its own.
pub static DEFAULT_RULES: Lazy<SensitiveKeyRules> = Lazy::new(SensitiveKeyRules::default);

/// The set of match rules deciding which keys are sensitive.
///
/// Both lists are stored lowercased so lookups only lowercase the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitiveKeyRules {
    exact: BTreeSet<String>,
    tokens: Vec<String>,
}

impl Default for SensitiveKeyRules {
    fn default() -> Self {
        Self::new(SENSITIVE_KEYS.iter().copied(), SENSITIVE_TOKENS.iter().copied())
    }
}

impl SensitiveKeyRules {
    /// Builds a rule set from exact key names and substring tokens.
    pub fn new<E, T>(exact: E, tokens: T) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        Self {
            exact: exact.into_iter().map(|k| k.as_ref().to_lowercase()).collect(),
            tokens: tokens
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Returns true when `key` equals an exact name or contains a token, ignoring case.
    pub fn is_sensitive(&self, key: &str) -> bool {
        let key_lower = key.to_lowercase();
        self.tokens.iter().any(|token| key_lower.contains(token.as_str()))
            || self.exact.contains(&key_lower)
    }

    /// Returns a sanitized copy of `tree`, leaving the input untouched.
    ///
    /// An object is sanitized as described in the module docs. A top-level
    /// array gets the same one-level treatment as a nested one. Scalars are
    /// returned as-is.
    pub fn sanitize(&self, tree: &Value) -> Value {
        let mut out = tree.clone();
        let redacted = match &mut out {
            Value::Object(map) => self.sanitize_in_place(map),
            Value::Array(items) => self.sanitize_sequence(items),
            _ => 0,
        };
        debug!("Sanitized configuration tree: {} field(s) redacted.", redacted);
        out
    }

    /// Sanitizes `branch` in place and returns how many fields were redacted.
    pub fn sanitize_in_place(&self, branch: &mut Map<String, Value>) -> usize {
        let mut redacted = 0;
        for (key, value) in branch.iter_mut() {
            if self.is_sensitive(key) {
                *value = Value::String(String::new());
                redacted += 1;
            } else {
                redacted += match value {
                    Value::Object(nested) => self.sanitize_in_place(nested),
                    Value::Array(items) => self.sanitize_sequence(items),
                    _ => 0,
                };
            }
        }
        redacted
    }

    fn sanitize_sequence(&self, items: &mut [Value]) -> usize {
        items
            .iter_mut()
            .map(|item| match item {
                Value::Object(nested) => self.sanitize_in_place(nested),
                _ => 0,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key_sets_match(before: &Value, after: &Value) -> bool {
        match (before, after) {
            (Value::Object(a), Value::Object(b)) => {
                a.keys().eq(b.keys())
                    && a.iter().all(|(k, v)| {
                        DEFAULT_RULES.is_sensitive(k) || key_sets_match(v, &b[k.as_str()])
                    })
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| key_sets_match(x, y))
            }
            _ => true,
        }
    }

    #[test]
    fn test_sanitize_documented_example() {
        let input = json!({
            "bind-password": "hunter2",
            "hostname": "fw1",
            "nested": {"auth-password": "x", "note": "ok"}
        });
        let expected = json!({
            "bind-password": "",
            "hostname": "fw1",
            "nested": {"auth-password": "", "note": "ok"}
        });
        assert_eq!(DEFAULT_RULES.sanitize(&input), expected);
    }

    #[test]
    fn test_sensitive_value_replaced_regardless_of_type() {
        let input = json!({
            "secret": 42,
            "phash": null,
            "users": {"admin": {"phash": "$1$abc"}},
            "private-key": ["a", "b"],
            "enabled": true
        });
        let out = DEFAULT_RULES.sanitize(&input);
        assert_eq!(out["secret"], json!(""));
        assert_eq!(out["phash"], json!(""));
        assert_eq!(out["users"], json!(""));
        assert_eq!(out["private-key"], json!(""));
        assert_eq!(out["enabled"], json!(true));
    }

    #[test]
    fn test_matching_is_case_insensitive_and_substring_based() {
        let rules = SensitiveKeyRules::default();
        assert!(rules.is_sensitive("PASSWORD"));
        assert!(rules.is_sensitive("Pre-Shared-Key"));
        assert!(rules.is_sensitive("subkeychain"));
        assert!(rules.is_sensitive("local-users"));
        assert!(rules.is_sensitive("radius-Secret-2"));
        assert!(!rules.is_sensitive("hostname"));
        assert!(!rules.is_sensitive("ip-address"));
    }

    #[test]
    fn test_objects_inside_arrays_are_sanitized() {
        let input = json!({
            "entry": [
                {"@name": "gw1", "authentication": {"pre-shared-key": {"key": "abc"}}},
                {"@name": "gw2", "peer-address": "10.0.0.1"},
                "plain-string"
            ]
        });
        let out = DEFAULT_RULES.sanitize(&input);
        assert_eq!(out["entry"][0]["authentication"]["pre-shared-key"], json!(""));
        assert_eq!(out["entry"][1]["peer-address"], json!("10.0.0.1"));
        assert_eq!(out["entry"][2], json!("plain-string"));
    }

    #[test]
    fn test_arrays_nested_in_arrays_are_not_traversed() {
        let input = json!({"outer": [[{"password": "leaks"}]]});
        let out = DEFAULT_RULES.sanitize(&input);
        assert_eq!(out, input);
    }

    #[test]
    fn test_shape_is_preserved() {
        let input = json!({
            "devices": {
                "entry": [
                    {"serial": "001", "ipsec": {"secret": "s", "peers": [{"auth-password": "p", "name": "n"}]}},
                    {"serial": "002", "mgt-config": {"users": {"admin": {}}}}
                ]
            },
            "hostname": "panorama"
        });
        let out = DEFAULT_RULES.sanitize(&input);
        assert!(key_sets_match(&input, &out));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let input = json!({
            "password": "x",
            "deviceconfig": {"system": {"hostname": "fw", "snmp-setting": {"community-secret": "c"}}},
            "list": [{"priv-password": "p"}]
        });
        let once = DEFAULT_RULES.sanitize(&input);
        let twice = DEFAULT_RULES.sanitize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sanitize_leaves_input_untouched() {
        let input = json!({"password": "x"});
        let _ = DEFAULT_RULES.sanitize(&input);
        assert_eq!(input["password"], json!("x"));
    }

    #[test]
    fn test_in_place_reports_redaction_count() {
        let mut tree = json!({
            "password": "x",
            "nested": {"secret": "y", "keep": "z"},
            "list": [{"phash": "h"}, {"name": "n"}]
        });
        let count = match &mut tree {
            Value::Object(map) => DEFAULT_RULES.sanitize_in_place(map),
            _ => unreachable!(),
        };
        assert_eq!(count, 3);
        assert_eq!(tree["nested"]["keep"], json!("z"));
    }

    #[test]
    fn test_custom_rules_replace_the_defaults() {
        let rules = SensitiveKeyRules::new(["community"], ["token"]);
        let input = json!({"community": "public", "api-token-id": "t", "password": "kept"});
        let out = rules.sanitize(&input);
        assert_eq!(out["community"], json!(""));
        assert_eq!(out["api-token-id"], json!(""));
        assert_eq!(out["password"], json!("kept"));
    }

    #[test]
    fn test_scalar_tree_is_returned_unchanged() {
        assert_eq!(DEFAULT_RULES.sanitize(&json!(null)), json!(null));
        assert_eq!(DEFAULT_RULES.sanitize(&json!("text")), json!("text"));
    }
}
