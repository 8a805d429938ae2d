//! Multi-value encoding for parameter values.
//!
//! Lists are stored as items joined by `;`. Maps are stored as `key@value`
//! entries joined by `;`. Neither form escapes its separators: an item that
//! contains `;` or `@` does not survive a round trip. Existing persisted data
//! uses this exact format, so it is kept as is.

use crate::key::ValueKind;

/// Separator between list items and between map entries.
pub const SEPARATOR: char = ';';

/// Separator between a map entry's key and value.
pub const KV_SEPARATOR: char = '@';

/// Joins list items with `;`.
///
/// An empty list encodes to `None`, which saving treats as a delete.
///
/// ```rust
/// use apim_params::codec::encode_list;
///
/// assert_eq!(encode_list(["a", "b", "c"]).as_deref(), Some("a;b;c"));
/// assert_eq!(encode_list(Vec::<String>::new()), None);
/// ```
pub fn encode_list<I, S>(values: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut encoded = String::new();
    let mut any = false;
    for value in values {
        if any {
            encoded.push(SEPARATOR);
        }
        encoded.push_str(value.as_ref());
        any = true;
    }
    any.then_some(encoded)
}

/// Splits a stored list value on `;`.
///
/// An empty value decodes to an empty list.
#[must_use]
pub fn decode_list(raw: &str) -> Vec<String> {
    decode_list_filtered(raw, |_| true)
}

/// Splits a stored list value on `;`, keeping only items accepted by `filter`.
pub fn decode_list_filtered(raw: &str, filter: impl Fn(&str) -> bool) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(SEPARATOR)
        .filter(|item| filter(item))
        .map(str::to_string)
        .collect()
}

/// Encodes map entries as `key@value` pairs joined by `;`, in iteration order.
///
/// No entries encode to `None`.
///
/// ```rust
/// use apim_params::codec::encode_map;
///
/// assert_eq!(encode_map([("a", "1"), ("b", "2")]).as_deref(), Some("a@1;b@2"));
/// ```
pub fn encode_map<I, K, V>(entries: I) -> Option<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    encode_list(
        entries
            .into_iter()
            .map(|(key, value)| format!("{}{KV_SEPARATOR}{}", key.as_ref(), value.as_ref())),
    )
}

/// Decodes `key@value` entries in stored order.
///
/// The value is everything after the first `@`; an entry without `@` decodes
/// with an empty value. Empty entries are skipped.
#[must_use]
pub fn decode_map(raw: &str) -> Vec<(String, String)> {
    decode_list_filtered(raw, |entry| !entry.is_empty())
        .into_iter()
        .map(|entry| match entry.split_once(KV_SEPARATOR) {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (entry, String::new()),
        })
        .collect()
}

/// Converts a raw override value into the stored encoding for `kind`.
///
/// Override sources write lists comma-separated; list keys get their commas
/// turned into `;`. Other kinds are returned untouched.
#[must_use]
pub fn encode_override(kind: ValueKind, raw: &str) -> String {
    match kind {
        ValueKind::List => raw.replace(',', &SEPARATOR.to_string()),
        ValueKind::Scalar | ValueKind::Map => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn list_round_trip() {
        let values = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let encoded = encode_list(&values).unwrap();
        assert_eq!(encoded, "a;b;c");
        assert_eq!(decode_list(&encoded), values);
    }

    #[test]
    fn single_item_list_has_no_separator() {
        assert_eq!(encode_list(["only"]).as_deref(), Some("only"));
        assert_eq!(decode_list("only"), vec!["only"]);
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(encode_list(Vec::<&str>::new()), None);
        assert!(decode_list("").is_empty());
        assert_eq!(encode_map(BTreeMap::<String, String>::new()), None);
        assert!(decode_map("").is_empty());
    }

    #[test]
    fn filtered_decode() {
        let kept = decode_list_filtered("api-1;;api-2;deprecated-3", |item| {
            !item.is_empty() && !item.starts_with("deprecated")
        });
        assert_eq!(kept, vec!["api-1", "api-2"]);
    }

    #[test]
    fn map_encoding_preserves_iteration_order() {
        let ordered: BTreeMap<&str, &str> = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(encode_map(&ordered).as_deref(), Some("a@1;b@2"));
        assert_eq!(encode_map([("b", "2"), ("a", "1")]).as_deref(), Some("b@2;a@1"));
    }

    #[test]
    fn map_decode_splits_on_first_separator() {
        let entries = decode_map("auth@true;from@ops@example.com;flag");
        assert_eq!(
            entries,
            vec![
                ("auth".to_string(), "true".to_string()),
                ("from".to_string(), "ops@example.com".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn override_encoding_only_rewrites_lists() {
        assert_eq!(encode_override(ValueKind::List, "a,b,c"), "a;b;c");
        assert_eq!(encode_override(ValueKind::Scalar, "a,b"), "a,b");
        assert_eq!(encode_override(ValueKind::Map, "k@v,x"), "k@v,x");
    }

    #[test]
    fn delimiter_collision_is_not_escaped() {
        let encoded = encode_list(["a;b", "c"]).unwrap();
        assert_eq!(decode_list(&encoded), vec!["a", "b", "c"]);
    }
}
