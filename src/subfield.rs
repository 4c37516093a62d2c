//! Subfield codec (component B): `^key value` mini-language.
//!
//! A field value may contain subfield delimiters: `^` followed by a
//! single key character. Text before the first `^` has the implicit
//! key `_`. Three modes interpret the same parsed pairs differently;
//! see [`SubfieldMode`].

use indexmap::IndexMap;

/// How a field's subfields are exposed to the JSONL front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubfieldMode {
    /// Identity: the raw string, unparsed.
    Field,
    /// An ordered sequence of `(key, value)` pairs; repeats survive.
    Pairs,
    /// A `{key: value}` mapping; a repeated key overwrites the
    /// earlier value (documented data loss, not silently avoided).
    Nest,
}

/// The structured form a raw field value decodes to under a given mode.
#[derive(Debug, Clone, PartialEq)]
pub enum SubfieldValue {
    Field(String),
    Pairs(Vec<(String, String)>),
    Nest(IndexMap<String, String>),
}

const PREFIX_KEY: &str = "_";
const NUMBER_KEY: &str = "#";

/// Split `raw` into `(key, value)` pairs. Text before the first `^` is
/// emitted under key `_`, and only when non-empty.
fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    let chars: Vec<char> = raw.chars().collect();
    let mut carets: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(_, &c)| c == '^')
        .map(|(i, _)| i)
        .collect();
    carets.push(chars.len());

    let mut pairs = Vec::new();
    let first = carets[0];
    if first > 0 {
        pairs.push((PREFIX_KEY.to_string(), chars[..first].iter().collect()));
    }

    let mut i = 0;
    while i + 1 < carets.len() {
        let caret = carets[i];
        if caret == chars.len() {
            break;
        }
        let key_pos = caret + 1;
        if key_pos >= chars.len() {
            break;
        }
        let key = chars[key_pos].to_string();
        let value_start = key_pos + 1;
        let next_caret = carets[i + 1];
        let value: String = chars[value_start..next_caret].iter().collect();
        pairs.push((key, value));
        i += 1;
    }
    pairs
}

/// Parse `raw` under `mode`, optionally prepending a `#` occurrence key.
///
/// `occurrence` is the 1-based index of this field among same-tag
/// repeats, used only when `with_number` is set.
pub fn split_subfields(raw: &str, mode: SubfieldMode, with_number: bool, occurrence: usize) -> SubfieldValue {
    match mode {
        SubfieldMode::Field => SubfieldValue::Field(raw.to_string()),
        SubfieldMode::Pairs => {
            let mut pairs = parse_pairs(raw);
            if with_number {
                pairs.insert(0, (NUMBER_KEY.to_string(), occurrence.to_string()));
            }
            SubfieldValue::Pairs(pairs)
        }
        SubfieldMode::Nest => {
            let mut map = IndexMap::new();
            if with_number {
                map.insert(NUMBER_KEY.to_string(), occurrence.to_string());
            }
            for (k, v) in parse_pairs(raw) {
                // Later values overwrite earlier ones for a repeated
                // key; this is the documented lossy behavior of nest
                // mode, not a bug to be patched around.
                map.insert(k, v);
            }
            SubfieldValue::Nest(map)
        }
    }
}

/// Re-serialize an ordered sequence of pairs back to raw subfield text.
/// Inverse of [`parse_pairs`] / the `pairs` mode of [`split_subfields`].
/// A leading `#` numbering key, if present, is dropped: numbering is
/// metadata added for display, not part of the field's own content.
pub fn join_pairs(pairs: &[(String, String)]) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        if key == NUMBER_KEY {
            continue;
        }
        if key == PREFIX_KEY {
            out.push_str(value);
        } else {
            out.push('^');
            out.push_str(key);
            out.push_str(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_mode_is_identity() {
        let v = split_subfields("^a foo^bbar", SubfieldMode::Field, false, 1);
        assert_eq!(v, SubfieldValue::Field("^a foo^bbar".to_string()));
    }

    #[test]
    fn pairs_mode_splits_prefix_and_keys() {
        let v = split_subfields("hello^a foo^b bar", SubfieldMode::Pairs, false, 1);
        assert_eq!(
            v,
            SubfieldValue::Pairs(vec![
                ("_".to_string(), "hello".to_string()),
                ("a".to_string(), " foo".to_string()),
                ("b".to_string(), " bar".to_string()),
            ])
        );
    }

    #[test]
    fn pairs_mode_round_trips() {
        let raw = "hello^a foo^b bar";
        let SubfieldValue::Pairs(pairs) = split_subfields(raw, SubfieldMode::Pairs, false, 1) else {
            unreachable!()
        };
        assert_eq!(join_pairs(&pairs), raw);
    }

    #[test]
    fn pairs_mode_without_prefix_round_trips() {
        let raw = "^a one^a two";
        let SubfieldValue::Pairs(pairs) = split_subfields(raw, SubfieldMode::Pairs, false, 1) else {
            unreachable!()
        };
        assert_eq!(pairs.len(), 2);
        assert_eq!(join_pairs(&pairs), raw);
    }

    #[test]
    fn with_number_prepends_hash_key() {
        let SubfieldValue::Pairs(pairs) = split_subfields("^a x", SubfieldMode::Pairs, true, 3) else {
            unreachable!()
        };
        assert_eq!(pairs[0], ("#".to_string(), "3".to_string()));
    }

    #[test]
    fn nest_mode_last_write_wins_on_repeat() {
        let SubfieldValue::Nest(map) = split_subfields("^a one^a two", SubfieldMode::Nest, false, 1) else {
            unreachable!()
        };
        assert_eq!(map.get("a"), Some(&"two".to_string()));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn nest_mode_preserves_insertion_order() {
        let SubfieldValue::Nest(map) = split_subfields("^b x^a y", SubfieldMode::Nest, false, 1) else {
            unreachable!()
        };
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn empty_value_round_trips() {
        let v = split_subfields("", SubfieldMode::Pairs, false, 1);
        assert_eq!(v, SubfieldValue::Pairs(vec![]));
    }
}
