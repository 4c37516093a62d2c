//! Record dictionary view (component G): the `{tag: [values, ...]}`
//! shape the JSONL front end reads and writes.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::encoding;
use crate::error::{IsisError, Result};
use crate::geometry::Geometry;
use crate::record::{IsoRecord, RawField};
use crate::subfield::{self, SubfieldMode, SubfieldValue};

/// Reserved JSONL keys that may appear alongside tag keys when the
/// dictionary was built from an MST record rather than an ISO stream.
pub const MFN_KEY: &str = "mfn";
pub const ACTIVE_KEY: &str = "active";

/// An ordered `{tag: [value, ...]}` mapping. Iteration order reflects
/// first-appearance order of each tag, which is semantically
/// significant and not something a sorted container could preserve.
pub type Dict = IndexMap<String, Vec<Value>>;

fn subfield_to_json(value: SubfieldValue) -> Value {
    match value {
        SubfieldValue::Field(s) => Value::String(s),
        SubfieldValue::Pairs(pairs) => Value::Array(
            pairs
                .into_iter()
                .map(|(k, v)| Value::Array(vec![Value::String(k), Value::String(v)]))
                .collect(),
        ),
        SubfieldValue::Nest(map) => {
            let mut obj = Map::new();
            for (k, v) in map {
                obj.insert(k, Value::String(v));
            }
            Value::Object(obj)
        }
    }
}

/// Build the dictionary view of a parsed ISO/MST record.
///
/// `subfield_mode`, when set, splits each field's value with the
/// subfield codec (component B) before it is placed in the dict;
/// `with_number` controls whether a `#` occurrence key is prepended.
/// When `subfield_mode` is `None`, each value is the plain decoded
/// field text.
pub fn to_dict(
    fields: &[RawField],
    encoding_name: &str,
    subfield_mode: Option<(SubfieldMode, bool)>,
) -> Result<Dict> {
    let mut dict: Dict = IndexMap::new();
    let mut occurrence: HashMap<String, usize> = HashMap::new();

    for field in fields {
        let tag = encoding::decode(&field.tag, encoding_name)?;
        let text = encoding::decode(&field.value, encoding_name)?;

        let value = match subfield_mode {
            None => Value::String(text),
            Some((mode, with_number)) => {
                let n = occurrence.entry(tag.clone()).or_insert(0);
                *n += 1;
                subfield_to_json(subfield::split_subfields(&text, mode, with_number, *n))
            }
        };

        dict.entry(tag).or_default().push(value);
    }

    Ok(dict)
}

fn json_to_raw_text(value: &Value, mode: Option<SubfieldMode>) -> Result<String> {
    match (mode, value) {
        (None, Value::String(s)) => Ok(s.clone()),
        (None, other) => Err(IsisError::format(format!("expected a string field value, got {other}"), 0)),
        (Some(SubfieldMode::Field), Value::String(s)) => Ok(s.clone()),
        (Some(SubfieldMode::Pairs), Value::Array(items)) => {
            let mut pairs = Vec::with_capacity(items.len());
            for item in items {
                let Value::Array(kv) = item else {
                    return Err(IsisError::format("pairs-mode entry must be a 2-element array", 0));
                };
                let (Some(Value::String(k)), Some(Value::String(v))) = (kv.first(), kv.get(1)) else {
                    return Err(IsisError::format("pairs-mode entry must be [key, value] strings", 0));
                };
                pairs.push((k.clone(), v.clone()));
            }
            Ok(subfield::join_pairs(&pairs))
        }
        (Some(SubfieldMode::Nest), Value::Object(obj)) => {
            let pairs: Vec<(String, String)> = obj
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect();
            Ok(subfield::join_pairs(&pairs))
        }
        _ => Err(IsisError::format("field value shape does not match the configured subfield mode", 0)),
    }
}

/// Inverse of [`to_dict`]: rebuild raw (tag, value) fields from a
/// dictionary, ready to hand to [`crate::record::encode_record`].
/// Reserved keys [`MFN_KEY`]/[`ACTIVE_KEY`] are skipped.
pub fn from_dict(dict: &Dict, geom: &Geometry, encoding_name: &str, subfield_mode: Option<SubfieldMode>) -> Result<IsoRecord> {
    let mut fields = Vec::new();
    for (tag, values) in dict {
        if tag == MFN_KEY || tag == ACTIVE_KEY {
            continue;
        }
        let tag_bytes = encoding::encode(tag, encoding_name)?;
        if tag_bytes.len() != geom.tag_len {
            return Err(IsisError::overflow("tag", format!(
                "tag `{tag}` encodes to {} bytes, geometry expects {}", tag_bytes.len(), geom.tag_len,
            )));
        }
        for value in values {
            let text = json_to_raw_text(value, subfield_mode)?;
            let value_bytes = encoding::encode(&text, encoding_name)?;
            fields.push(RawField { tag: tag_bytes.clone(), custom: Vec::new(), value: value_bytes });
        }
    }
    Ok(IsoRecord::new(fields))
}

/// Flatten a tag's values to their plain string form, for callers that
/// just want text and don't care about subfield structure.
/// Non-string values (e.g. pairs/nest mode output) are skipped.
pub fn extract_field_values<'a>(dict: &'a Dict, tag: &str) -> Vec<&'a str> {
    dict.get(tag)
        .map(|values| values.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawField;

    #[test]
    fn plain_mode_preserves_tag_order_and_repeats() {
        let fields = vec![
            RawField::new(*b"100", b"alpha".to_vec()),
            RawField::new(*b"245", b"beta".to_vec()),
            RawField::new(*b"100", b"gamma".to_vec()),
        ];
        let dict = to_dict(&fields, "utf-8", None).unwrap();
        let keys: Vec<&str> = dict.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["100", "245"]);
        assert_eq!(dict["100"], vec![Value::String("alpha".into()), Value::String("gamma".into())]);
    }

    #[test]
    fn round_trip_through_dict_plain_mode() {
        let fields = vec![
            RawField::new(*b"100", b"alpha".to_vec()),
            RawField::new(*b"245", b"beta".to_vec()),
        ];
        let dict = to_dict(&fields, "utf-8", None).unwrap();
        let rec = from_dict(&dict, &Geometry::default(), "utf-8", None).unwrap();
        assert_eq!(rec.fields, fields);
    }

    #[test]
    fn round_trip_through_dict_pairs_mode() {
        let fields = vec![RawField::new(*b"245", b"hi^a foo^bbar".to_vec())];
        let dict = to_dict(&fields, "utf-8", Some((SubfieldMode::Pairs, false))).unwrap();
        let rec = from_dict(&dict, &Geometry::default(), "utf-8", Some(SubfieldMode::Pairs)).unwrap();
        assert_eq!(rec.fields, fields);
    }

    #[test]
    fn extract_field_values_flattens_plain_strings() {
        let fields = vec![
            RawField::new(*b"650", b"one".to_vec()),
            RawField::new(*b"650", b"two".to_vec()),
        ];
        let dict = to_dict(&fields, "utf-8", None).unwrap();
        assert_eq!(extract_field_values(&dict, "650"), vec!["one", "two"]);
        assert!(extract_field_values(&dict, "999").is_empty());
    }

    #[test]
    fn reserved_mst_keys_are_skipped_on_write() {
        let mut dict: Dict = IndexMap::new();
        dict.insert(MFN_KEY.to_string(), vec![Value::Number(7.into())]);
        dict.insert(ACTIVE_KEY.to_string(), vec![Value::Bool(true)]);
        dict.insert("100".to_string(), vec![Value::String("alpha".into())]);
        let rec = from_dict(&dict, &Geometry::default(), "utf-8", None).unwrap();
        assert_eq!(rec.fields.len(), 1);
        assert_eq!(rec.fields[0].tag, b"100");
    }
}
