//! Surrogate sanitization and metadata flattening.

use crate::types::MetaValue;
use serde_json::Value;
use std::collections::BTreeMap;

/// Remove every code unit in `[U+D800, U+DFFF]` that isn't part of a
/// valid surrogate pair. Idempotent: sanitized text is a fixed point.
pub fn sanitize(input: &str) -> String {
    input.chars().filter(|c| !is_lone_surrogate_artifact(*c)).collect()
}

fn is_lone_surrogate_artifact(c: char) -> bool {
    let cp = c as u32;
    (0xD800..=0xDFFF).contains(&cp)
}

/// Flatten a caller-supplied metadata map into the shapes `StoredItem`
/// may carry: strings (sanitized), numbers, booleans. Arrays and
/// objects are JSON-encoded then sanitized. Null/absent values are
/// dropped. `createdAt`/`updatedAt` string values that parse as ISO
/// timestamps get a companion `*Ts` epoch-millisecond field.
pub fn flatten_metadata(input: &BTreeMap<String, Value>) -> BTreeMap<String, MetaValue> {
    let mut out = BTreeMap::new();

    for (key, value) in input {
        match value {
            Value::Null => continue,
            Value::String(s) => {
                out.insert(key.clone(), MetaValue::Str(sanitize(s)));
            }
            Value::Number(n) => {
                if let Some(f) = n.as_f64() {
                    out.insert(key.clone(), MetaValue::Num(f));
                }
            }
            Value::Bool(b) => {
                out.insert(key.clone(), MetaValue::Bool(*b));
            }
            Value::Array(_) | Value::Object(_) => {
                let encoded = serde_json::to_string(value).unwrap_or_default();
                out.insert(key.clone(), MetaValue::Str(sanitize(&encoded)));
            }
        }

        if key == "createdAt" || key == "updatedAt" {
            if let Value::String(s) = value {
                if let Some(ts) = crate::hashing::parse_timestamp_ms(s) {
                    let ts_key = format!("{key}Ts");
                    out.insert(ts_key, MetaValue::Num(ts as f64));
                }
            }
        }
    }

    out
}
