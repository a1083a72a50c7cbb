//! Canonical form of values, used as hash keys for structural equality.

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Serialize `value` with mapping keys sorted at every level, so two values
/// are canonically equal exactly when they are structurally equal.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, child)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(child, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, child) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(child, out);
            }
            out.push(']');
        }
        // equal values, equal text: -0.0 writes as 0.0
        Value::Number(n) if n.as_f64() == Some(0.0) && n.is_f64() => out.push_str("0.0"),
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Content key of any serializable value.
pub fn canonical_key<T: Serialize + ?Sized>(value: &T) -> Result<blake3::Hash> {
    let tree = serde_json::to_value(value)?;
    Ok(blake3::hash(canonical_json(&tree).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_matter() {
        let a = json!({ "b": 1, "a": { "y": [1, 2], "x": null } });
        let b = json!({ "a": { "x": null, "y": [1, 2] }, "b": 1 });
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_eq!(canonical_json(&a), r#"{"a":{"x":null,"y":[1,2]},"b":1}"#);
        assert_eq!(canonical_key(&a).unwrap(), canonical_key(&b).unwrap());
    }

    #[test]
    fn test_sequence_order_matters() {
        assert_ne!(
            canonical_key(&json!([1, 2])).unwrap(),
            canonical_key(&json!([2, 1])).unwrap()
        );
    }

    #[test]
    fn test_negative_zero_matches_zero() {
        let negative = json!({ "x": -0.0 });
        let positive = json!({ "x": 0.0 });
        assert_eq!(negative, positive);
        assert_eq!(canonical_json(&negative), r#"{"x":0.0}"#);
        assert_eq!(canonical_key(&negative).unwrap(), canonical_key(&positive).unwrap());
        // integer zero is a different value
        assert_ne!(canonical_json(&json!(0)), canonical_json(&json!(0.0)));
    }

    #[test]
    fn test_keys_are_escaped() {
        let value = json!({ "a\"b": "c" });
        assert_eq!(canonical_json(&value), r#"{"a\"b":"c"}"#);
    }
}
