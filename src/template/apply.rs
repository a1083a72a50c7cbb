//! Immutable substitution of values into a template tree.

use serde_json::Value;

use super::path::{PathSegment, ReferencePath};
use super::references::VARIABLE_NAME_FIELD;
use crate::error::{Result, ToolboxError};

/// Return a copy of `node` with the location at `path` filled by `replacement`.
///
/// At the end of the path a sequence gets `replacement` appended, and a
/// reference leaf gets its variable name replaced (other fields are kept).
/// The input is never modified; thread the returned root into the next call
/// to fill several locations.
pub fn apply_at(node: &Value, path: &ReferencePath, replacement: &Value) -> Result<Value> {
    apply_segments(node, path.segments(), replacement, path, 0)
}

fn apply_segments(
    node: &Value,
    segments: &[PathSegment],
    replacement: &Value,
    full: &ReferencePath,
    depth: usize,
) -> Result<Value> {
    let Some((head, tail)) = segments.split_first() else {
        return fill(node, replacement, full);
    };

    let location = || ReferencePath::new(full[..=depth].iter().cloned());

    match node {
        Value::Array(items) => {
            let index = head
                .as_index()
                .ok_or_else(|| ToolboxError::integrity(location(), "not a sequence index"))?;
            let child = items.get(index).ok_or_else(|| {
                ToolboxError::integrity(
                    location(),
                    format!("index out of range (length {})", items.len()),
                )
            })?;

            let replaced = apply_segments(child, tail, replacement, full, depth + 1)?;
            let mut rebuilt = items.clone();
            rebuilt[index] = replaced;
            Ok(Value::Array(rebuilt))
        }
        Value::Object(map) => {
            let key = head.to_string();
            let child = map
                .get(&key)
                .ok_or_else(|| ToolboxError::integrity(location(), "missing key"))?;

            let replaced = apply_segments(child, tail, replacement, full, depth + 1)?;
            let mut rebuilt = map.clone();
            rebuilt.insert(key, replaced);
            Ok(Value::Object(rebuilt))
        }
        _ => Err(ToolboxError::integrity(
            location(),
            "cannot descend into a scalar",
        )),
    }
}

fn fill(node: &Value, replacement: &Value, full: &ReferencePath) -> Result<Value> {
    match node {
        Value::Array(items) => {
            let mut extended = items.clone();
            extended.push(replacement.clone());
            Ok(Value::Array(extended))
        }
        Value::Object(map) => {
            let mut filled = map.clone();
            filled.insert(VARIABLE_NAME_FIELD.to_string(), replacement.clone());
            Ok(Value::Object(filled))
        }
        _ => Err(ToolboxError::integrity(
            full,
            "target is neither a sequence nor a reference",
        )),
    }
}

/// Fill every `(path, value)` pair in turn, starting from `root`.
pub fn apply_all<'a, I>(root: &Value, substitutions: I) -> Result<Value>
where
    I: IntoIterator<Item = (&'a ReferencePath, &'a Value)>,
{
    let mut current = root.clone();
    for (path, value) in substitutions {
        current = apply_at(&current, path, value)?;
    }
    Ok(current)
}
