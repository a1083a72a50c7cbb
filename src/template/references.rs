//! Discovery of variable-reference placeholders in a parameter tree.

use serde_json::Value;

use super::path::ReferencePath;

/// Tag value marking a variable reference.
pub const VARIABLE_TYPE: &str = "Variable";
/// Field holding the referenced variable's name.
pub const VARIABLE_NAME_FIELD: &str = "VariableName";
const TYPE_FIELD: &str = "Type";

/// True when `node` is a variable reference leaf: a mapping with
/// `Type == "Variable"` and a string `VariableName`. Extra fields are allowed.
pub fn is_variable_reference(node: &Value) -> bool {
    match node {
        Value::Object(map) => {
            map.get(TYPE_FIELD).and_then(Value::as_str) == Some(VARIABLE_TYPE)
                && map.get(VARIABLE_NAME_FIELD).map_or(false, Value::is_string)
        }
        _ => false,
    }
}

/// Every location in `node` holding a variable reference, in traversal order.
///
/// A reference leaf is terminal: its own children are not visited.
pub fn find_references(node: &Value) -> Vec<ReferencePath> {
    let mut found = Vec::new();
    collect(node, &ReferencePath::root(), &mut found);
    found
}

fn collect(node: &Value, path: &ReferencePath, found: &mut Vec<ReferencePath>) {
    if is_variable_reference(node) {
        found.push(path.clone());
        return;
    }

    match node {
        Value::Object(map) => {
            for (key, child) in map {
                collect(child, &path.child(key.as_str()), found);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect(child, &path.child(index), found);
            }
        }
        _ => {}
    }
}
