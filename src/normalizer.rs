//! Nullable-type flattening for generated component schemas.
//!
//! Type-schema generators describe optional fields as `type: ["string", "null"]` or as an
//! `anyOf` containing `{"type": "null"}`, and may emit `const` markers. OpenAPI 3.0 has no
//! `null` type, so those shapes are rewritten before schemas enter `components.schemas`.

use log::debug;
use serde_json::{json, Map, Value};

/// Normalize every property of a definition's `properties` map in place.
///
/// For each property node:
/// - `const` is removed.
/// - `anyOf` members with `type == "null"` are dropped.
/// - A list-valued `type` loses its `"null"` entry; a single remaining type collapses to a
///   scalar, several become `oneOf: [{type: T}, ...]` and `type` is removed.
///
/// Applying it twice gives the same result as applying it once.
pub fn remove_null_properties(properties: &mut Map<String, Value>) {
    for (name, property) in properties.iter_mut() {
        let Some(node) = property.as_object_mut() else {
            continue;
        };

        node.remove("const");

        if let Some(Value::Array(members)) = node.get_mut("anyOf") {
            members.retain(|member| member.get("type") != Some(&Value::from("null")));
        }

        let Some(Value::Array(types)) = node.get("type") else {
            continue;
        };

        let remaining: Vec<Value> = types
            .iter()
            .filter(|t| t.as_str() != Some("null"))
            .cloned()
            .collect();

        debug!("Flattening type list of property {}: {:?}", name, remaining);

        match remaining.len() {
            0 => {
                node.remove("type");
            }
            1 => {
                node.insert("type".to_string(), remaining[0].clone());
            }
            _ => {
                let one_of: Vec<Value> = remaining
                    .into_iter()
                    .map(|t| json!({ "type": t }))
                    .collect();
                node.remove("type");
                node.insert("oneOf".to_string(), Value::Array(one_of));
            }
        }
    }
}

/// Normalize the `properties` of a single definition, if it has any
pub fn normalize_definition(definition: &mut Value) {
    if let Some(Value::Object(properties)) = definition.get_mut("properties") {
        remove_null_properties(properties);
    }
}
