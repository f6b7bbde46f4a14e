//! Request validation schemas.
//!
//! A [`RequestSchema`] validates the JSON view of a request (`{body, params, query, headers}`)
//! and describes itself as a swagger JSON schema. [`Schema`] is the default implementation:
//! a small builder in the spirit of declarative object validators.
//!
//! ```
//! use router_openapi::validation::Schema;
//!
//! let schema = Schema::object()
//!     .required()
//!     .key("params", Schema::object().key("name", Schema::string().required()))
//!     .key("body", Schema::object().key("age", Schema::integer()));
//! ```

use log::debug;
use serde_json::{json, Map, Number, Value};
use std::fmt::Debug;

/// Validation and documentation contract for a route's request schema
pub trait RequestSchema: Send + Sync + Debug {
    /// Validate a request view, returning the validated (coerced, stripped) value or a
    /// human-readable message describing the first failure.
    fn validate(&self, request: &Value) -> Result<Value, String>;

    /// Translate the schema into a swagger JSON schema.
    fn describe(&self) -> Value;
}

/// Declarative schema builder
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    kind: SchemaKind,
    required: bool,
    description: Option<String>,
    example: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
enum SchemaKind {
    Any,
    String,
    Number,
    Integer,
    Boolean,
    Object(Vec<(String, Schema)>),
    Array(Box<Schema>),
    Alternatives(Vec<Schema>),
}

impl Schema {
    fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            required: false,
            description: None,
            example: None,
        }
    }

    pub fn any() -> Self {
        Self::of(SchemaKind::Any)
    }

    pub fn string() -> Self {
        Self::of(SchemaKind::String)
    }

    /// Accepts JSON numbers and numeric strings
    pub fn number() -> Self {
        Self::of(SchemaKind::Number)
    }

    /// Accepts whole JSON numbers and strings holding one
    pub fn integer() -> Self {
        Self::of(SchemaKind::Integer)
    }

    /// Accepts JSON booleans and the strings `"true"` / `"false"`
    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    /// An object with no declared keys. Undeclared keys are stripped during validation.
    pub fn object() -> Self {
        Self::of(SchemaKind::Object(Vec::new()))
    }

    pub fn array(items: Schema) -> Self {
        Self::of(SchemaKind::Array(Box::new(items)))
    }

    /// Matches the first of `options` that validates
    pub fn alternatives(options: Vec<Schema>) -> Self {
        Self::of(SchemaKind::Alternatives(options))
    }

    /// Declare a key on an object schema. Redeclaring a key replaces it in place.
    /// Has no effect on non-object schemas.
    pub fn key(mut self, name: &str, schema: Schema) -> Self {
        match &mut self.kind {
            SchemaKind::Object(keys) => {
                if let Some(slot) = keys.iter_mut().find(|(key, _)| key == name) {
                    slot.1 = schema;
                } else {
                    keys.push((name.to_string(), schema));
                }
            }
            _ => debug!("Ignoring key '{}' declared on a non-object schema", name),
        }
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Validate `value` found at `label`. `None` means the key is absent.
    fn check(&self, value: Option<&Value>, label: &str) -> Result<Option<Value>, String> {
        let value = match value {
            None | Some(Value::Null) => {
                if self.required {
                    return Err(format!("\"{}\" is required", label));
                }
                return Ok(None);
            }
            Some(value) => value,
        };

        let checked = match &self.kind {
            SchemaKind::Any => value.clone(),
            SchemaKind::String => match value {
                Value::String(_) => value.clone(),
                _ => return Err(format!("\"{}\" must be a string", label)),
            },
            SchemaKind::Number => coerce_number(value)
                .ok_or_else(|| format!("\"{}\" must be a number", label))?,
            SchemaKind::Integer => coerce_integer(value)
                .ok_or_else(|| format!("\"{}\" must be an integer", label))?,
            SchemaKind::Boolean => coerce_boolean(value)
                .ok_or_else(|| format!("\"{}\" must be a boolean", label))?,
            SchemaKind::Object(keys) => {
                let Value::Object(fields) = value else {
                    return Err(format!("\"{}\" must be of type object", label));
                };
                let mut validated = Map::new();
                for (key, schema) in keys {
                    let child_label = child_label(label, key);
                    if let Some(child) = schema.check(fields.get(key), &child_label)? {
                        validated.insert(key.clone(), child);
                    }
                }
                Value::Object(validated)
            }
            SchemaKind::Array(items) => {
                let Value::Array(elements) = value else {
                    return Err(format!("\"{}\" must be an array", label));
                };
                let mut validated = Vec::with_capacity(elements.len());
                for (index, element) in elements.iter().enumerate() {
                    let item_label = format!("{}[{}]", label, index);
                    let item = items
                        .check(Some(element), &item_label)?
                        .unwrap_or(Value::Null);
                    validated.push(item);
                }
                Value::Array(validated)
            }
            SchemaKind::Alternatives(options) => options
                .iter()
                .find_map(|option| option.check(Some(value), label).ok().flatten())
                .ok_or_else(|| {
                    format!("\"{}\" does not match any of the allowed types", label)
                })?,
        };

        Ok(Some(checked))
    }
}

impl RequestSchema for Schema {
    fn validate(&self, request: &Value) -> Result<Value, String> {
        let validated = self.check(Some(request), "value")?;
        Ok(validated.unwrap_or(Value::Null))
    }

    fn describe(&self) -> Value {
        let mut node = match &self.kind {
            SchemaKind::Any => json!({}),
            SchemaKind::String => json!({ "type": "string" }),
            SchemaKind::Number => json!({ "type": "number" }),
            SchemaKind::Integer => json!({ "type": "integer" }),
            SchemaKind::Boolean => json!({ "type": "boolean" }),
            SchemaKind::Object(keys) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for (key, schema) in keys {
                    properties.insert(key.clone(), schema.describe());
                    if schema.required {
                        required.push(Value::String(key.clone()));
                    }
                }
                let mut node = json!({ "type": "object", "properties": properties });
                if !required.is_empty() {
                    node["required"] = Value::Array(required);
                }
                node
            }
            SchemaKind::Array(items) => json!({ "type": "array", "items": items.describe() }),
            SchemaKind::Alternatives(options) => {
                json!({ "anyOf": options.iter().map(Schema::describe).collect::<Vec<_>>() })
            }
        };

        if let Some(description) = &self.description {
            node["description"] = Value::String(description.clone());
        }
        if let Some(example) = &self.example {
            node["example"] = example.clone();
        }
        node
    }
}

fn child_label(parent: &str, key: &str) -> String {
    if parent == "value" {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn coerce_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(int) = trimmed.parse::<i64>() {
                return Some(Value::from(int));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
        }
        _ => None,
    }
}

fn coerce_integer(value: &Value) -> Option<Value> {
    match coerce_number(value)? {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(Value::Number(n)),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| Value::from(f as i64)),
        _ => None,
    }
}

fn coerce_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value.clone()),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}
