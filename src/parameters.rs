//! Request body and parameter extraction from validation-schema translations.
//!
//! A validation schema describes a whole request as an object keyed by request part:
//!
//! ```json
//! {
//!   "type": "object",
//!   "properties": {
//!     "body": { "type": "object", "properties": { "name": { "type": "string" } } },
//!     "params": {
//!       "type": "object",
//!       "properties": { "id": { "type": "string" } },
//!       "required": ["id"]
//!     },
//!     "query": { ... },
//!     "headers": { ... }
//!   },
//!   "example": { "body": { "name": "bodyName" } }
//! }
//! ```
//!
//! `body` becomes the operation's `requestBody`; `params`, `query` and `headers` become
//! `path`, `query` and `header` parameters.

use crate::openapi_builder::{Example, MediaType, Parameter, RequestBody};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The location where a parameter value is extracted from in an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Path parameter embedded in the URL (e.g., `/users/{id}`)
    Path,
    /// Query string parameter (e.g., `?page=1&limit=10`)
    Query,
    /// HTTP header parameter
    Header,
}

/// Request parts turned into parameters, in emission order
const PARAMETER_PARTS: [(&str, ParameterLocation); 3] = [
    ("params", ParameterLocation::Path),
    ("query", ParameterLocation::Query),
    ("headers", ParameterLocation::Header),
];

/// The request side of an operation
#[derive(Debug, Clone, Default)]
pub struct RequestDocs {
    pub request_body: Option<RequestBody>,
    pub parameters: Vec<Parameter>,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
        }
    }
}

/// Build the request body and parameters described by a schema translation.
///
/// `content_type` keys the request body content. Parameters come out in the order
/// params, query, headers; within a part they follow the part's property declaration order.
pub fn extract_request_docs(translation: &Value, content_type: &str) -> RequestDocs {
    let mut docs = RequestDocs::default();

    let Some(properties) = translation.get("properties").and_then(Value::as_object) else {
        debug!("Schema translation has no properties, nothing to document");
        return docs;
    };

    if let Some(body) = properties.get("body") {
        let examples = translation
            .get("example")
            .and_then(|example| example.get("body"))
            .map(|value| {
                let mut examples = IndexMap::new();
                examples.insert("custom".to_string(), Example { value: value.clone() });
                examples
            });

        let mut content = IndexMap::new();
        content.insert(
            content_type.to_string(),
            MediaType {
                schema: body.clone(),
                examples,
            },
        );
        docs.request_body = Some(RequestBody { content });
    }

    for (part, location) in PARAMETER_PARTS {
        let Some(part_schema) = properties.get(part) else {
            continue;
        };
        docs.parameters.extend(part_parameters(part_schema, location));
    }

    debug!(
        "Extracted {} parameters, request body: {}",
        docs.parameters.len(),
        docs.request_body.is_some()
    );
    docs
}

fn part_parameters(part_schema: &Value, location: ParameterLocation) -> Vec<Parameter> {
    let required: Vec<&str> = part_schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(properties) = part_schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    properties
        .iter()
        .map(|(name, schema)| Parameter {
            location,
            name: name.clone(),
            required: required.contains(&name.as_str()),
            schema: schema.clone(),
        })
        .collect()
}
