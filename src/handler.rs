//! Route documentation metadata and the validation middleware.
//!
//! [`OpenApiGenerator::create_handler`](crate::generator::OpenApiGenerator::create_handler)
//! turns [`HandlerParams`] into a [`ValidationMiddleware`]. The middleware only carries a
//! [`HandlerId`]; the [`EndpointMetadata`] it documents lives in the generator's
//! [`HandlerRegistry`] and is looked up by the route walker.

use crate::error::HandlerError;
use crate::validation::{RequestSchema, Schema};
use axum::body::{Body, Bytes};
use axum::extract::{RawPathParams, Request};
use axum::http::header::CONTENT_TYPE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::RequestPartsExt;
use http_body_util::LengthLimitError;
use log::{debug, warn};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Largest request body the validation middleware buffers, in bytes
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Content type documented for request bodies when none is given
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Name of a component schema, as found in `components.schemas`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef(String);

impl TypeRef {
    /// The component name of `T`: the last path segment of its type name, generics removed.
    ///
    /// `my_app::models::TestingEntity` becomes `TestingEntity`, `Vec<my_app::User>` becomes `Vec`.
    pub fn of<T: ?Sized>() -> Self {
        let full = std::any::type_name::<T>();
        let without_generics = full.split('<').next().unwrap_or(full);
        let name = without_generics
            .rsplit("::")
            .next()
            .unwrap_or(without_generics);
        Self(name.to_string())
    }

    pub fn named(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Documented response of a route
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseType {
    pub type_ref: TypeRef,
    pub status_code: u16,
    pub description: Option<String>,
    /// Documents the response as an array of `type_ref`
    pub array: bool,
}

impl ResponseType {
    pub fn new<T: ?Sized>(status_code: u16) -> Self {
        Self::with_ref(TypeRef::of::<T>(), status_code)
    }

    pub fn named(name: &str, status_code: u16) -> Self {
        Self::with_ref(TypeRef::named(name), status_code)
    }

    fn with_ref(type_ref: TypeRef, status_code: u16) -> Self {
        Self {
            type_ref,
            status_code,
            description: None,
            array: false,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }
}

/// Documentation attached to a route through its validation middleware
#[derive(Debug, Clone)]
pub struct EndpointMetadata {
    pub schema: Option<Arc<dyn RequestSchema>>,
    pub content_type: String,
    pub response_type: Option<ResponseType>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
}

impl Default for EndpointMetadata {
    fn default() -> Self {
        Self {
            schema: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            response_type: None,
            description: None,
            operation_id: None,
        }
    }
}

impl EndpointMetadata {
    /// Whether this metadata contributes anything to the document
    pub fn is_documented(&self) -> bool {
        self.schema.is_some()
            || self.response_type.is_some()
            || self.description.is_some()
            || self.operation_id.is_some()
    }
}

/// Arguments of `create_handler`.
///
/// Builds from a bare [`Schema`], an `Option<Schema>` or a `(Schema, ResponseType)` pair,
/// or field by field:
///
/// ```
/// use router_openapi::handler::{HandlerParams, ResponseType};
/// use router_openapi::validation::Schema;
///
/// let params = HandlerParams::new()
///     .schema(Schema::object().key("body", Schema::object()))
///     .content_type("application/x-www-form-urlencoded")
///     .response_type(ResponseType::named("User", 201))
///     .description("Create a user")
///     .operation_id("createUser");
/// ```
#[derive(Debug, Clone, Default)]
pub struct HandlerParams {
    pub schema: Option<Arc<dyn RequestSchema>>,
    pub content_type: Option<String>,
    pub response_type: Option<ResponseType>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
}

impl HandlerParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(mut self, schema: impl RequestSchema + 'static) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn operation_id(mut self, operation_id: &str) -> Self {
        self.operation_id = Some(operation_id.to_string());
        self
    }

    pub(crate) fn into_metadata(self) -> EndpointMetadata {
        EndpointMetadata {
            schema: self.schema,
            content_type: self
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            response_type: self.response_type,
            description: self.description,
            operation_id: self.operation_id,
        }
    }
}

impl From<Schema> for HandlerParams {
    fn from(schema: Schema) -> Self {
        HandlerParams::new().schema(schema)
    }
}

impl From<Option<Schema>> for HandlerParams {
    fn from(schema: Option<Schema>) -> Self {
        match schema {
            Some(schema) => schema.into(),
            None => HandlerParams::new(),
        }
    }
}

impl From<(Schema, ResponseType)> for HandlerParams {
    fn from((schema, response_type): (Schema, ResponseType)) -> Self {
        HandlerParams::new().schema(schema).response_type(response_type)
    }
}

/// Key of a middleware's entry in the [`HandlerRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Side-table from middleware ids to the metadata they document
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    next_id: AtomicU64,
    entries: RwLock<HashMap<HandlerId, EndpointMetadata>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> HandlerId {
        HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn register(&self, id: HandlerId, metadata: EndpointMetadata) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(id, metadata);
    }

    pub fn get(&self, id: HandlerId) -> Option<EndpointMetadata> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The validated request view, stored in request extensions by [`ValidationMiddleware`]
#[derive(Debug, Clone, PartialEq)]
pub struct Validated(pub Value);

/// Per-route request validation
#[derive(Debug, Clone)]
pub struct ValidationMiddleware {
    id: HandlerId,
    schema: Option<Arc<dyn RequestSchema>>,
}

impl ValidationMiddleware {
    pub(crate) fn new(id: HandlerId, schema: Option<Arc<dyn RequestSchema>>) -> Self {
        Self { id, schema }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Validate a request view against the schema. Without a schema the view passes as is.
    pub fn validate(&self, view: &Value) -> Result<Value, HandlerError> {
        match &self.schema {
            Some(schema) => schema.validate(view).map_err(|message| {
                debug!("Request rejected by handler {:?}: {}", self.id, message);
                HandlerError::bad_request(message)
            }),
            None => Ok(view.clone()),
        }
    }

    /// Run the middleware on a request.
    ///
    /// JSON bodies are replaced with their validated form; other bodies are forwarded
    /// unchanged. The full validated view is available to handlers as
    /// `Extension<Validated>`.
    pub async fn handle(self, request: Request, next: Next) -> Response {
        if self.schema.is_none() {
            return next.run(request).await;
        }

        let (mut parts, body) = request.into_parts();

        let params: Map<String, Value> = match parts.extract::<RawPathParams>().await {
            Ok(raw) => raw
                .iter()
                .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
                .collect(),
            Err(_) => Map::new(),
        };

        let query: Map<String, Value> = parts
            .uri
            .query()
            .map(|query| {
                form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .map(|(name, value)| (name, Value::String(value)))
                    .collect()
            })
            .unwrap_or_default();

        let headers: Map<String, Value> = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), Value::String(v.to_string())))
            })
            .collect();

        let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(err) => {
                let err = err.into_inner();
                if err.is::<LengthLimitError>() {
                    debug!("Request body over {} bytes rejected", MAX_BODY_BYTES);
                    return HandlerError::payload_too_large(MAX_BODY_BYTES).into_response();
                }
                warn!("Failed to read request body: {}", err);
                return HandlerError::bad_request("request body could not be read")
                    .into_response();
            }
        };

        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let body_value = match parse_body(&bytes, &content_type) {
            Ok(value) => value,
            Err(err) => return err.into_response(),
        };

        let mut view = json!({ "params": params, "query": query, "headers": headers });
        if !body_value.is_null() {
            view["body"] = body_value;
        }

        let validated = match self.validate(&view) {
            Ok(validated) => validated,
            Err(err) => return err.into_response(),
        };

        let body = match validated.get("body") {
            Some(body) if is_json(&content_type) => {
                parts.headers.remove(axum::http::header::CONTENT_LENGTH);
                Body::from(body.to_string())
            }
            _ => Body::from(bytes),
        };

        parts.extensions.insert(Validated(validated));
        next.run(Request::from_parts(parts, body)).await
    }
}

fn is_json(content_type: &str) -> bool {
    content_type.starts_with("application/json") || content_type.contains("+json")
}

fn parse_body(bytes: &Bytes, content_type: &str) -> Result<Value, HandlerError> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    if content_type.starts_with("application/x-www-form-urlencoded") {
        let fields: Map<String, Value> = form_urlencoded::parse(bytes)
            .into_owned()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();
        return Ok(Value::Object(fields));
    }
    if is_json(content_type) {
        return serde_json::from_slice(bytes)
            .map_err(|err| HandlerError::bad_request(format!("malformed JSON body: {}", err)));
    }
    Ok(Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
