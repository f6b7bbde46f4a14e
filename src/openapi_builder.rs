//! OpenAPI document model and assembly.
//!
//! [`OpenApiBuilder`] collects component schemas (one generator run per source folder) and
//! operations (one per [`RouteRecord`]), then [`OpenApiBuilder::build`] produces the final
//! [`OpenApiDocument`]. [`assemble`] runs the whole pipeline for a router tree.

use crate::config::{Info, Server, SwaggerConfig, SwaggerDoc};
use crate::error::Result;
use crate::extractor::{RouteRecord, RouteWalker};
use crate::handler::{HandlerRegistry, ResponseType};
use crate::normalizer::normalize_definition;
use crate::parameters::{extract_request_docs, ParameterLocation};
use crate::router::{HttpMethod, Router};
use crate::schema_generator::{definitions, TypeSchemaGenerator, DEFINITIONS_PREFIX};
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Prefix of references into `components.schemas`
pub const COMPONENTS_PREFIX: &str = "#/components/schemas/";

/// Content type of documented responses
const RESPONSE_CONTENT_TYPE: &str = "application/json";

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    #[serde(default)]
    pub servers: Vec<Server>,
    /// API paths
    pub paths: IndexMap<String, PathItem>,
    /// Components (schemas)
    pub components: Components,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Schema definitions
    #[serde(default)]
    pub schemas: IndexMap<String, Value>,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

impl PathItem {
    /// The operation registered for `method`, if any
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Any => None,
        }
    }

    fn slot(&mut self, method: HttpMethod) -> Option<&mut Option<Operation>> {
        match method {
            HttpMethod::Get => Some(&mut self.get),
            HttpMethod::Post => Some(&mut self.post),
            HttpMethod::Put => Some(&mut self.put),
            HttpMethod::Delete => Some(&mut self.delete),
            HttpMethod::Patch => Some(&mut self.patch),
            HttpMethod::Options => Some(&mut self.options),
            HttpMethod::Head => Some(&mut self.head),
            HttpMethod::Any => None,
        }
    }
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId")]
    pub operation_id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Parameters (path, query, header)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses by status code
    pub responses: IndexMap<String, Response>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter location (path, query, header)
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub name: String,
    pub required: bool,
    pub schema: Value,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Content types and their schemas
    pub content: IndexMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<IndexMap<String, Example>>,
}

/// OpenAPI Example object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub value: Value,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
}

/// OpenAPI document builder
pub struct OpenApiBuilder {
    doc: SwaggerDoc,
    paths: IndexMap<String, PathItem>,
    schemas: IndexMap<String, Value>,
    /// Component names referenced by responses
    response_refs: Vec<String>,
}

impl OpenApiBuilder {
    /// Start a document from the configured skeleton
    pub fn new(doc: &SwaggerDoc) -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            doc: doc.clone(),
            paths: IndexMap::new(),
            schemas: IndexMap::new(),
            response_refs: Vec::new(),
        }
    }

    /// Merge the definitions of one generator run into `components.schemas`.
    ///
    /// Each definition has its nullable properties flattened and its `#/definitions/`
    /// references rewritten. Definitions already present are overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaError`](crate::error::Error::SchemaError) if `generated` has
    /// no `definitions` object.
    pub fn add_schemas(&mut self, generated: &Value) -> Result<()> {
        for (name, definition) in definitions(generated)? {
            if self
                .schemas
                .insert(name.clone(), component_definition(definition))
                .is_some()
            {
                debug!("Schema {} overwritten by a later folder", name);
            }
        }
        Ok(())
    }

    /// Add the operation described by `record`
    pub fn add_route(&mut self, record: &RouteRecord) {
        debug!("Adding route: {} {}", record.method, record.path);

        let metadata = &record.metadata;
        let (request_body, parameters) = match &metadata.schema {
            Some(schema) => {
                let docs = extract_request_docs(&schema.describe(), &metadata.content_type);
                (docs.request_body, docs.parameters)
            }
            None => (None, Vec::new()),
        };

        if let Some(response_type) = &metadata.response_type {
            self.response_refs.push(response_type.type_ref.to_string());
        }

        let operation = Operation {
            operation_id: metadata
                .operation_id
                .clone()
                .unwrap_or_else(|| format!("{}_{}", record.path, record.method)),
            description: metadata.description.clone().unwrap_or_default(),
            tags: record.tag.iter().cloned().collect(),
            parameters,
            request_body,
            responses: responses(metadata.response_type.as_ref()),
        };

        let path_item = self.paths.entry(record.path.clone()).or_default();
        match path_item.slot(record.method) {
            Some(slot) => *slot = Some(operation),
            None => debug!("Catch-all route {} is not documented", record.path),
        }
    }

    /// Build the final OpenAPI document.
    ///
    /// Server URLs get the base path appended and the base path itself is dropped.
    pub fn build(mut self) -> OpenApiDocument {
        debug!("Building final OpenAPI document");

        for name in &self.response_refs {
            if !self.schemas.contains_key(name) {
                warn!(
                    "Response type {} is in no schema folder, using an object placeholder",
                    name
                );
                self.schemas.insert(name.clone(), json!({ "type": "object" }));
            }
        }

        let base_path = self.doc.base_path().to_string();
        let servers = self
            .doc
            .servers
            .into_iter()
            .map(|server| Server {
                url: format!("{}{}", server.url, base_path),
                description: server.description,
            })
            .collect();

        OpenApiDocument {
            openapi: self.doc.openapi,
            info: self.doc.info,
            servers,
            paths: self.paths,
            components: Components {
                schemas: self.schemas,
            },
        }
    }
}

/// Generate the document for `router`: component schemas from every configured folder,
/// then one operation per documented route.
///
/// # Errors
///
/// Returns the first schema generation error.
pub fn assemble(
    config: &SwaggerConfig,
    registry: &HandlerRegistry,
    schema_generator: &dyn TypeSchemaGenerator,
    router: &Router,
) -> Result<OpenApiDocument> {
    let mut builder = OpenApiBuilder::new(&config.swagger_doc);

    for folder in &config.folders {
        let generated = schema_generator.create_schema(folder)?;
        builder.add_schemas(&generated)?;
    }

    let records = RouteWalker::new(registry, config.swagger_doc.base_path()).walk(router);
    for record in &records {
        builder.add_route(record);
    }

    let document = builder.build();
    info!(
        "Assembled document with {} paths and {} schemas",
        document.paths.len(),
        document.components.schemas.len()
    );
    Ok(document)
}

fn responses(response_type: Option<&ResponseType>) -> IndexMap<String, Response> {
    let mut responses = IndexMap::new();

    match response_type {
        Some(response_type) => {
            let target = format!("{}{}", COMPONENTS_PREFIX, response_type.type_ref);
            let reference = json!({ "$ref": target });
            let schema = if response_type.array {
                json!({ "type": "array", "items": reference })
            } else {
                reference
            };

            let mut content = IndexMap::new();
            content.insert(
                RESPONSE_CONTENT_TYPE.to_string(),
                MediaType {
                    schema,
                    examples: None,
                },
            );
            responses.insert(
                response_type.status_code.to_string(),
                Response {
                    description: response_type.description.clone().unwrap_or_default(),
                    content: Some(content),
                },
            );
        }
        None => {
            responses.insert(
                "200".to_string(),
                Response {
                    description: String::new(),
                    content: None,
                },
            );
        }
    }

    responses
}

/// A generated definition in its `components.schemas` form: normalized, with every
/// reference pointing into the components
pub(crate) fn component_definition(definition: &Value) -> Value {
    let mut definition = definition.clone();
    normalize_definition(&mut definition);
    rewrite_refs(&mut definition);
    definition
}

/// Point every `#/definitions/` reference at `#/components/schemas/`
fn rewrite_refs(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == "$ref" {
                    if let Value::String(reference) = child {
                        if let Some(name) = reference.strip_prefix(DEFINITIONS_PREFIX) {
                            *reference = format!("{}{}", COMPONENTS_PREFIX, name);
                        }
                    }
                } else {
                    rewrite_refs(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_refs),
        _ => {}
    }
}
