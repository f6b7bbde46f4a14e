//! The entry point applications use: documented middleware creation, document assembly and
//! the cached docs endpoints.

use crate::config::SwaggerConfig;
use crate::docs::docs_routes;
use crate::error::{Error, Result};
use crate::handler::{HandlerParams, HandlerRegistry, ValidationMiddleware};
use crate::openapi_builder::{assemble, OpenApiDocument};
use crate::router::Router;
use crate::schema_generator::{SourceSchemaGenerator, TypeSchemaGenerator};
use crate::serializer::{read_document, serialize_json, write_to_file};
use log::{debug, error, info};

/// Outcome of [`OpenApiGenerator::run_swagger`]
#[derive(Debug)]
pub enum SwaggerRun {
    Ok,
    Error(Error),
}

impl SwaggerRun {
    /// `"OK"` or `"ERROR"`
    pub fn status(&self) -> &'static str {
        match self {
            SwaggerRun::Ok => "OK",
            SwaggerRun::Error(_) => "ERROR",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SwaggerRun::Ok)
    }
}

/// Documents the routes of a [`Router`] built with middleware from [`create_handler`].
///
/// ```no_run
/// use router_openapi::{OpenApiGenerator, Router, Schema, SwaggerConfig, SwaggerDoc};
///
/// let doc = SwaggerDoc::new("Example", "1.0.0");
/// let config = SwaggerConfig::new(doc, "swagger.json", "/api-docs").with_folder("src/models");
/// let generator = OpenApiGenerator::new(config);
///
/// let params = Schema::object().key("id", Schema::integer().required());
/// let schema = Schema::object().key("params", params);
/// let endpoint = generator.create_handler(schema).then(|| async { "item" });
/// let mut router = Router::new().get("/items/:id", endpoint);
///
/// let run = generator.run_swagger(&mut router);
/// println!("swagger: {}", run.status());
/// let app = router.into_axum();
/// # let _ = app;
/// ```
///
/// [`create_handler`]: OpenApiGenerator::create_handler
pub struct OpenApiGenerator {
    config: SwaggerConfig,
    registry: HandlerRegistry,
    schema_generator: Box<dyn TypeSchemaGenerator>,
}

impl OpenApiGenerator {
    /// A generator reading component types from the configured Rust source folders
    pub fn new(config: SwaggerConfig) -> Self {
        Self {
            config,
            registry: HandlerRegistry::new(),
            schema_generator: Box::new(SourceSchemaGenerator),
        }
    }

    /// Replace the source of component schemas
    pub fn with_schema_generator(
        mut self,
        schema_generator: impl TypeSchemaGenerator + 'static,
    ) -> Self {
        self.schema_generator = Box::new(schema_generator);
        self
    }

    pub fn config(&self) -> &SwaggerConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Create a validation middleware for one route.
    ///
    /// The endpoint metadata is recorded for documentation only when the configuration is
    /// active. Validation runs either way.
    pub fn create_handler(&self, params: impl Into<HandlerParams>) -> ValidationMiddleware {
        let metadata = params.into().into_metadata();
        let id = self.registry.next_id();
        let schema = metadata.schema.clone();

        if self.config.active {
            debug!("Registering documented handler {:?}", id);
            self.registry.register(id, metadata);
        }

        ValidationMiddleware::new(id, schema)
    }

    /// Assemble the document for `router`.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the type-schema generator.
    pub fn list_endpoints(&self, router: &Router) -> Result<OpenApiDocument> {
        assemble(
            &self.config,
            &self.registry,
            self.schema_generator.as_ref(),
            router,
        )
    }

    /// Serve the document of `router` on the configured endpoint.
    ///
    /// When inactive this does nothing. Otherwise the document is generated and written to
    /// `json_path` if that file does not exist yet, then the file contents are served as they
    /// are. Failures are logged and reported as [`SwaggerRun::Error`]; no routes are added
    /// in that case. A router already serving its docs is left as it is.
    pub fn run_swagger(&self, router: &mut Router) -> SwaggerRun {
        if !self.config.active {
            debug!("Swagger is inactive, skipping document generation");
            return SwaggerRun::Ok;
        }

        match self.load_or_generate(router) {
            Ok(_) if router.docs_endpoint().is_some() => {
                debug!("API docs already registered on this router");
                SwaggerRun::Ok
            }
            Ok(raw_document) => {
                let endpoint = &self.config.endpoint;
                router.push_docs(endpoint, docs_routes(endpoint, raw_document));
                info!("API docs available on {}", endpoint);
                SwaggerRun::Ok
            }
            Err(e) => {
                error!("Failed to set up API docs: {}", e);
                SwaggerRun::Error(e)
            }
        }
    }

    fn load_or_generate(&self, router: &Router) -> Result<String> {
        self.config.validate()?;
        let path = &self.config.json_path;

        if path.exists() {
            debug!("Using cached document {}", path.display());
        } else {
            info!("Generating document {}", path.display());
            let document = self.list_endpoints(router)?;
            write_to_file(&serialize_json(&document)?, path)?;
        }

        read_document(path)
    }
}
