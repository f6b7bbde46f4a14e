//! Router OpenAPI - OpenAPI 3.0 documents from a live router tree.
//!
//! Routes are registered on a [`Router`] together with a [`ValidationMiddleware`] created by
//! [`OpenApiGenerator::create_handler`]. The middleware validates requests at runtime and
//! records what the route accepts and returns. [`OpenApiGenerator::run_swagger`] walks the tree,
//! turns that metadata into an OpenAPI document, caches it on disk and serves it next to a
//! Swagger UI page.
//!
//! # Architecture
//!
//! 1. [`router`] - The inspectable router tree and its conversion to `axum`
//! 2. [`handler`] - Endpoint metadata, its registry and the validation middleware
//! 3. [`validation`] - Request schemas: validation and JSON schema description
//! 4. [`extractor`] - Walks the router tree and reconstructs mount paths
//! 5. [`parameters`] - Maps a request schema to parameters and a request body
//! 6. [`scanner`], [`parser`], [`type_resolver`], [`schema_generator`] - Component schemas
//!    from Rust source folders
//! 7. [`normalizer`] - Flattens nullable types in generated schemas
//! 8. [`openapi_builder`] - Assembles the document
//! 9. [`serializer`], [`docs`], [`generator`] - Caching and serving
//!
//! # Example Usage
//!
//! ```no_run
//! use router_openapi::{OpenApiGenerator, ResponseType, Router, Schema, SwaggerConfig, SwaggerDoc};
//!
//! let config = SwaggerConfig::new(
//!     SwaggerDoc::new("Testing", "1.0.0").with_server("http://localhost:4000", None),
//!     "target/swagger.json",
//!     "/api-docs",
//! )
//! .with_folder("src/models");
//! let generator = OpenApiGenerator::new(config);
//!
//! let create = Schema::object()
//!     .key("body", Schema::object().key("name", Schema::string().required()))
//!     .required();
//! let items = Router::new().post(
//!     "/",
//!     generator
//!         .create_handler((create, ResponseType::named("TestingEntity", 201)))
//!         .then(|| async { "created" }),
//! );
//!
//! let mut router = Router::new().nest("/test", items);
//! generator.run_swagger(&mut router);
//! let app = router.into_axum();
//! # let _ = app;
//! ```

pub mod cli;
pub mod config;
pub mod docs;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod handler;
pub mod normalizer;
pub mod openapi_builder;
pub mod parameters;
pub mod parser;
pub mod router;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod type_resolver;
pub mod validation;

pub use config::{SwaggerConfig, SwaggerDoc};
pub use error::{Error, HandlerError, Result};
pub use generator::{OpenApiGenerator, SwaggerRun};
pub use handler::{
    EndpointMetadata, HandlerParams, ResponseType, TypeRef, Validated, ValidationMiddleware,
};
pub use openapi_builder::OpenApiDocument;
pub use router::{Endpoint, HttpMethod, Router};
pub use schema_generator::{SourceSchemaGenerator, TypeSchemaGenerator};
pub use validation::{RequestSchema, Schema};
