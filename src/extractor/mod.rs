//! Route-tree walking.
//!
//! [`RouteWalker`] visits a [`Router`] depth-first and produces one [`RouteRecord`] per
//! documented `(path, method)` pair. Mount layers extend the current base path with their
//! literal segment (see [`path`]), route layers resolve their metadata through the
//! [`HandlerRegistry`], and service layers are skipped.
//!
//! # Example
//!
//! ```
//! use router_openapi::extractor::RouteWalker;
//! use router_openapi::handler::HandlerRegistry;
//! use router_openapi::router::{Endpoint, Router};
//!
//! async fn ok() -> &'static str { "OK" }
//!
//! let router = Router::new().nest("/test", Router::new().get("/:name", Endpoint::new(ok)));
//! let registry = HandlerRegistry::new();
//! let records = RouteWalker::new(&registry, "").walk(&router);
//! assert_eq!(records[0].path, "/test/{name}");
//! assert_eq!(records[0].tag.as_deref(), Some("test"));
//! ```

pub mod path;

use crate::handler::{EndpointMetadata, HandlerRegistry};
use crate::router::{HttpMethod, Layer, Route, Router};
use indexmap::IndexMap;
use log::debug;

/// A documented endpoint found in the router tree
#[derive(Debug, Clone)]
pub struct RouteRecord {
    /// Absolute path relative to the document base path, with `{param}` placeholders
    pub path: String,
    pub method: HttpMethod,
    /// Metadata of the first documenting middleware, or defaults
    pub metadata: EndpointMetadata,
    /// Enclosing mount path relative to the document base path, if not empty
    pub tag: Option<String>,
}

/// Depth-first walker over a [`Router`] tree
pub struct RouteWalker<'a> {
    registry: &'a HandlerRegistry,
    doc_base_path: &'a str,
}

impl<'a> RouteWalker<'a> {
    /// Create a walker resolving metadata through `registry`. `doc_base_path` is stripped
    /// from every documented path.
    pub fn new(registry: &'a HandlerRegistry, doc_base_path: &'a str) -> Self {
        Self {
            registry,
            doc_base_path,
        }
    }

    /// Walk `router` and return its records in discovery order.
    ///
    /// A `(path, method)` pair seen twice keeps its first position and the last record.
    pub fn walk(&self, router: &Router) -> Vec<RouteRecord> {
        let mut records = IndexMap::new();
        self.explore(router, "/", &mut records);
        debug!("Route walk found {} operations", records.len());
        records.into_values().collect()
    }

    fn explore(
        &self,
        router: &Router,
        base_path: &str,
        records: &mut IndexMap<(String, HttpMethod), RouteRecord>,
    ) {
        for layer in router.stack() {
            match layer {
                Layer::Route(route) => self.visit_route(route, base_path, records),
                Layer::Mount(mount) => {
                    let segment = mount.pattern.base_path();
                    let sub_path = format!("{}{}", base_path.trim_end_matches('/'), segment);
                    debug!("Entering mount {}", sub_path);
                    self.explore(&mount.router, &sub_path, records);
                }
                Layer::Service(_) => debug!("Skipping undocumented service under {}", base_path),
            }
        }
    }

    fn visit_route(
        &self,
        route: &Route,
        base_path: &str,
        records: &mut IndexMap<(String, HttpMethod), RouteRecord>,
    ) {
        let path = self.document_path(base_path, &route.path);
        let tag = self.tag(base_path);

        for (method, endpoint) in &route.endpoints {
            if *method == HttpMethod::Any {
                continue;
            }

            let metadata = endpoint
                .middleware()
                .iter()
                .find_map(|middleware| {
                    self.registry
                        .get(middleware.id())
                        .filter(EndpointMetadata::is_documented)
                })
                .unwrap_or_default();

            debug!("Found route: {} {}", method, path);
            records.insert(
                (path.clone(), *method),
                RouteRecord {
                    path: path.clone(),
                    method: *method,
                    metadata,
                    tag: tag.clone(),
                },
            );
        }
    }

    fn document_path(&self, base_path: &str, route_path: &str) -> String {
        let relative = if route_path.len() > 1 {
            path::braced_params(route_path.strip_prefix('/').unwrap_or(route_path))
        } else {
            String::new()
        };
        let full = format!("{}{}", base_path, relative);
        let stripped = full.strip_prefix(self.doc_base_path).unwrap_or(&full);
        if stripped.starts_with('/') {
            stripped.to_string()
        } else {
            format!("/{}", stripped)
        }
    }

    fn tag(&self, base_path: &str) -> Option<String> {
        let relative = base_path
            .strip_prefix(self.doc_base_path)
            .unwrap_or(base_path)
            .trim_matches('/');
        if relative.is_empty() {
            None
        } else {
            Some(relative.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerParams, ResponseType, ValidationMiddleware};
    use crate::router::Endpoint;
    use crate::validation::Schema;
    use pretty_assertions::assert_eq;

    async fn ok() -> &'static str {
        "OK"
    }

    fn documented(registry: &HandlerRegistry, params: HandlerParams) -> ValidationMiddleware {
        let id = registry.next_id();
        let metadata = params.into_metadata();
        let schema = metadata.schema.clone();
        registry.register(id, metadata);
        ValidationMiddleware::new(id, schema)
    }

    fn summary(records: &[RouteRecord]) -> Vec<(String, &'static str)> {
        records
            .iter()
            .map(|r| (r.path.clone(), r.method.as_str()))
            .collect()
    }

    #[test]
    fn test_root_route_under_mount() {
        let registry = HandlerRegistry::new();
        let router = Router::new().nest(
            "",
            Router::new().nest("/test", Router::new().get("/", Endpoint::new(ok))),
        );

        let records = RouteWalker::new(&registry, "").walk(&router);
        assert_eq!(summary(&records), vec![("/test/".to_string(), "get")]);
        assert_eq!(records[0].tag.as_deref(), Some("test"));
        assert!(!records[0].metadata.is_documented());
    }

    #[test]
    fn test_path_parameters() {
        let registry = HandlerRegistry::new();
        let router = Router::new()
            .nest("/users/:userId", Router::new().get("/posts/:postId", Endpoint::new(ok)));

        let records = RouteWalker::new(&registry, "").walk(&router);
        assert_eq!(records[0].path, "/users/{userId}/posts/{postId}");
        assert_eq!(records[0].tag.as_deref(), Some("users/{userId}"));
    }

    #[test]
    fn test_compiled_mount_is_reconstructed() {
        let registry = HandlerRegistry::new();
        let router = Router::new().mount_compiled(
            r"^\/test(?:\/([^\/]+?))\/?(?=\/|$)",
            &["name"],
            Router::new().get("/", Endpoint::new(ok)),
        );

        let records = RouteWalker::new(&registry, "").walk(&router);
        assert_eq!(records[0].path, "/test/{name}/");
    }

    #[test]
    fn test_doc_base_path_is_stripped() {
        let registry = HandlerRegistry::new();
        let router = Router::new().nest(
            "/api",
            Router::new().nest("/items", Router::new().get("/:id", Endpoint::new(ok))),
        );

        let records = RouteWalker::new(&registry, "/api").walk(&router);
        assert_eq!(records[0].path, "/items/{id}");
        assert_eq!(records[0].tag.as_deref(), Some("items"));
    }

    #[test]
    fn test_first_documenting_middleware_wins() {
        let registry = HandlerRegistry::new();
        let undocumented = documented(&registry, HandlerParams::new());
        let first = documented(&registry, HandlerParams::new().description("first"));
        let second = documented(&registry, HandlerParams::new().description("second"));

        let endpoint = Endpoint::new(ok).with(undocumented).with(first).with(second);
        let router = Router::new().get("/", endpoint);

        let records = RouteWalker::new(&registry, "").walk(&router);
        assert_eq!(records[0].metadata.description.as_deref(), Some("first"));
    }

    #[test]
    fn test_unregistered_middleware_gives_defaults() {
        let registry = HandlerRegistry::new();
        let middleware = ValidationMiddleware::new(registry.next_id(), None);
        let router = Router::new().post("/items", middleware.then(ok));

        let records = RouteWalker::new(&registry, "").walk(&router);
        assert_eq!(records[0].path, "/items");
        assert_eq!(records[0].metadata.content_type, "application/json");
        assert!(records[0].tag.is_none());
    }

    #[test]
    fn test_catch_all_is_skipped() {
        let registry = HandlerRegistry::new();
        let router = Router::new()
            .any("/health", Endpoint::new(ok))
            .get("/items", Endpoint::new(ok));

        let records = RouteWalker::new(&registry, "").walk(&router);
        assert_eq!(summary(&records), vec![("/items".to_string(), "get")]);
    }

    #[test]
    fn test_collision_last_write_wins_first_position_kept() {
        let registry = HandlerRegistry::new();
        let a = documented(&registry, HandlerParams::new().operation_id("a"));
        let b = documented(&registry, HandlerParams::new().operation_id("b"));

        let router = Router::new()
            .get("/x", Endpoint::new(ok).with(a))
            .get("/y", Endpoint::new(ok))
            .nest("/", Router::new().get("/x", Endpoint::new(ok).with(b)));

        let records = RouteWalker::new(&registry, "").walk(&router);
        assert_eq!(
            summary(&records),
            vec![("/x".to_string(), "get"), ("/y".to_string(), "get")]
        );
        assert_eq!(records[0].metadata.operation_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_response_type_is_carried() {
        let registry = HandlerRegistry::new();
        let middleware = documented(
            &registry,
            (Schema::object(), ResponseType::named("TestingEntity", 200).array()).into(),
        );
        let router = Router::new().nest("/test", Router::new().get("/", middleware.then(ok)));

        let records = RouteWalker::new(&registry, "").walk(&router);
        let response = records[0].metadata.response_type.as_ref().unwrap();
        assert_eq!(response.type_ref.as_str(), "TestingEntity");
        assert!(response.array);
    }
}
