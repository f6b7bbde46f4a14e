//! The documented router tree.
//!
//! A [`Router`] is an ordered stack of [`Layer`]s: routes (path + per-method endpoints),
//! mounts of sub-routers, and opaque axum services. The tree stays inspectable so the route
//! walker can document it, and [`Router::into_axum`] turns it into a servable
//! [`axum::Router`].
//!
//! Route paths and mount templates use `:name` parameters, as in
//! `router.get("/:name", endpoint)`.

use crate::extractor::path::{braced_params, normalize_template, reconstruct};
use crate::handler::ValidationMiddleware;
use axum::extract::Request;
use axum::handler::Handler;
use axum::middleware::{from_fn, Next};
use axum::routing::{MethodFilter, MethodRouter};
use indexmap::IndexMap;
use log::debug;
use std::collections::HashSet;
use std::fmt;

/// HTTP methods a route can be registered for.
///
/// `Any` is the catch-all registration; it is served but never documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method
    Get,
    /// HTTP POST method
    Post,
    /// HTTP PUT method
    Put,
    /// HTTP DELETE method
    Delete,
    /// HTTP PATCH method
    Patch,
    /// HTTP OPTIONS method
    Options,
    /// HTTP HEAD method
    Head,
    /// Every method
    Any,
}

impl HttpMethod {
    /// Lowercase name as used for OpenAPI path-item keys
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Any => "_all",
        }
    }

    fn filter(&self) -> Option<MethodFilter> {
        match self {
            HttpMethod::Get => Some(MethodFilter::GET),
            HttpMethod::Post => Some(MethodFilter::POST),
            HttpMethod::Put => Some(MethodFilter::PUT),
            HttpMethod::Delete => Some(MethodFilter::DELETE),
            HttpMethod::Patch => Some(MethodFilter::PATCH),
            HttpMethod::Options => Some(MethodFilter::OPTIONS),
            HttpMethod::Head => Some(MethodFilter::HEAD),
            HttpMethod::Any => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type MakeMethodRouter = Box<dyn FnOnce(Option<MethodFilter>) -> MethodRouter + Send>;

/// A handler with the validation middleware that runs in front of it
pub struct Endpoint {
    middleware: Vec<ValidationMiddleware>,
    make: MakeMethodRouter,
}

impl Endpoint {
    pub fn new<H, T>(handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self {
            middleware: Vec::new(),
            make: Box::new(move |filter| match filter {
                Some(filter) => axum::routing::on(filter, handler),
                None => axum::routing::any(handler),
            }),
        }
    }

    /// Append a middleware; middleware runs in the order it was added
    pub fn with(mut self, middleware: ValidationMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// The middleware stack, outermost first
    pub fn middleware(&self) -> &[ValidationMiddleware] {
        &self.middleware
    }

    fn into_method_router(self, method: HttpMethod) -> MethodRouter {
        let mut method_router = (self.make)(method.filter());
        for middleware in self.middleware.into_iter().rev() {
            method_router = method_router.layer(from_fn(move |request: Request, next: Next| {
                let middleware = middleware.clone();
                async move { middleware.handle(request, next).await }
            }));
        }
        method_router
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("middleware", &self.middleware)
            .finish_non_exhaustive()
    }
}

impl ValidationMiddleware {
    /// Put this middleware in front of `handler`
    pub fn then<H, T>(self, handler: H) -> Endpoint
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Endpoint::new(handler).with(self)
    }
}

/// A path with the endpoints registered for it
#[derive(Debug)]
pub struct Route {
    pub path: String,
    pub endpoints: Vec<(HttpMethod, Endpoint)>,
}

/// Compiled form of a mount path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPattern {
    /// The template the pattern was compiled from, when known
    pub template: Option<String>,
    /// Regex source matching the mount prefix
    pub source: String,
    /// Capture names, in order
    pub keys: Vec<String>,
}

impl MountPattern {
    /// Compile a mount template such as `/test/:id` into a prefix-matching regex source
    /// (`^\/test(?:\/([^\/]+?))\/?(?=\/|$)`) and its capture names.
    pub fn compile(template: &str) -> Self {
        let mut source = String::from("^");
        let mut keys = Vec::new();

        for segment in template.split('/').filter(|s| !s.is_empty()) {
            match segment.strip_prefix(':') {
                Some(param) => {
                    let (name, optional) = match param.strip_suffix('?') {
                        Some(name) => (name, true),
                        None => (param, false),
                    };
                    source.push_str(r"(?:\/([^\/]+?))");
                    if optional {
                        source.push('?');
                    }
                    keys.push(name.to_string());
                }
                None => {
                    source.push_str(r"\/");
                    source.push_str(&escape_literal(segment));
                }
            }
        }

        source.push_str(r"\/?(?=\/|$)");

        Self {
            template: Some(template.to_string()),
            source,
            keys,
        }
    }

    /// A pattern known only by its compiled source
    pub fn from_source(source: &str, keys: Vec<String>) -> Self {
        Self {
            template: None,
            source: source.to_string(),
            keys,
        }
    }

    /// The literal base path this pattern matches, starting and ending with `/`
    pub fn base_path(&self) -> String {
        match &self.template {
            Some(template) => normalize_template(template),
            None => reconstruct(&self.source, &self.keys),
        }
    }
}

fn escape_literal(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for c in segment.chars() {
        if matches!(
            c,
            '.' | '+' | '*' | '?' | '^' | '$' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A sub-router mounted under a pattern
#[derive(Debug)]
pub struct Mount {
    pub pattern: MountPattern,
    pub router: Router,
}

/// One entry of a router stack
pub enum Layer {
    Route(Route),
    Mount(Mount),
    /// A plain axum router merged in as is, never documented
    Service(axum::Router),
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Route(route) => f.debug_tuple("Route").field(route).finish(),
            Layer::Mount(mount) => f.debug_tuple("Mount").field(mount).finish(),
            Layer::Service(_) => f.write_str("Service(..)"),
        }
    }
}

/// Inspectable router tree
#[derive(Debug, Default)]
pub struct Router {
    stack: Vec<Layer>,
    /// Endpoint of the docs service added by the generator, if any
    docs_endpoint: Option<String>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// The layers of this router, in registration order
    pub fn stack(&self) -> &[Layer] {
        &self.stack
    }

    /// Register `endpoint` for `method` on `path`.
    ///
    /// Consecutive registrations on the same path share one route layer.
    pub fn route(mut self, path: &str, method: HttpMethod, endpoint: Endpoint) -> Self {
        self.push_endpoint(path, method, endpoint);
        self
    }

    pub fn get(self, path: &str, endpoint: Endpoint) -> Self {
        self.route(path, HttpMethod::Get, endpoint)
    }

    pub fn post(self, path: &str, endpoint: Endpoint) -> Self {
        self.route(path, HttpMethod::Post, endpoint)
    }

    pub fn put(self, path: &str, endpoint: Endpoint) -> Self {
        self.route(path, HttpMethod::Put, endpoint)
    }

    pub fn delete(self, path: &str, endpoint: Endpoint) -> Self {
        self.route(path, HttpMethod::Delete, endpoint)
    }

    pub fn patch(self, path: &str, endpoint: Endpoint) -> Self {
        self.route(path, HttpMethod::Patch, endpoint)
    }

    pub fn any(self, path: &str, endpoint: Endpoint) -> Self {
        self.route(path, HttpMethod::Any, endpoint)
    }

    /// Mount `router` under the template `path` (`""`, `/test`, `/test/:id`)
    pub fn nest(mut self, path: &str, router: Router) -> Self {
        self.stack.push(Layer::Mount(Mount {
            pattern: MountPattern::compile(path),
            router,
        }));
        self
    }

    /// Mount `router` under a pattern known only in compiled form
    pub fn mount_compiled(mut self, source: &str, keys: &[&str], router: Router) -> Self {
        let keys = keys.iter().map(|k| k.to_string()).collect();
        self.stack.push(Layer::Mount(Mount {
            pattern: MountPattern::from_source(source, keys),
            router,
        }));
        self
    }

    /// Merge a plain axum router into this one
    pub fn merge_service(mut self, service: axum::Router) -> Self {
        self.push_service(service);
        self
    }

    /// The endpoint the API docs are served on, once they have been added
    pub fn docs_endpoint(&self) -> Option<&str> {
        self.docs_endpoint.as_deref()
    }

    pub(crate) fn push_docs(&mut self, endpoint: &str, service: axum::Router) {
        self.docs_endpoint = Some(endpoint.to_string());
        self.push_service(service);
    }

    fn push_service(&mut self, service: axum::Router) {
        self.stack.push(Layer::Service(service));
    }

    fn push_endpoint(&mut self, path: &str, method: HttpMethod, endpoint: Endpoint) {
        if let Some(Layer::Route(route)) = self.stack.last_mut() {
            if route.path == path {
                route.endpoints.push((method, endpoint));
                return;
            }
        }
        self.stack.push(Layer::Route(Route {
            path: path.to_string(),
            endpoints: vec![(method, endpoint)],
        }));
    }

    /// Convert the tree into a servable axum router.
    ///
    /// The tree is flattened to absolute paths first, joined the same way the route walker
    /// documents them. Registering the same method twice on a path keeps the last endpoint,
    /// wherever in the tree the two registrations sit. A path ending in `/` is also served
    /// without the slash unless that form is registered itself. An optional `:name?`
    /// segment is served both with and without the segment.
    pub fn into_axum(self) -> axum::Router {
        let mut table = ServeTable::default();
        self.flatten("/", &mut table);

        let mut app = axum::Router::new();

        for (path, methods) in table.routes {
            let mut method_router = MethodRouter::new();
            for (_, endpoint) in methods {
                method_router = method_router.merge(endpoint);
            }
            debug!("Serving route {}", path);
            app = app.route(&path, method_router);
        }

        for (prefix, service) in table.services {
            if prefix.is_empty() {
                app = app.merge(service);
            } else {
                debug!("Serving nested service under {}", prefix);
                app = app.nest(&prefix, service);
            }
        }

        app
    }

    fn flatten(self, prefix: &str, table: &mut ServeTable) {
        for layer in self.stack {
            match layer {
                Layer::Route(route) => {
                    let paths = served_paths(&join_path(prefix, &route.path));
                    for (method, endpoint) in route.endpoints {
                        let method_router = endpoint.into_method_router(method);
                        for path in &paths {
                            table.insert(path, method, method_router.clone());
                        }
                        for path in paths.iter().filter(|p| p.len() > 1 && p.ends_with('/')) {
                            let trimmed = path.trim_end_matches('/');
                            table.insert_alias(trimmed, method, method_router.clone());
                        }
                    }
                }
                Layer::Mount(mount) => {
                    let segment = match &mount.pattern.template {
                        Some(template) => template.clone(),
                        None => mount.pattern.base_path(),
                    };
                    mount.router.flatten(&join_path(prefix, &segment), table);
                }
                Layer::Service(service) => {
                    let nest_at = braced_params(prefix.trim_end_matches('/'));
                    let merged = match table.services.shift_remove(&nest_at) {
                        Some(previous) => previous.merge(service),
                        None => service,
                    };
                    table.services.insert(nest_at, merged);
                }
            }
        }
    }
}

/// Absolute paths and their method routers, in first-registration order
#[derive(Default)]
struct ServeTable {
    routes: IndexMap<String, IndexMap<HttpMethod, MethodRouter>>,
    /// Registrations made on the path itself, which slash-less aliases never replace
    explicit: HashSet<(String, HttpMethod)>,
    services: IndexMap<String, axum::Router>,
}

impl ServeTable {
    fn insert(&mut self, path: &str, method: HttpMethod, method_router: MethodRouter) {
        self.explicit.insert((path.to_string(), method));
        self.routes
            .entry(path.to_string())
            .or_default()
            .insert(method, method_router);
    }

    fn insert_alias(&mut self, path: &str, method: HttpMethod, method_router: MethodRouter) {
        if self.explicit.contains(&(path.to_string(), method)) {
            return;
        }
        self.routes
            .entry(path.to_string())
            .or_default()
            .insert(method, method_router);
    }
}

/// Join a mount prefix and a child path the way the walker does: a `/` child of `/test`
/// is `/test/`.
fn join_path(prefix: &str, path: &str) -> String {
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// The axum paths serving `path`: optional `:name?` segments are expanded into both forms
/// and the remaining parameters are braced.
fn served_paths(path: &str) -> Vec<String> {
    let trailing_slash = path.len() > 1 && path.ends_with('/');
    let mut variants = vec![String::new()];

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let optional = segment
            .strip_prefix(':')
            .and_then(|param| param.strip_suffix('?'));
        match optional {
            Some(name) => {
                let with_segment: Vec<String> = variants
                    .iter()
                    .map(|variant| format!("{}/{{{}}}", variant, name))
                    .collect();
                variants.extend(with_segment);
            }
            None => {
                let segment = braced_params(segment);
                for variant in &mut variants {
                    variant.push('/');
                    variant.push_str(&segment);
                }
            }
        }
    }

    let mut paths = Vec::new();
    for variant in variants {
        let served = match (variant.is_empty(), trailing_slash) {
            (true, _) => "/".to_string(),
            (false, true) => format!("{}/", variant),
            (false, false) => variant,
        };
        if !paths.contains(&served) {
            paths.push(served);
        }
    }
    paths
}
