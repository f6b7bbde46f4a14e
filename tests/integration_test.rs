use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::{Extension, Json};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use router_openapi::{
    HandlerParams, OpenApiGenerator, ResponseType, Router, Schema, SwaggerConfig, SwaggerDoc,
    SwaggerRun, Validated,
};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

fn models_folder() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/models")
}

fn swagger_doc() -> SwaggerDoc {
    let mut doc = SwaggerDoc::new("Testing", "1.0.0")
        .with_base_path("")
        .with_server("http://localhost:4000", Some("Development server"));
    doc.info.description = Some("Testing API".to_string());
    doc
}

fn config(json_path: PathBuf) -> SwaggerConfig {
    SwaggerConfig::new(swagger_doc(), json_path, "/api-docs").with_folder(models_folder())
}

async fn echo(Extension(Validated(view)): Extension<Validated>) -> Json<Value> {
    Json(view)
}

async fn list() -> Json<Value> {
    Json(json!([]))
}

/// The testing application: `/test/` lists entities, `/test/:name` creates and replaces one
fn testing_router(generator: &OpenApiGenerator) -> Router {
    let create = Schema::object()
        .required()
        .example(json!({ "body": { "name": "name" } }))
        .key(
            "params",
            Schema::object().key("name", Schema::string().required()),
        )
        .key(
            "body",
            Schema::object()
                .required()
                .key("name", Schema::string().description("Display name")),
        );

    let replace = Schema::object().key(
        "body",
        Schema::object().key("count", Schema::integer()),
    );

    let items = Router::new()
        .get(
            "/",
            generator
                .create_handler(
                    HandlerParams::new()
                        .response_type(ResponseType::named("TestingEntity", 200).array()),
                )
                .then(list),
        )
        .post(
            "/:name",
            generator
                .create_handler(
                    HandlerParams::new()
                        .schema(create)
                        .response_type(
                            ResponseType::named("TestingEntity", 201).description("Created"),
                        )
                        .description("Create an entity")
                        .operation_id("createEntity"),
                )
                .then(echo),
        )
        .put(
            "/:name",
            generator
                .create_handler(
                    HandlerParams::new()
                        .schema(replace)
                        .content_type("application/x-www-form-urlencoded"),
                )
                .then(echo),
        );

    Router::new().nest("/test", items)
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn document(generator: &OpenApiGenerator, router: &Router) -> Value {
    serde_json::to_value(generator.list_endpoints(router).unwrap()).unwrap()
}

#[test]
fn test_paths_are_reconstructed_from_mounts() {
    let temp_dir = TempDir::new().unwrap();
    let generator = OpenApiGenerator::new(config(temp_dir.path().join("swagger.json")));
    let router = testing_router(&generator);

    let doc = document(&generator, &router);
    let paths: Vec<&String> = doc["paths"].as_object().unwrap().keys().collect();

    assert_eq!(paths, vec!["/test/", "/test/{name}"]);
    assert_eq!(doc["paths"]["/test/{name}"]["post"]["tags"], json!(["test"]));
}

#[test]
fn test_path_parameter_is_documented() {
    let temp_dir = TempDir::new().unwrap();
    let generator = OpenApiGenerator::new(config(temp_dir.path().join("swagger.json")));
    let doc = document(&generator, &testing_router(&generator));

    let parameters = &doc["paths"]["/test/{name}"]["post"]["parameters"];
    assert_eq!(parameters.as_array().unwrap().len(), 1);
    assert_eq!(parameters[0]["in"], "path");
    assert_eq!(parameters[0]["name"], "name");
    assert_eq!(parameters[0]["required"], true);
    assert_eq!(parameters[0]["schema"]["type"], "string");
}

#[test]
fn test_request_body_is_documented() {
    let temp_dir = TempDir::new().unwrap();
    let generator = OpenApiGenerator::new(config(temp_dir.path().join("swagger.json")));
    let doc = document(&generator, &testing_router(&generator));

    let post = &doc["paths"]["/test/{name}"]["post"];
    let media = &post["requestBody"]["content"]["application/json"];
    assert_eq!(media["schema"]["properties"]["name"]["type"], "string");
    assert_eq!(media["schema"]["properties"]["name"]["description"], "Display name");
    assert_eq!(media["examples"]["custom"]["value"], json!({ "name": "name" }));
    assert_eq!(post["operationId"], "createEntity");
    assert_eq!(post["description"], "Create an entity");

    let put = &doc["paths"]["/test/{name}"]["put"];
    let form = &put["requestBody"]["content"]["application/x-www-form-urlencoded"];
    assert_eq!(form["schema"]["properties"]["count"]["type"], "integer");
}

#[test]
fn test_response_types_reference_components() {
    let temp_dir = TempDir::new().unwrap();
    let generator = OpenApiGenerator::new(config(temp_dir.path().join("swagger.json")));
    let doc = document(&generator, &testing_router(&generator));

    assert_eq!(
        doc["paths"]["/test/{name}"]["post"]["responses"],
        json!({
            "201": {
                "description": "Created",
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/TestingEntity" }
                    }
                }
            }
        })
    );
    assert_eq!(
        doc["paths"]["/test/"]["get"]["responses"]["200"]["content"]["application/json"]["schema"],
        json!({ "type": "array", "items": { "$ref": "#/components/schemas/TestingEntity" } })
    );

    let entity = &doc["components"]["schemas"]["TestingEntity"];
    assert_eq!(entity["properties"]["nickname"], json!({ "type": "string" }));
    assert_eq!(entity["properties"]["status"], json!({ "$ref": "#/components/schemas/Status" }));
    assert_eq!(
        doc["components"]["schemas"]["Status"]["enum"],
        json!(["active", "archived"])
    );
}

#[test]
fn test_undocumented_route_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let generator = OpenApiGenerator::new(config(temp_dir.path().join("swagger.json")));
    let router = Router::new().get("/plain", generator.create_handler(None::<Schema>).then(list));

    let doc = document(&generator, &router);
    let operation = &doc["paths"]["/plain"]["get"];

    assert_eq!(operation["operationId"], "/plain_get");
    assert_eq!(operation["description"], "");
    assert_eq!(operation["responses"], json!({ "200": { "description": "" } }));
    assert!(operation.get("tags").is_none());
    assert!(operation.get("parameters").is_none());
    assert!(operation.get("requestBody").is_none());
}

#[test]
fn test_servers_and_info() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = config(temp_dir.path().join("swagger.json"));
    config.swagger_doc.base_path = Some("/api".to_string());
    let generator = OpenApiGenerator::new(config);

    let doc = document(&generator, &Router::new());

    assert_eq!(doc["openapi"], "3.0.0");
    assert_eq!(doc["info"]["description"], "Testing API");
    assert_eq!(doc["servers"][0]["url"], "http://localhost:4000/api");
    assert!(doc.get("basePath").is_none());
}

#[tokio::test]
async fn test_docs_are_served_from_cache() {
    let temp_dir = TempDir::new().unwrap();
    let json_path = temp_dir.path().join("swagger.json");
    let generator = OpenApiGenerator::new(config(json_path.clone()));

    let mut router = testing_router(&generator);
    assert_eq!(generator.run_swagger(&mut router).status(), "OK");
    let written = fs::read_to_string(&json_path).unwrap();
    let modified = fs::metadata(&json_path).unwrap().modified().unwrap();

    let app = router.into_axum();
    let (status, body) = send(app.clone(), get("/api-docs.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, written);

    let (status, page) = send(app, get("/api-docs")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("swagger-ui"));

    // A second start reads the same file back without rewriting it
    let mut router = testing_router(&generator);
    assert!(generator.run_swagger(&mut router).is_ok());
    assert_eq!(fs::metadata(&json_path).unwrap().modified().unwrap(), modified);

    let (_, body) = send(router.into_axum(), get("/api-docs.json")).await;
    assert_eq!(body, written);
}

#[tokio::test]
async fn test_inactive_configuration_serves_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let json_path = temp_dir.path().join("swagger.json");
    let generator = OpenApiGenerator::new(config(json_path.clone()).with_active(false));

    let mut router = testing_router(&generator);
    assert!(generator.run_swagger(&mut router).is_ok());
    assert!(generator.registry().is_empty());
    assert!(!json_path.exists());

    let (status, _) = send(router.into_axum(), get("/api-docs.json")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unwritable_cache_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let json_path = temp_dir.path().join("missing").join("swagger.json");
    let generator = OpenApiGenerator::new(config(json_path));

    let mut router = testing_router(&generator);
    let run = generator.run_swagger(&mut router);
    assert!(matches!(run, SwaggerRun::Error(_)));

    let app = router.into_axum();
    let (status, _) = send(app.clone(), get("/api-docs.json")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(app, get("/test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_documented_paths_are_served() {
    let temp_dir = TempDir::new().unwrap();
    let generator = OpenApiGenerator::new(config(temp_dir.path().join("swagger.json")));
    let mut router = testing_router(&generator);
    let doc = document(&generator, &router);
    assert!(generator.run_swagger(&mut router).is_ok());
    let app = router.into_axum();

    let (status, body) = send(app.clone(), get("/test/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
    assert!(doc["paths"].get("/test/").is_some());

    let (status, _) = send(app, post_json("/test/abc", json!({ "name": "entity" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"].get("/test/{name}").is_some());
}

#[tokio::test]
async fn test_requests_are_validated() {
    let temp_dir = TempDir::new().unwrap();
    let generator = OpenApiGenerator::new(config(temp_dir.path().join("swagger.json")));
    let app = testing_router(&generator).into_axum();

    let (status, body) = send(app.clone(), post_json("/test/abc", json!({ "name": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(error["code"], "bad-request");
    assert!(error["message"].as_str().unwrap().contains("body.name"));

    let (status, body) = send(
        app,
        post_json("/test/abc", json!({ "name": "entity", "extra": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let view: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(view["params"]["name"], "abc");
    assert_eq!(view["body"], json!({ "name": "entity" }));
}
