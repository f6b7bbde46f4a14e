//! HTTP endpoints serving a generated document: the Swagger UI page, the raw JSON and the
//! initializer script the page loads.

use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use log::debug;
use std::sync::Arc;

/// Swagger UI distribution the page loads its assets from
const SWAGGER_UI_DIST: &str = "https://unpkg.com/swagger-ui-dist@5";

/// Routes serving `raw_document` under `endpoint`:
///
/// - `GET {endpoint}`: the UI page
/// - `GET {endpoint}.json`: the document as `application/json`
/// - `GET {endpoint}/swagger-initializer.js`: the script pointing the UI at the JSON
pub fn docs_routes(endpoint: &str, raw_document: String) -> axum::Router {
    let endpoint = match endpoint.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    let json_path = format!("{}.json", endpoint.trim_end_matches('/'));
    let initializer_path = format!("{}/swagger-initializer.js", endpoint.trim_end_matches('/'));
    debug!("Serving API docs on {} and {}", endpoint, json_path);

    let document: Arc<str> = Arc::from(raw_document);
    let page: Arc<str> = Arc::from(index_page(&initializer_path));
    let initializer: Arc<str> = Arc::from(initializer_script(&json_path));

    axum::Router::new()
        .route(
            endpoint,
            get(move || {
                let page = page.clone();
                async move { Html(page.to_string()) }
            }),
        )
        .route(
            &json_path,
            get(move || {
                let document = document.clone();
                async move {
                    let content_type = [(header::CONTENT_TYPE, "application/json")];
                    (content_type, document.to_string()).into_response()
                }
            }),
        )
        .route(
            &initializer_path,
            get(move || {
                let initializer = initializer.clone();
                async move {
                    let content_type = [(header::CONTENT_TYPE, "application/javascript")];
                    (content_type, initializer.to_string()).into_response()
                }
            }),
        )
}

fn index_page(initializer_path: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8">
    <title>Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="{dist}/swagger-ui.css">
  </head>
  <body>
    <div id="swagger-ui"></div>
    <script src="{dist}/swagger-ui-bundle.js" charset="UTF-8"></script>
    <script src="{dist}/swagger-ui-standalone-preset.js" charset="UTF-8"></script>
    <script src="{initializer}" charset="UTF-8"></script>
  </body>
</html>
"#,
        dist = SWAGGER_UI_DIST,
        initializer = initializer_path,
    )
}

fn initializer_script(json_path: &str) -> String {
    format!(
        r##"window.onload = function () {{
  window.ui = SwaggerUIBundle({{
    url: "{json_path}",
    dom_id: "#swagger-ui",
    deepLinking: true,
    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
    plugins: [SwaggerUIBundle.plugins.DownloadUrl],
    layout: "StandaloneLayout"
  }});
}};
"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn fetch(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_serves_raw_document_verbatim() {
        let raw = "{\n  \"openapi\": \"3.0.0\"\n}".to_string();
        let app = docs_routes("/api-docs", raw.clone());
        let (status, content_type, body) = fetch(app, "/api-docs.json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body, raw);
    }

    #[tokio::test]
    async fn test_serves_ui_page() {
        let app = docs_routes("/api-docs", "{}".to_string());
        let (status, content_type, body) = fetch(app, "/api-docs").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert!(body.contains("swagger-ui-bundle.js"));
        assert!(body.contains("/api-docs/swagger-initializer.js"));
    }

    #[tokio::test]
    async fn test_initializer_points_at_json() {
        let (status, _, body) = fetch(
            docs_routes("/api-docs/", "{}".to_string()),
            "/api-docs/swagger-initializer.js",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("url: \"/api-docs.json\""));
        assert!(body.contains("dom_id: \"#swagger-ui\""));
    }
}
