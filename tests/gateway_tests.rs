// Gateway tests: forwarding, limits and CORS against a mocked upstream
// Author: kelexine (https://github.com/kelexine)

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use bitflix::config::AppConfig;
use bitflix::server::{create_router, AppState};
use mockito::Matcher;
use serde_json::{json, Value};
use tower::ServiceExt;

fn config(base_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.upstream.base_url = base_url.to_string();
    config.upstream.api_key = "test-key".to_string();
    config.server.static_dir = "/nonexistent/bitflix-build".to_string();
    config
}

fn app(config: AppConfig) -> Router {
    create_router(AppState::new(config).unwrap()).unwrap()
}

fn graphql_post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn allow_origin(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok())
}

/// Upstream that accepts connections and never answers.
async fn hanging_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stub = Router::new().fallback(|| std::future::pending::<&'static str>());
    tokio::spawn(async move {
        axum::serve(listener, stub).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_graphql_forwarded_with_credential() {
    let mut server = mockito::Server::new_async().await;
    let upstream = server
        .mock("POST", "/graphql")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({ "query": "{ genres { nodes { id } } }" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":{"genres":{"nodes":[{"id":"g1"}]}}}"#)
        .expect(1)
        .create_async()
        .await;

    let response = app(config(&server.url()))
        .oneshot(graphql_post(r#"{"query":"{ genres { nodes { id } } }"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(allow_origin(&response), Some("*"));
    assert!(response.headers().contains_key("ratelimit-remaining"));
    assert_eq!(
        json_body(response).await,
        json!({ "data": { "genres": { "nodes": [{ "id": "g1" }] } } })
    );
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_upstream_status_passed_through() {
    let mut server = mockito::Server::new_async().await;
    let _upstream = server
        .mock("POST", "/graphql")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"errors":[{"message":"Cannot query field \"foo\""}]}"#)
        .create_async()
        .await;

    let response = app(config(&server.url()))
        .oneshot(graphql_post(r#"{"query":"{ foo }"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(allow_origin(&response), Some("*"));
    assert_eq!(
        json_body(response).await,
        json!({ "errors": [{ "message": "Cannot query field \"foo\"" }] })
    );
}

#[tokio::test]
async fn test_invalid_json_never_forwarded() {
    let mut server = mockito::Server::new_async().await;
    let upstream = server
        .mock("POST", "/graphql")
        .expect(0)
        .create_async()
        .await;

    let response = app(config(&server.url()))
        .oneshot(graphql_post("{ not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(allow_origin(&response), Some("*"));
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Invalid JSON in request body" })
    );
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut server = mockito::Server::new_async().await;
    let upstream = server
        .mock("POST", "/graphql")
        .expect(0)
        .create_async()
        .await;

    let mut config = config(&server.url());
    config.limits.max_request_size = "32b".to_string();

    let query = format!(r#"{{"query":"{}"}}"#, "x".repeat(256));
    let response = app(config).oneshot(graphql_post(query)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(allow_origin(&response), Some("*"));
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Request payload too large" })
    );
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_rate_limited_requests_not_forwarded() {
    let mut server = mockito::Server::new_async().await;
    let upstream = server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":{}}"#)
        .expect(2)
        .create_async()
        .await;

    let mut config = config(&server.url());
    config.rate_limit.max_requests = 2;
    let app = app(config);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(graphql_post(r#"{"query":"{ a }"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(graphql_post(r#"{"query":"{ a }"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(allow_origin(&response), Some("*"));
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(
        response
            .headers()
            .get("ratelimit-remaining")
            .and_then(|v| v.to_str().ok()),
        Some("0")
    );

    let body = json_body(response).await;
    assert_eq!(
        body["error"],
        "Too many requests from this IP, please try again later."
    );
    assert!(body["retryAfter"].as_u64().unwrap() >= 1);
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_preflight_not_rate_limited() {
    let mut config = config("http://127.0.0.1:9");
    config.rate_limit.max_requests = 1;
    let app = app(config);

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/graphql")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(allow_origin(&response), Some("*"));
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_METHODS)
                .and_then(|v| v.to_str().ok()),
            Some("POST, OPTIONS")
        );
    }
}

#[tokio::test]
async fn test_healthcheck_forwards_path_and_query() {
    let mut server = mockito::Server::new_async().await;
    let upstream = server
        .mock("GET", Matcher::Regex("^/api/healthcheck".to_string()))
        .match_query(Matcher::UrlEncoded("verbose".to_string(), "1".to_string()))
        .match_header("authorization", "Bearer test-key")
        .with_status(503)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"degraded"}"#)
        .expect(1)
        .create_async()
        .await;

    let response = app(config(&server.url()))
        .oneshot(
            Request::builder()
                .uri("/api/healthcheck?verbose=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await, json!({ "status": "degraded" }));
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_missing_credential_fails_closed() {
    let mut config = config("https://movies.example.com");
    config.upstream.api_key = String::new();
    let app = app(config);

    let response = app
        .clone()
        .oneshot(graphql_post(r#"{"query":"{ a }"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(allow_origin(&response), Some("*"));
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Server configuration error" })
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_upstream_timeout_returns_504() {
    let base_url = hanging_upstream().await;
    let mut config = config(&base_url);
    config.upstream.timeout_ms = 100;
    let app = app(config);

    let response = app
        .clone()
        .oneshot(graphql_post(r#"{"query":"{ a }"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(allow_origin(&response), Some("*"));
    assert_eq!(json_body(response).await, json!({ "error": "Request timeout" }));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json_body(response).await, json!({ "error": "Request timeout" }));
}

#[tokio::test]
async fn test_unreachable_upstream() {
    // Nothing listens on the discard port
    let app = app(config("http://127.0.0.1:9"));

    let response = app
        .clone()
        .oneshot(graphql_post(r#"{"query":"{ a }"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(allow_origin(&response), Some("*"));
    let body = json_body(response).await;
    assert_eq!(body["error"], "GraphQL proxy request failed");
    assert!(body["details"].is_string());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({ "error": "Proxy request failed" }));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let response = app(config("http://127.0.0.1:9"))
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("ratelimit-limit").is_none());
}

#[tokio::test]
async fn test_forwarded_clients_have_separate_quotas() {
    let mut server = mockito::Server::new_async().await;
    let upstream = server
        .mock("POST", "/graphql")
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":{}}"#)
        .expect(2)
        .create_async()
        .await;

    let mut config = config(&server.url());
    config.rate_limit.max_requests = 1;
    config.server.trust_forwarded_for = true;
    let app = app(config);

    let from = |ip: &str| {
        let mut request = graphql_post(r#"{"query":"{ a }"}"#);
        request
            .headers_mut()
            .insert("x-forwarded-for", ip.parse().unwrap());
        request
    };

    let first = app.clone().oneshot(from("203.0.113.1")).await.unwrap();
    let other = app.clone().oneshot(from("203.0.113.2")).await.unwrap();
    let again = app.clone().oneshot(from("203.0.113.1")).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(other.status(), StatusCode::OK);
    assert_eq!(again.status(), StatusCode::TOO_MANY_REQUESTS);
    upstream.assert_async().await;
}

#[tokio::test]
async fn test_frontend_fallback_skips_api_paths() {
    let build = tempfile::tempdir().unwrap();
    std::fs::write(build.path().join("index.html"), "<html>bitflix</html>").unwrap();

    let mut config = config("http://127.0.0.1:9");
    config.server.static_dir = build.path().to_string_lossy().into_owned();
    let app = app(config);

    let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

    let response = app.clone().oneshot(get("/movies/42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"<html>bitflix</html>");

    for path in ["/graphql/schema", "/healthcheck/deep", "/api/graphql/x"] {
        let response = app.clone().oneshot(get(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);
        assert_eq!(json_body(response).await, json!({ "error": "Not found" }));
    }
}
