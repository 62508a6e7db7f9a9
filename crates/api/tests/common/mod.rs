#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use draftline_api::config::ServerConfig;
use draftline_api::extract::USER_ID_HEADER;
use draftline_api::routes;
use draftline_api::state::AppState;
use draftline_core::crdt::YrsTextDecoder;
use draftline_db::MemoryStore;
use draftline_engine::{Engine, EngineConfig};
use draftline_events::EventBus;

/// User id sent in `x-user-id` by the request helpers.
pub const USER: i64 = 42;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        database_max_connections: 1,
    }
}

/// An engine over a fresh in-memory store.
pub fn test_engine() -> Arc<Engine> {
    Arc::new(Engine::new(
        Arc::new(MemoryStore::new()),
        Arc::new(YrsTextDecoder::default()),
        Arc::new(EventBus::default()),
        EngineConfig::default(),
    ))
}

/// Build the full application router with all middleware layers over the
/// given engine.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses. Clone the engine `Arc` to build
/// several apps over one store.
pub fn build_test_app(engine: Arc<Engine>) -> Router {
    let state = AppState {
        engine,
        config: Arc::new(test_config()),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, USER.to_string());
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `data` member of a `{ "data": ... }` envelope.
pub async fn data(response: Response) -> serde_json::Value {
    let mut json = body_json(response).await;
    json["data"].take()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a document, returning `(document_id, main_branch_id)`.
pub async fn create_document(engine: &Arc<Engine>, title: &str) -> (i64, i64) {
    let response = post_json(
        build_test_app(engine.clone()),
        "/api/v1/documents",
        serde_json::json!({ "title": title }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = data(response).await;
    (
        created["document"]["id"].as_i64().unwrap(),
        created["main_branch"]["id"].as_i64().unwrap(),
    )
}

/// Save a version on a branch, returning its id.
pub async fn save(engine: &Arc<Engine>, branch_id: i64, body: serde_json::Value) -> i64 {
    let response = post_json(
        build_test_app(engine.clone()),
        &format!("/api/v1/branches/{branch_id}/versions"),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    data(response).await["id"].as_i64().unwrap()
}

/// Fork a branch from `main`, returning its id.
pub async fn fork(engine: &Arc<Engine>, document_id: i64, name: &str) -> i64 {
    let response = post_json(
        build_test_app(engine.clone()),
        &format!("/api/v1/documents/{document_id}/branches"),
        serde_json::json!({ "name": name }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    data(response).await["id"].as_i64().unwrap()
}
