#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use pricing_core::entitlement::{Entitlement, Grant, ANY_RESOURCE};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use pricing_api::auth::jwt::{generate_access_token, JwtConfig};
use pricing_api::config::ServerConfig;
use pricing_api::router::build_app_router;
use pricing_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: "postgres://pricing@127.0.0.1:1/unreachable".to_string(),
        db_max_connections: 1,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// A pool that never connects until used. Requests that must fail
/// validation before touching storage run against it.
pub fn unreachable_pool() -> PgPool {
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy(&test_config().database_url)
        .expect("lazy pool from a well-formed url")
}

/// Router backed by [`unreachable_pool`].
pub fn build_offline_app() -> Router {
    build_test_app(unreachable_pool())
}

/// A bearer token carrying the given grants.
pub fn token_with(grants: Vec<Grant>) -> String {
    generate_access_token(Uuid::now_v7(), grants, &test_config().jwt)
        .expect("token generation should succeed")
}

/// A bearer token entitled to everything.
pub fn admin_token() -> String {
    token_with(vec![Grant::new(
        ANY_RESOURCE,
        &[
            Entitlement::Create,
            Entitlement::Read,
            Entitlement::Update,
            Entitlement::Delete,
        ],
    )])
}

/// Send a request with an optional bearer token and optional raw body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<String>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(raw) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(raw)
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, token: &str, json: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(token), Some(json.to_string())).await
}

pub async fn put_json(app: Router, uri: &str, token: &str, json: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(json.to_string())).await
}

pub async fn patch_raw(app: Router, uri: &str, token: &str, raw: &str) -> Response {
    send(app, Method::PATCH, uri, Some(token), Some(raw.to_string())).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
