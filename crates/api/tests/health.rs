//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::body_json;
use sqlx::PgPool;
use tower::ServiceExt;

async fn get_health(app: axum::Router) -> axum::response::Response {
    app.oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let response = get_health(common::build_offline_app()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["dbHealthy"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let response = get_health(common::build_offline_app()).await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let response = common::build_offline_app()
        .oneshot(
            Request::get("/this-route-does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_check_returns_ok_with_database(pool: PgPool) {
    let response = get_health(common::build_test_app(pool)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["dbHealthy"], true);
}
