use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    /// Serving, but the database is unreachable.
    Degraded,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub version: &'static str,
    pub db_healthy: bool,
}

impl HealthResponse {
    fn new(db_healthy: bool) -> Self {
        Self {
            status: if db_healthy {
                ServiceStatus::Ok
            } else {
                ServiceStatus::Degraded
            },
            version: env!("CARGO_PKG_VERSION"),
            db_healthy,
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = pricing_db::health_check(&state.pool).await.is_ok();
    Json(HealthResponse::new(db_healthy))
}

/// `/health` sits beside `/api`, outside the authenticated tree.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
