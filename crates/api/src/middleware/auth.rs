//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use pricing_core::entitlement::{is_entitled, Entitlement, Grant};
use pricing_core::error::CoreError;
use pricing_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller extracted from a JWT Bearer token in the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The caller's user id (from `claims.sub`).
    pub user_id: DbId,
    /// Entitlements per resource (from `claims.grants`).
    pub grants: Vec<Grant>,
}

impl AuthUser {
    /// Reject with 401 unless the caller holds `entitlement` on `resource`.
    pub fn require(&self, resource: &str, entitlement: Entitlement) -> Result<(), AppError> {
        if is_entitled(&self.grants, resource, entitlement) {
            Ok(())
        } else {
            tracing::debug!(user_id = %self.user_id, resource, %entitlement, "Entitlement missing");
            Err(AppError::Core(CoreError::Unauthorized(format!(
                "Missing {entitlement} entitlement for {resource}"
            ))))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            grants: claims.grants,
        })
    }
}
