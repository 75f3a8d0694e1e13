//! Generic handlers for entity resources.
//!
//! Each handler is instantiated per entity by `routes::entity::router::<T>()`.
//! Authorization is checked by the [`Authorized`] extractor before the body
//! is read.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use pricing_core::patch::PatchOperation;
use pricing_core::types::DbId;
use pricing_db::query::Table;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::entitlement::{
    Authorized, CreateAction, DeleteAction, ReadAction, UpdateAction,
};
use crate::query::ListParams;
use crate::response::{IdResponse, StatusResponse};
use crate::services::EntityService;
use crate::state::AppState;

/// An entity that can be served over HTTP.
pub trait ApiEntity: Table + Serialize + DeserializeOwned {}

impl<T: Table + Serialize + DeserializeOwned> ApiEntity for T {}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/{resource}
pub async fn list<T: ApiEntity>(
    State(state): State<AppState>,
    _auth: Authorized<T, ReadAction>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<Json<Vec<T>>> {
    let Query(params) = params?;
    let page = params.page()?;
    let filters = params.filter_criteria()?;

    let items = EntityService::<T>::new(state.pool)
        .get(
            page,
            &filters,
            params.search_term.as_deref(),
            params.sort_field.as_deref(),
            &params.sort_order,
        )
        .await?;
    Ok(Json(items))
}

/// GET /api/{resource}/{id}
///
/// A miss is `200 null`.
pub async fn get_by_id<T: ApiEntity>(
    State(state): State<AppState>,
    _auth: Authorized<T, ReadAction>,
    id: Result<Path<DbId>, PathRejection>,
) -> AppResult<Json<Option<T>>> {
    let Path(id) = id?;
    let item = EntityService::<T>::new(state.pool).get_by_id(id).await?;
    Ok(Json(item))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /api/{resource}
pub async fn create<T: ApiEntity>(
    State(state): State<AppState>,
    auth: Authorized<T, CreateAction>,
    body: Result<Json<T>, JsonRejection>,
) -> AppResult<Json<IdResponse>> {
    let Json(entity) = body?;
    let id = EntityService::<T>::new(state.pool).create(entity).await?;

    tracing::info!(entity = T::ENTITY, %id, user_id = %auth.0.user_id, "Entity created");
    Ok(Json(IdResponse { id }))
}

/// PUT /api/{resource}/{id}
pub async fn update<T: ApiEntity>(
    State(state): State<AppState>,
    auth: Authorized<T, UpdateAction>,
    id: Result<Path<DbId>, PathRejection>,
    body: Result<Json<T>, JsonRejection>,
) -> AppResult<Json<StatusResponse>> {
    let Path(id) = id?;
    let Json(entity) = body?;
    let status = EntityService::<T>::new(state.pool).update(id, entity).await?;

    tracing::info!(entity = T::ENTITY, %id, user_id = %auth.0.user_id, "Entity updated");
    Ok(Json(StatusResponse { status }))
}

/// PATCH /api/{resource}/{id}
///
/// An empty body or a literal `null` is a missing document; `[]` is a valid
/// empty one.
pub async fn patch<T: ApiEntity>(
    State(state): State<AppState>,
    auth: Authorized<T, UpdateAction>,
    id: Result<Path<DbId>, PathRejection>,
    body: Bytes,
) -> AppResult<Json<StatusResponse>> {
    let Path(id) = id?;
    let document = parse_patch_document(&body)?;
    let status = EntityService::<T>::new(state.pool)
        .patch(id, document.as_deref())
        .await?;

    tracing::info!(entity = T::ENTITY, %id, user_id = %auth.0.user_id, "Entity patched");
    Ok(Json(StatusResponse { status }))
}

/// DELETE /api/{resource}/{id}
pub async fn delete<T: ApiEntity>(
    State(state): State<AppState>,
    auth: Authorized<T, DeleteAction>,
    id: Result<Path<DbId>, PathRejection>,
) -> AppResult<Json<StatusResponse>> {
    let Path(id) = id?;
    let status = EntityService::<T>::new(state.pool).delete(id).await?;

    tracing::info!(entity = T::ENTITY, %id, user_id = %auth.0.user_id, "Entity deleted");
    Ok(Json(StatusResponse { status }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Decode a PATCH body. `None` means no document was sent.
fn parse_patch_document(body: &[u8]) -> AppResult<Option<Vec<PatchOperation>>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<Option<Vec<PatchOperation>>>(body)
        .map_err(|e| AppError::BadRequest(format!("Malformed patch document: {e}")))
}
