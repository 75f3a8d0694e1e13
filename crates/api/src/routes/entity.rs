//! Route definitions shared by every entity resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::entity::{self, ApiEntity};
use crate::state::AppState;

/// Routes mounted at `/{resource}`.
///
/// ```text
/// GET    /         -> list
/// POST   /         -> create
/// GET    /{id}     -> get_by_id
/// PUT    /{id}     -> update
/// PATCH  /{id}     -> patch
/// DELETE /{id}     -> delete
/// ```
pub fn router<T: ApiEntity>() -> Router<AppState> {
    Router::new()
        .route("/", get(entity::list::<T>).post(entity::create::<T>))
        .route(
            "/{id}",
            get(entity::get_by_id::<T>)
                .put(entity::update::<T>)
                .patch(entity::patch::<T>)
                .delete(entity::delete::<T>),
        )
}
