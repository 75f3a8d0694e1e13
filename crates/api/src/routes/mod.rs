pub mod entity;
pub mod health;

use axum::Router;
use pricing_db::models::{PriceList, PriceListVersionComponent, Transaction};

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /pricelist                          list, create
/// /pricelist/{id}                     get, update, patch, delete
///
/// /pricelistversioncomponent          list, create
/// /pricelistversioncomponent/{id}     get, update, patch, delete
///
/// /transaction                        list, create
/// /transaction/{id}                   get, update, patch, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/pricelist", entity::router::<PriceList>())
        .nest(
            "/pricelistversioncomponent",
            entity::router::<PriceListVersionComponent>(),
        )
        .nest("/transaction", entity::router::<Transaction>())
}
