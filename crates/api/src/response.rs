//! Shared response bodies for entity handlers.

use pricing_core::types::DbId;
use serde::Serialize;

/// `{ "id": ... }` returned by create.
#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: DbId,
}

/// `{ "status": true }` returned by update, patch and delete.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: bool,
}
