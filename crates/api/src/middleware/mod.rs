//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the caller from a JWT Bearer token.
//! - [`entitlement::Authorized`] -- Requires an entitlement on an entity's resource.

pub mod auth;
pub mod entitlement;
