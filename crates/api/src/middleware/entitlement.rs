//! Entitlement extractors.
//!
//! [`Authorized<T, A>`] wraps [`AuthUser`] and rejects requests whose grants
//! do not include action `A` on the resource named by entity `T`. Because it
//! extracts from request parts, the check runs before any body is parsed.

use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use pricing_core::entitlement::Entitlement;
use pricing_core::field::Schema;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// An action guarded by one entitlement.
pub trait Action {
    const ENTITLEMENT: Entitlement;
}

pub struct CreateAction;
pub struct ReadAction;
pub struct UpdateAction;
pub struct DeleteAction;

impl Action for CreateAction {
    const ENTITLEMENT: Entitlement = Entitlement::Create;
}

impl Action for ReadAction {
    const ENTITLEMENT: Entitlement = Entitlement::Read;
}

impl Action for UpdateAction {
    const ENTITLEMENT: Entitlement = Entitlement::Update;
}

impl Action for DeleteAction {
    const ENTITLEMENT: Entitlement = Entitlement::Delete;
}

/// A caller entitled to perform `A` on entity `T`. Rejects with 401 otherwise.
///
/// ```ignore
/// async fn remove(auth: Authorized<Transaction, DeleteAction>) -> AppResult<()> {
///     tracing::info!(user_id = %auth.0.user_id, "Removing transaction");
///     Ok(())
/// }
/// ```
pub struct Authorized<T, A>(pub AuthUser, PhantomData<fn() -> (T, A)>);

impl<T, A> FromRequestParts<AppState> for Authorized<T, A>
where
    T: Schema,
    A: Action,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.require(T::ENTITY, A::ENTITLEMENT)?;
        Ok(Authorized(user, PhantomData))
    }
}
