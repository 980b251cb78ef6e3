//! Business rules between the HTTP handlers and the store.
//!
//! Every function takes the store and the caller's [`Identity`], validates the
//! input, checks ownership through the chain and returns models. Rendering is
//! left to [`crate::api::format`].

pub mod accounts;
pub mod beeyards;
pub mod contaminations;
pub mod hives;
pub mod interventions;

use crate::database::models::UserId;
use crate::database::store::ApiaryStore;
use crate::error::ApiError;
use crate::ownership::{authorize, Identity, Owned};

/// Ownership check for by-id CRUD routes: someone else's row is reported missing.
pub(crate) async fn owned(
    store: &dyn ApiaryStore,
    identity: &Identity,
    target: Owned,
) -> Result<UserId, ApiError> {
    authorize(store, identity, target)
        .await
        .map_err(|e| e.conceal(target).into())
}

pub(crate) fn not_found(target: Owned) -> ApiError {
    ApiError::not_found(format!("{} not found", target.label()))
}
