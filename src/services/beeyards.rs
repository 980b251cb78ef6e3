use serde::Deserialize;
use std::collections::HashMap;

use super::{not_found, owned};
use crate::database::models::beeyard::BEEYARD_NAME_MAX;
use crate::database::models::{BeeYard, BeeYardDraft, Intervention, InterventionDraft, InterventionType};
use crate::database::store::ApiaryStore;
use crate::error::ApiError;
use crate::filter::{FilterSet, Resource};
use crate::ownership::{authorize, Identity, Owned};
use crate::validation::FieldErrors;

#[derive(Debug, Default, Deserialize)]
pub struct BeeYardInput {
    pub name: Option<String>,
}

/// Body of `POST /api/beeyards/:id/interventions`.
#[derive(Debug, Default, Deserialize)]
pub struct BulkInput {
    pub intervention_type: Option<String>,
}

fn check_name(errors: &mut FieldErrors, name: Option<String>) -> Option<String> {
    let name = errors.required("name", name)?;
    let trimmed = name.trim();
    if trimmed.is_empty() {
        errors.add("name", "This field may not be blank.");
        return None;
    }
    if trimmed.chars().count() > BEEYARD_NAME_MAX {
        errors.add(
            "name",
            format!("Ensure this field has no more than {} characters.", BEEYARD_NAME_MAX),
        );
        return None;
    }
    Some(trimmed.to_string())
}

pub async fn list(
    store: &dyn ApiaryStore,
    identity: &Identity,
    query: &HashMap<String, String>,
) -> Result<Vec<BeeYard>, ApiError> {
    identity.require()?;
    let filters = FilterSet::from_query(Resource::BeeYard, query)?;
    let listing = store.list_beeyards(identity.scope(), &filters, None).await?;
    Ok(listing.rows)
}

pub async fn get(store: &dyn ApiaryStore, identity: &Identity, id: i64) -> Result<BeeYard, ApiError> {
    let target = Owned::BeeYard(id);
    owned(store, identity, target).await?;
    store.beeyard(id).await?.ok_or_else(|| not_found(target))
}

/// The caller becomes the yard's beekeeper.
pub async fn create(
    store: &dyn ApiaryStore,
    identity: &Identity,
    input: BeeYardInput,
) -> Result<BeeYard, ApiError> {
    let user_id = identity.require()?;
    let mut errors = FieldErrors::new();
    let name = check_name(&mut errors, input.name);
    errors.finish()?;

    let draft = BeeYardDraft {
        name: name.unwrap_or_default(),
        beekeeper_id: Some(user_id),
    };
    let yard = store.insert_beeyard(draft).await?;
    tracing::info!(user_id, beeyard_id = yard.id, "bee yard created");
    Ok(yard)
}

/// PUT and PATCH; the beekeeper never changes.
pub async fn update(
    store: &dyn ApiaryStore,
    identity: &Identity,
    id: i64,
    input: BeeYardInput,
    partial: bool,
) -> Result<BeeYard, ApiError> {
    let target = Owned::BeeYard(id);
    owned(store, identity, target).await?;
    let existing = store.beeyard(id).await?.ok_or_else(|| not_found(target))?;

    let mut errors = FieldErrors::new();
    let name = match input.name {
        None if partial => Some(existing.name.clone()),
        name => check_name(&mut errors, name),
    };
    errors.finish()?;

    let draft = BeeYardDraft {
        name: name.unwrap_or(existing.name),
        beekeeper_id: existing.beekeeper_id,
    };
    store.update_beeyard(id, draft).await?.ok_or_else(|| not_found(target))
}

pub async fn delete(store: &dyn ApiaryStore, identity: &Identity, id: i64) -> Result<(), ApiError> {
    let target = Owned::BeeYard(id);
    owned(store, identity, target).await?;
    if store.delete_beeyard(id).await? {
        Ok(())
    } else {
        Err(not_found(target))
    }
}

/// Log one payload-less intervention on every hive of the yard, all or nothing.
///
/// Unlike the by-id routes, a yard owned by someone else is refused with
/// `Forbidden`.
pub async fn apply_to_all_hives(
    store: &dyn ApiaryStore,
    identity: &Identity,
    beeyard_id: i64,
    intervention_type: Option<&str>,
) -> Result<Vec<Intervention>, ApiError> {
    let user_id = authorize(store, identity, Owned::BeeYard(beeyard_id)).await?;

    let mut errors = FieldErrors::new();
    let kind = errors.choice::<InterventionType>("intervention_type", intervention_type);
    if let Some(kind) = kind {
        if kind.detail_kind().is_some() {
            errors.add(
                "intervention_type",
                format!("\"{}\" requires a detail record and cannot be applied to a whole yard.", kind),
            );
        }
    }
    errors.finish()?;
    let kind = kind.ok_or_else(|| ApiError::field_error("intervention_type", "This field is required."))?;

    let drafts: Vec<InterventionDraft> = store
        .hives_in_yard(beeyard_id)
        .await?
        .iter()
        .map(|hive| InterventionDraft::bare(kind, hive.id))
        .collect();

    let created = store.insert_interventions(drafts).await?;
    tracing::info!(user_id, beeyard_id, count = created.len(), intervention_type = %kind, "bulk intervention applied");
    Ok(created)
}
