use serde::Deserialize;
use std::collections::HashMap;

use super::{not_found, owned};
use crate::database::models::hive::{default_queen_year, queen_year_in_range, QUEEN_YEAR_MAX, QUEEN_YEAR_MIN};
use crate::database::models::{BeeSpecies, Hive, HiveDraft, HiveStatus, UserId};
use crate::database::store::ApiaryStore;
use crate::error::ApiError;
use crate::filter::{FilterSet, Resource};
use crate::ownership::{Identity, Owned, Ownership};
use crate::validation::{double_option, FieldErrors};

#[derive(Debug, Default, Deserialize)]
pub struct HiveInput {
    pub name: Option<String>,
    pub status: Option<String>,
    pub species: Option<String>,
    /// Required on create; `null` is refused so a hive cannot leave its keeper.
    #[serde(default, alias = "beeyard", deserialize_with = "double_option")]
    pub beeyard_id: Option<Option<i64>>,
    pub queen_year: Option<i64>,
}

/// Build the stored draft from the input, falling back to `existing` on PATCH.
fn draft(input: HiveInput, existing: Option<&Hive>, partial: bool) -> Result<HiveDraft, ApiError> {
    let base = existing.filter(|_| partial);
    let mut errors = FieldErrors::new();

    let name = match (input.name, base) {
        (None, Some(hive)) => Some(hive.name.clone()),
        (name, _) => errors.required("name", name).and_then(|name| {
            let name = name.trim().to_string();
            if name.is_empty() {
                errors.add("name", "This field may not be blank.");
                None
            } else {
                Some(name)
            }
        }),
    };

    let status = match (input.status, base) {
        (None, Some(hive)) => Some(hive.status),
        (raw, _) => errors.choice::<HiveStatus>("status", raw.as_deref()),
    };

    let species = match (input.species, base) {
        (None, Some(hive)) => Some(hive.species),
        (raw, _) => errors.choice::<BeeSpecies>("species", raw.as_deref()),
    };

    let queen_year = match (input.queen_year, existing) {
        (Some(year), _) => match i32::try_from(year).ok().filter(|y| queen_year_in_range(*y)) {
            Some(year) => Some(year),
            None => {
                errors.add(
                    "queen_year",
                    format!("Ensure this value is between {} and {}.", QUEEN_YEAR_MIN, QUEEN_YEAR_MAX),
                );
                None
            }
        },
        (None, Some(hive)) => Some(hive.queen_year),
        (None, None) => Some(default_queen_year()),
    };

    let beeyard_id = match input.beeyard_id {
        Some(Some(yard)) => Some(yard),
        Some(None) => {
            errors.add("beeyard_id", "This field may not be null.");
            None
        }
        None => match existing.and_then(|hive| hive.beeyard_id) {
            Some(yard) => Some(yard),
            None => {
                errors.add("beeyard_id", "This field is required.");
                None
            }
        },
    };

    errors.finish()?;
    match (name, status, species, queen_year, beeyard_id) {
        (Some(name), Some(status), Some(species), Some(queen_year), Some(beeyard_id)) => Ok(HiveDraft {
            name,
            status,
            species,
            beeyard_id: Some(beeyard_id),
            queen_year,
        }),
        _ => Err(ApiError::validation_error("Invalid input", None)),
    }
}

/// A hive may only be placed in one of the caller's own yards.
async fn check_yard(store: &dyn ApiaryStore, user_id: UserId, beeyard_id: Option<i64>) -> Result<(), ApiError> {
    let Some(beeyard_id) = beeyard_id else {
        return Err(ApiError::field_error("beeyard_id", "This field is required."));
    };
    match store.owner_of(Owned::BeeYard(beeyard_id)).await? {
        Ownership::Owner(owner) if owner == user_id => Ok(()),
        _ => Err(ApiError::invalid_reference(
            "beeyard_id",
            format!("Invalid pk \"{}\" - object does not exist.", beeyard_id),
        )),
    }
}

pub async fn list(
    store: &dyn ApiaryStore,
    identity: &Identity,
    query: &HashMap<String, String>,
) -> Result<Vec<Hive>, ApiError> {
    identity.require()?;
    let filters = FilterSet::from_query(Resource::Hive, query)?;
    Ok(store.list_hives(identity.scope(), &filters, None).await?.rows)
}

pub async fn get(store: &dyn ApiaryStore, identity: &Identity, id: i64) -> Result<Hive, ApiError> {
    let target = Owned::Hive(id);
    owned(store, identity, target).await?;
    store.hive(id).await?.ok_or_else(|| not_found(target))
}

pub async fn create(store: &dyn ApiaryStore, identity: &Identity, input: HiveInput) -> Result<Hive, ApiError> {
    let user_id = identity.require()?;
    let draft = draft(input, None, false)?;
    check_yard(store, user_id, draft.beeyard_id).await?;

    let hive = store.insert_hive(draft).await?;
    tracing::info!(user_id, hive_id = hive.id, "hive created");
    Ok(hive)
}

pub async fn update(
    store: &dyn ApiaryStore,
    identity: &Identity,
    id: i64,
    input: HiveInput,
    partial: bool,
) -> Result<Hive, ApiError> {
    let target = Owned::Hive(id);
    let user_id = owned(store, identity, target).await?;
    let existing = store.hive(id).await?.ok_or_else(|| not_found(target))?;

    let draft = draft(input, Some(&existing), partial)?;
    if draft.beeyard_id != existing.beeyard_id {
        check_yard(store, user_id, draft.beeyard_id).await?;
    }
    store.update_hive(id, draft).await?.ok_or_else(|| not_found(target))
}

/// Cascades to the hive's interventions and contaminations.
pub async fn delete(store: &dyn ApiaryStore, identity: &Identity, id: i64) -> Result<(), ApiError> {
    let target = Owned::Hive(id);
    let user_id = owned(store, identity, target).await?;
    if !store.delete_hive(id).await? {
        return Err(not_found(target));
    }
    tracing::info!(user_id, hive_id = id, "hive deleted");
    Ok(())
}
