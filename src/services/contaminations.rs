use serde::Deserialize;
use std::collections::HashMap;

use super::{not_found, owned};
use crate::database::models::{Contamination, ContaminationDraft, ContaminationType, UserId};
use crate::database::store::ApiaryStore;
use crate::error::ApiError;
use crate::filter::{FilterSet, Resource};
use crate::ownership::{Identity, Owned, Ownership};
use crate::validation::FieldErrors;

#[derive(Debug, Default, Deserialize)]
pub struct ContaminationInput {
    #[serde(rename = "type")]
    pub contamination_type: Option<String>,
    #[serde(alias = "hive_id")]
    pub hive: Option<i64>,
}

async fn draft(
    store: &dyn ApiaryStore,
    user_id: UserId,
    input: ContaminationInput,
    existing: Option<&Contamination>,
) -> Result<ContaminationDraft, ApiError> {
    let mut errors = FieldErrors::new();
    let contamination_type = match (input.contamination_type, existing) {
        (None, Some(row)) => Some(row.contamination_type),
        (raw, _) => errors.choice::<ContaminationType>("type", raw.as_deref()),
    };
    let hive_id = match (input.hive, existing) {
        (None, Some(row)) => Some(row.hive_id),
        (hive, _) => errors.required("hive", hive),
    };
    errors.finish()?;
    let (Some(contamination_type), Some(hive_id)) = (contamination_type, hive_id) else {
        return Err(ApiError::validation_error("Invalid input", None));
    };

    if existing.map(|row| row.hive_id) != Some(hive_id) {
        match store.owner_of(Owned::Hive(hive_id)).await? {
            Ownership::Owner(owner) if owner == user_id => {}
            _ => {
                return Err(ApiError::invalid_reference(
                    "hive",
                    format!("Invalid pk \"{}\" - object does not exist.", hive_id),
                ))
            }
        }
    }

    Ok(ContaminationDraft {
        contamination_type,
        hive_id,
    })
}

pub async fn list(
    store: &dyn ApiaryStore,
    identity: &Identity,
    query: &HashMap<String, String>,
) -> Result<Vec<Contamination>, ApiError> {
    identity.require()?;
    let filters = FilterSet::from_query(Resource::Contamination, query)?;
    Ok(store.list_contaminations(identity.scope(), &filters, None).await?.rows)
}

pub async fn get(store: &dyn ApiaryStore, identity: &Identity, id: i64) -> Result<Contamination, ApiError> {
    let target = Owned::Contamination(id);
    owned(store, identity, target).await?;
    store.contamination(id).await?.ok_or_else(|| not_found(target))
}

pub async fn create(
    store: &dyn ApiaryStore,
    identity: &Identity,
    input: ContaminationInput,
) -> Result<Contamination, ApiError> {
    let user_id = identity.require()?;
    let draft = draft(store, user_id, input, None).await?;
    let row = store.insert_contamination(draft).await?;
    tracing::info!(user_id, contamination_id = row.id, hive_id = row.hive_id, "contamination reported");
    Ok(row)
}

/// PUT requires every field; PATCH keeps what is not given. `date` is refreshed.
pub async fn update(
    store: &dyn ApiaryStore,
    identity: &Identity,
    id: i64,
    input: ContaminationInput,
    partial: bool,
) -> Result<Contamination, ApiError> {
    let target = Owned::Contamination(id);
    let user_id = owned(store, identity, target).await?;
    let existing = store.contamination(id).await?.ok_or_else(|| not_found(target))?;

    let draft = draft(store, user_id, input, partial.then_some(&existing)).await?;
    store.update_contamination(id, draft).await?.ok_or_else(|| not_found(target))
}

pub async fn delete(store: &dyn ApiaryStore, identity: &Identity, id: i64) -> Result<(), ApiError> {
    let target = Owned::Contamination(id);
    owned(store, identity, target).await?;
    if store.delete_contamination(id).await? {
        Ok(())
    } else {
        Err(not_found(target))
    }
}
