//! Intervention writes and the detail-kind rules they obey.
//!
//! | intervention type        | detail                                   |
//! |--------------------------|------------------------------------------|
//! | harvest                  | harvest (nested or referenced)           |
//! | syrup_distribution       | syrup distribution (nested or referenced)|
//! | treatment                | treatment (nested or referenced)         |
//! | artificial_swarming      | child hive (referenced)                  |
//! | anything else            | none                                     |

use serde::Deserialize;
use std::collections::HashMap;

use super::{not_found, owned};
use crate::database::models::{
    DetailDraft, DetailKind, DetailRef, Intervention, InterventionDraft, InterventionType,
    ReferenceError, SyrupType, TreatmentType, UserId,
};
use crate::database::store::ApiaryStore;
use crate::error::ApiError;
use crate::filter::{FilterSet, Resource};
use crate::ownership::{Identity, Owned, Ownership};
use crate::validation::FieldErrors;

#[derive(Debug, Default, Deserialize)]
pub struct InterventionInput {
    pub intervention_type: Option<String>,
    #[serde(alias = "hive_affected_id")]
    pub hive_affected: Option<i64>,
    /// Tag of an existing detail record, paired with `object_id`.
    pub content_type: Option<String>,
    pub object_id: Option<i64>,
    /// A detail record created together with the intervention.
    pub detail: Option<DetailInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailInput {
    pub kind: Option<String>,
    pub quantity: Option<f64>,
    pub syrup_type: Option<String>,
    pub treatment_type: Option<String>,
}

pub async fn list(
    store: &dyn ApiaryStore,
    identity: &Identity,
    query: &HashMap<String, String>,
) -> Result<Vec<Intervention>, ApiError> {
    identity.require()?;
    let filters = FilterSet::from_query(Resource::Intervention, query)?;
    Ok(store.list_interventions(identity.scope(), &filters, None).await?.rows)
}

pub async fn get(store: &dyn ApiaryStore, identity: &Identity, id: i64) -> Result<Intervention, ApiError> {
    let target = Owned::Intervention(id);
    owned(store, identity, target).await?;
    store.intervention(id).await?.ok_or_else(|| not_found(target))
}

pub async fn create(
    store: &dyn ApiaryStore,
    identity: &Identity,
    input: InterventionInput,
) -> Result<Intervention, ApiError> {
    let user_id = identity.require()?;
    let draft = resolve(store, user_id, input, None).await?;
    let intervention = store.insert_intervention(draft).await?;
    tracing::info!(
        user_id,
        intervention_id = intervention.id,
        intervention_type = %intervention.intervention_type,
        "intervention recorded"
    );
    Ok(intervention)
}

/// Full replacement; the original `date` is kept.
pub async fn replace(
    store: &dyn ApiaryStore,
    identity: &Identity,
    id: i64,
    input: InterventionInput,
) -> Result<Intervention, ApiError> {
    let target = Owned::Intervention(id);
    let user_id = owned(store, identity, target).await?;
    let draft = resolve(store, user_id, input, Some(id)).await?;
    store.replace_intervention(id, draft).await?.ok_or_else(|| not_found(target))
}

pub async fn delete(store: &dyn ApiaryStore, identity: &Identity, id: i64) -> Result<(), ApiError> {
    let target = Owned::Intervention(id);
    owned(store, identity, target).await?;
    if store.delete_intervention(id).await? {
        Ok(())
    } else {
        Err(not_found(target))
    }
}

/// Validate the input into a draft the store can write as is.
///
/// `current` is the intervention being replaced, which may keep its own
/// harvest or syrup row.
async fn resolve(
    store: &dyn ApiaryStore,
    user_id: UserId,
    input: InterventionInput,
    current: Option<i64>,
) -> Result<InterventionDraft, ApiError> {
    let mut errors = FieldErrors::new();
    let intervention_type = errors.choice::<InterventionType>("intervention_type", input.intervention_type.as_deref());
    let hive_affected_id = errors.required("hive_affected", input.hive_affected);
    errors.finish()?;
    let (Some(intervention_type), Some(hive_affected_id)) = (intervention_type, hive_affected_id) else {
        return Err(ApiError::validation_error("Invalid input", None));
    };

    if !owns_hive(store, user_id, hive_affected_id).await? {
        return Err(ReferenceError::invalid(
            "hive_affected",
            format!("Invalid pk \"{}\" - object does not exist.", hive_affected_id),
        )
        .into());
    }

    let explicit = explicit_reference(input.content_type.as_deref(), input.object_id)?;
    let detail = match (intervention_type.detail_kind(), explicit, input.detail) {
        (_, Some(_), Some(_)) => {
            return Err(ApiError::field_error(
                "detail",
                "Give either a nested detail or content_type and object_id, not both.",
            ))
        }
        (None, None, None) => DetailDraft::None,
        (None, _, _) => {
            return Err(ReferenceError::invalid(
                "content_type",
                format!("\"{}\" interventions carry no detail record.", intervention_type),
            )
            .into())
        }
        (Some(expected), None, None) => {
            return Err(ReferenceError::invalid(
                "content_type",
                format!("\"{}\" interventions require a {} detail.", intervention_type, expected),
            )
            .into())
        }
        (Some(expected), Some(reference), None) => {
            check_reference(store, user_id, expected, reference, hive_affected_id, current).await?;
            DetailDraft::Existing(reference)
        }
        (Some(expected), None, Some(nested)) => nested_detail(expected, nested)?,
    };

    Ok(InterventionDraft {
        intervention_type,
        hive_affected_id,
        detail,
    })
}

async fn owns_hive(store: &dyn ApiaryStore, user_id: UserId, hive_id: i64) -> Result<bool, ApiError> {
    Ok(matches!(
        store.owner_of(Owned::Hive(hive_id)).await?,
        Ownership::Owner(owner) if owner == user_id
    ))
}

fn explicit_reference(tag: Option<&str>, object_id: Option<i64>) -> Result<Option<DetailRef>, ReferenceError> {
    match (tag, object_id) {
        (None, None) => Ok(None),
        (Some(tag), Some(id)) => {
            let kind = tag
                .parse::<DetailKind>()
                .map_err(|e| ReferenceError::invalid("content_type", e.to_string()))?;
            if id <= 0 {
                return Err(ReferenceError::invalid("object_id", "Ensure this value is greater than 0."));
            }
            Ok(Some(DetailRef::new(kind, id)))
        }
        (Some(_), None) => Err(ReferenceError::invalid("object_id", "Required together with content_type.")),
        (None, Some(_)) => Err(ReferenceError::invalid("content_type", "Required together with object_id.")),
    }
}

async fn check_reference(
    store: &dyn ApiaryStore,
    user_id: UserId,
    expected: DetailKind,
    reference: DetailRef,
    hive_affected_id: i64,
    current: Option<i64>,
) -> Result<(), ApiError> {
    if reference.kind() != expected {
        return Err(ReferenceError::invalid(
            "content_type",
            format!("Expected a {} detail, got {}.", expected, reference.kind()),
        )
        .into());
    }

    let exists = match reference {
        DetailRef::Harvest(id) => store.harvest(id).await?.is_some(),
        DetailRef::SyrupDistribution(id) => store.syrup_distribution(id).await?.is_some(),
        DetailRef::Treatment(id) => store.treatment(id).await?.is_some(),
        DetailRef::Hive(id) => {
            if id == hive_affected_id {
                return Err(ReferenceError::invalid(
                    "object_id",
                    "A swarmed hive must differ from the affected hive.",
                )
                .into());
            }
            owns_hive(store, user_id, id).await?
        }
    };
    if !exists {
        return Err(ReferenceError::invalid(
            "object_id",
            format!("{} {} does not exist.", reference.kind(), reference.id()),
        )
        .into());
    }

    if reference.is_owned_payload() && store.detail_in_use(reference, current).await? {
        return Err(ReferenceError::invalid(
            "object_id",
            format!("{} {} is already recorded by another intervention.", reference.kind(), reference.id()),
        )
        .into());
    }
    Ok(())
}

fn nested_detail(expected: DetailKind, input: DetailInput) -> Result<DetailDraft, ApiError> {
    let mut errors = FieldErrors::new();
    if let Some(kind) = input.kind.as_deref() {
        match kind.parse::<DetailKind>() {
            Ok(kind) if kind == expected => {}
            Ok(kind) => errors.add("detail.kind", format!("Expected a {} detail, got {}.", expected, kind)),
            Err(e) => errors.add("detail.kind", e.to_string()),
        }
    }

    let draft = match expected {
        DetailKind::Harvest => quantity(&mut errors, input.quantity).map(|quantity| DetailDraft::Harvest { quantity }),
        DetailKind::SyrupDistribution => {
            let syrup_type = errors.choice::<SyrupType>("detail.syrup_type", input.syrup_type.as_deref());
            let quantity = quantity(&mut errors, input.quantity);
            syrup_type
                .zip(quantity)
                .map(|(syrup_type, quantity)| DetailDraft::SyrupDistribution { syrup_type, quantity })
        }
        DetailKind::Treatment => errors
            .choice::<TreatmentType>("detail.treatment_type", input.treatment_type.as_deref())
            .map(DetailDraft::Treatment),
        DetailKind::Hive => {
            return Err(ReferenceError::invalid(
                "detail",
                "A swarmed hive is referenced with content_type \"hive\" and its object_id.",
            )
            .into())
        }
    };

    errors.finish()?;
    draft.ok_or_else(|| ApiError::validation_error("Invalid input", None))
}

fn quantity(errors: &mut FieldErrors, value: Option<f64>) -> Option<f64> {
    let value = errors.required("detail.quantity", value)?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        errors.add("detail.quantity", "Ensure this value is greater than or equal to 0.");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{BeeSpecies, BeeYardDraft, HiveDraft, HiveStatus, NewUser};
    use crate::database::MemoryStore;
    use serde_json::json;

    struct Fixture {
        store: MemoryStore,
        ann: Identity,
        hive: i64,
        other_hive: i64,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let user = store
            .insert_user(NewUser {
                username: "ann".into(),
                password_hash: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
            })
            .await
            .unwrap();
        let yard = store
            .insert_beeyard(BeeYardDraft { name: "Yard".into(), beekeeper_id: Some(user.id) })
            .await
            .unwrap();
        let mut hives = Vec::new();
        for name in ["H1", "H2"] {
            let hive = store
                .insert_hive(HiveDraft {
                    name: name.into(),
                    status: HiveStatus::Active,
                    species: BeeSpecies::BuckfastBee,
                    beeyard_id: Some(yard.id),
                    queen_year: 2022,
                })
                .await
                .unwrap();
            hives.push(hive.id);
        }
        Fixture {
            store,
            ann: Identity::Beekeeper { id: user.id, username: user.username },
            hive: hives[0],
            other_hive: hives[1],
        }
    }

    fn input(value: serde_json::Value) -> InterventionInput {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn nested_syrup_distribution_is_created() {
        let f = fixture().await;
        let row = create(
            &f.store,
            &f.ann,
            input(json!({
                "intervention_type": "syrup_distribution",
                "hive_affected": f.hive,
                "detail": {"kind": "syrup_distribution", "syrup_type": "nectar", "quantity": 0.5}
            })),
        )
        .await
        .unwrap();
        let Some(DetailRef::SyrupDistribution(id)) = row.detail_ref().unwrap() else {
            panic!("expected a syrup distribution reference");
        };
        let syrup = f.store.syrup_distribution(id).await.unwrap().unwrap();
        assert_eq!(syrup.syrup_type, SyrupType::Nectar);
        assert_eq!(syrup.quantity, 0.5);
    }

    #[tokio::test]
    async fn payload_types_require_a_detail() {
        let f = fixture().await;
        let err = create(
            &f.store,
            &f.ann,
            input(json!({"intervention_type": "harvest", "hive_affected": f.hive})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_REFERENCE");
    }

    #[tokio::test]
    async fn payload_less_types_refuse_a_detail() {
        let f = fixture().await;
        let err = create(
            &f.store,
            &f.ann,
            input(json!({
                "intervention_type": "health_check",
                "hive_affected": f.hive,
                "detail": {"quantity": 1.0}
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_REFERENCE");
    }

    #[tokio::test]
    async fn kind_must_match_the_type() {
        let f = fixture().await;
        let treatment = f.store.ensure_treatment(TreatmentType::Apivar).await.unwrap();
        let err = create(
            &f.store,
            &f.ann,
            input(json!({
                "intervention_type": "harvest",
                "hive_affected": f.hive,
                "content_type": "treatment",
                "object_id": treatment.id
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_json()["field_errors"]["content_type"], "Expected a harvest detail, got treatment.");
    }

    #[tokio::test]
    async fn missing_detail_row_is_rejected() {
        let f = fixture().await;
        let err = create(
            &f.store,
            &f.ann,
            input(json!({
                "intervention_type": "harvest",
                "hive_affected": f.hive,
                "content_type": "harvest",
                "object_id": 999
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_REFERENCE");
        assert!(err.message().contains("999"));
    }

    #[tokio::test]
    async fn harvest_rows_are_not_shared() {
        let f = fixture().await;
        let first = create(
            &f.store,
            &f.ann,
            input(json!({
                "intervention_type": "harvest",
                "hive_affected": f.hive,
                "detail": {"quantity": 2.0}
            })),
        )
        .await
        .unwrap();
        let err = create(
            &f.store,
            &f.ann,
            input(json!({
                "intervention_type": "harvest",
                "hive_affected": f.other_hive,
                "content_type": "harvest",
                "object_id": first.object_id
            })),
        )
        .await
        .unwrap_err();
        assert!(err.message().contains("already recorded"));

        // The owner may keep its own harvest on replacement.
        let replaced = replace(
            &f.store,
            &f.ann,
            first.id,
            input(json!({
                "intervention_type": "harvest",
                "hive_affected": f.hive,
                "content_type": "harvest",
                "object_id": first.object_id
            })),
        )
        .await
        .unwrap();
        assert_eq!(replaced.object_id, first.object_id);
        assert_eq!(replaced.date, first.date);
    }

    #[tokio::test]
    async fn swarming_child_must_be_another_owned_hive() {
        let f = fixture().await;
        let same = create(
            &f.store,
            &f.ann,
            input(json!({
                "intervention_type": "artificial_swarming",
                "hive_affected": f.hive,
                "content_type": "hive",
                "object_id": f.hive
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(same.error_code(), "INVALID_REFERENCE");

        let ok = create(
            &f.store,
            &f.ann,
            input(json!({
                "intervention_type": "artificial_swarming",
                "hive_affected": f.hive,
                "content_type": "hive",
                "object_id": f.other_hive
            })),
        )
        .await
        .unwrap();
        assert_eq!(ok.detail_ref().unwrap(), Some(DetailRef::Hive(f.other_hive)));
    }

    #[tokio::test]
    async fn nested_and_explicit_are_exclusive() {
        let f = fixture().await;
        let err = create(
            &f.store,
            &f.ann,
            input(json!({
                "intervention_type": "treatment",
                "hive_affected": f.hive,
                "content_type": "treatment",
                "object_id": 1,
                "detail": {"treatment_type": "apivar"}
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
