//! JSON views of the private API.
//!
//! Intervention payloads are resolved by dispatching on the stored
//! [`DetailRef`]; a reference whose row has vanished renders as `null`.

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{json, Value};

use crate::database::models::{
    BeeYard, Contamination, ContaminationType, DetailRef, Hive, Intervention, InterventionType,
    ReferenceError, UserId,
};
use crate::database::store::ApiaryStore;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeeYardView {
    pub id: i64,
    pub name: String,
    pub beekeeper: Option<UserId>,
    pub hives: Vec<i64>,
    pub hives_detailed: Vec<Hive>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterventionView {
    pub id: i64,
    pub intervention_type: InterventionType,
    pub date: DateTime<Utc>,
    pub hive_affected: i64,
    pub content_type: Option<String>,
    pub object_id: Option<i64>,
    pub content_object: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContaminationView {
    pub id: i64,
    #[serde(rename = "type")]
    pub contamination_type: ContaminationType,
    pub date: NaiveDate,
    pub hive: i64,
}

impl From<Contamination> for ContaminationView {
    fn from(row: Contamination) -> Self {
        ContaminationView {
            id: row.id,
            contamination_type: row.contamination_type,
            date: row.date,
            hive: row.hive_id,
        }
    }
}

pub async fn beeyard(store: &dyn ApiaryStore, yard: BeeYard) -> Result<BeeYardView, ApiError> {
    let hives = store.hives_in_yard(yard.id).await?;
    Ok(BeeYardView {
        id: yard.id,
        name: yard.name,
        beekeeper: yard.beekeeper_id,
        hives: hives.iter().map(|h| h.id).collect(),
        hives_detailed: hives,
    })
}

pub async fn beeyards(store: &dyn ApiaryStore, yards: Vec<BeeYard>) -> Result<Vec<BeeYardView>, ApiError> {
    try_join_all(yards.into_iter().map(|yard| beeyard(store, yard))).await
}

/// The rendered detail record of an intervention.
///
/// A stored tag outside the permitted set is a server-side fault; a missing
/// row is tolerated.
pub async fn content_object(store: &dyn ApiaryStore, intervention: &Intervention) -> Result<Option<Value>, ApiError> {
    let Some(detail) = intervention.detail_ref()? else {
        return Ok(None);
    };

    let rendered = match detail {
        DetailRef::Harvest(id) => store
            .harvest(id)
            .await?
            .map(|h| json!({ "quantity": h.quantity })),
        DetailRef::SyrupDistribution(id) => store
            .syrup_distribution(id)
            .await?
            .map(|s| json!({ "quantity": s.quantity, "syrup_type": s.syrup_type })),
        DetailRef::Treatment(id) => store
            .treatment(id)
            .await?
            .map(|t| json!({ "treatment_type": t.treatment_type })),
        DetailRef::Hive(id) => match store.hive(id).await? {
            Some(hive) => Some(serde_json::to_value(hive).map_err(|e| {
                tracing::error!("failed to render hive {}: {}", id, e);
                ApiError::internal_server_error("Failed to serialize response data")
            })?),
            None => None,
        },
    };

    if rendered.is_none() {
        let err = ReferenceError::Dangling {
            kind: detail.kind(),
            id: detail.id(),
        };
        tracing::warn!(intervention_id = intervention.id, "{}", err);
    }
    Ok(rendered)
}

pub async fn intervention(store: &dyn ApiaryStore, row: Intervention) -> Result<InterventionView, ApiError> {
    let content_object = content_object(store, &row).await?;
    Ok(InterventionView {
        id: row.id,
        intervention_type: row.intervention_type,
        date: row.date,
        hive_affected: row.hive_affected_id,
        content_type: row.content_type,
        object_id: row.object_id,
        content_object,
    })
}

pub async fn interventions(store: &dyn ApiaryStore, rows: Vec<Intervention>) -> Result<Vec<InterventionView>, ApiError> {
    try_join_all(rows.into_iter().map(|row| intervention(store, row))).await
}
