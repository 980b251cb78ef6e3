//! Read-only views for the public surface, with contact redaction.

use futures::future::try_join_all;
use serde::Serialize;

use crate::database::models::{BeeYard, ContactEntry, Hive, UserId};
use crate::database::store::ApiaryStore;
use crate::error::ApiError;

const NOT_AUTHORIZED: &str = "Not Authorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeekeeperDetail {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl BeekeeperDetail {
    /// Shown for keepers who have not published their contact.
    pub fn redacted() -> Self {
        BeekeeperDetail {
            first_name: NOT_AUTHORIZED.to_string(),
            last_name: NOT_AUTHORIZED.to_string(),
            email: NOT_AUTHORIZED.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicHiveView {
    #[serde(flatten)]
    pub hive: Hive,
    pub beekeeper_detail: BeekeeperDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicBeeYardView {
    pub id: i64,
    pub name: String,
    pub beekeeper: Option<UserId>,
    pub hives: Vec<i64>,
    pub hives_detailed: Vec<PublicHiveView>,
    pub beekeeper_detail: BeekeeperDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactView {
    pub id: i64,
    pub public_beekeeper_info: UserId,
    pub public_beekeeper_info_details: BeekeeperDetail,
}

impl From<ContactEntry> for ContactView {
    fn from(entry: ContactEntry) -> Self {
        ContactView {
            id: entry.id,
            public_beekeeper_info: entry.user_id,
            public_beekeeper_info_details: BeekeeperDetail {
                first_name: entry.first_name,
                last_name: entry.last_name,
                email: entry.email,
            },
        }
    }
}

/// Real contact data only when the owner has opted in.
pub async fn beekeeper_detail(store: &dyn ApiaryStore, owner: Option<UserId>) -> Result<BeekeeperDetail, ApiError> {
    let Some(owner) = owner else {
        return Ok(BeekeeperDetail::redacted());
    };
    if store.contact_for(owner).await?.is_none() {
        return Ok(BeekeeperDetail::redacted());
    }
    Ok(match store.user(owner).await? {
        Some(user) => BeekeeperDetail {
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        },
        None => BeekeeperDetail::redacted(),
    })
}

pub async fn beeyard(store: &dyn ApiaryStore, yard: BeeYard) -> Result<PublicBeeYardView, ApiError> {
    let detail = beekeeper_detail(store, yard.beekeeper_id).await?;
    let hives = store.hives_in_yard(yard.id).await?;
    Ok(PublicBeeYardView {
        id: yard.id,
        name: yard.name,
        beekeeper: yard.beekeeper_id,
        hives: hives.iter().map(|h| h.id).collect(),
        hives_detailed: hives
            .into_iter()
            .map(|hive| PublicHiveView {
                hive,
                beekeeper_detail: detail.clone(),
            })
            .collect(),
        beekeeper_detail: detail,
    })
}

pub async fn beeyards(store: &dyn ApiaryStore, yards: Vec<BeeYard>) -> Result<Vec<PublicBeeYardView>, ApiError> {
    try_join_all(yards.into_iter().map(|yard| beeyard(store, yard))).await
}

pub async fn hive(store: &dyn ApiaryStore, hive: Hive) -> Result<PublicHiveView, ApiError> {
    let owner = match hive.beeyard_id {
        Some(yard_id) => store.beeyard(yard_id).await?.and_then(|yard| yard.beekeeper_id),
        None => None,
    };
    Ok(PublicHiveView {
        beekeeper_detail: beekeeper_detail(store, owner).await?,
        hive,
    })
}

pub async fn hives(store: &dyn ApiaryStore, hives: Vec<Hive>) -> Result<Vec<PublicHiveView>, ApiError> {
    try_join_all(hives.into_iter().map(|row| hive(store, row))).await
}
