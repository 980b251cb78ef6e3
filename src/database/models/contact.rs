use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user::UserId;

/// Opt-in record allowing a beekeeper's contact details on the public surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PublicContact {
    pub id: i64,
    #[sqlx(rename = "public_beekeeper_info_id")]
    pub user_id: UserId,
}

/// A published contact joined with the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContactEntry {
    pub id: i64,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}
