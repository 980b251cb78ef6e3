use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user::UserId;

pub const BEEYARD_NAME_MAX: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BeeYard {
    pub id: i64,
    pub name: String,
    pub beekeeper_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BeeYardDraft {
    pub name: String,
    pub beekeeper_id: Option<UserId>,
}

impl BeeYardDraft {
    pub fn into_beeyard(self, id: i64) -> BeeYard {
        BeeYard {
            id,
            name: self.name,
            beekeeper_id: self.beekeeper_id,
        }
    }
}
