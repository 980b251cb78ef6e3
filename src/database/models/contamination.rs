use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::choices::ContaminationType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Contamination {
    pub id: i64,
    #[sqlx(rename = "type")]
    pub contamination_type: ContaminationType,
    pub date: NaiveDate,
    pub hive_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContaminationDraft {
    pub contamination_type: ContaminationType,
    pub hive_id: i64,
}

impl ContaminationDraft {
    pub fn into_contamination(self, id: i64, date: NaiveDate) -> Contamination {
        Contamination {
            id,
            contamination_type: self.contamination_type,
            date,
            hive_id: self.hive_id,
        }
    }
}
