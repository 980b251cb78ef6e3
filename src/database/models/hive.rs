use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::choices::{BeeSpecies, HiveStatus};

pub const QUEEN_YEAR_MIN: i32 = 2000;
pub const QUEEN_YEAR_MAX: i32 = 2040;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Hive {
    pub id: i64,
    pub name: String,
    pub status: HiveStatus,
    pub species: BeeSpecies,
    pub date_updated: NaiveDate,
    pub beeyard_id: Option<i64>,
    pub queen_year: i32,
}

/// Writable hive fields. `date_updated` is stamped by the store on every write.
#[derive(Debug, Clone, PartialEq)]
pub struct HiveDraft {
    pub name: String,
    pub status: HiveStatus,
    pub species: BeeSpecies,
    pub beeyard_id: Option<i64>,
    pub queen_year: i32,
}

impl HiveDraft {
    pub fn into_hive(self, id: i64, date_updated: NaiveDate) -> Hive {
        Hive {
            id,
            name: self.name,
            status: self.status,
            species: self.species,
            date_updated,
            beeyard_id: self.beeyard_id,
            queen_year: self.queen_year,
        }
    }
}

impl From<&Hive> for HiveDraft {
    fn from(hive: &Hive) -> Self {
        HiveDraft {
            name: hive.name.clone(),
            status: hive.status,
            species: hive.species,
            beeyard_id: hive.beeyard_id,
            queen_year: hive.queen_year,
        }
    }
}

/// Current year, kept inside the accepted queen year range.
pub fn default_queen_year() -> i32 {
    Utc::now().year().clamp(QUEEN_YEAR_MIN, QUEEN_YEAR_MAX)
}

pub fn queen_year_in_range(year: i32) -> bool {
    (QUEEN_YEAR_MIN..=QUEEN_YEAR_MAX).contains(&year)
}
