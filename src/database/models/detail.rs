use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::choices::{SyrupType, TreatmentType};

/// Honey harvest, in kilograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Harvest {
    pub id: i64,
    pub quantity: f64,
}

/// Syrup feeding, in liters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SyrupDistribution {
    pub id: i64,
    pub syrup_type: SyrupType,
    pub quantity: f64,
}

/// One row per treatment type, shared by every treatment intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Treatment {
    pub id: i64,
    pub treatment_type: TreatmentType,
}
