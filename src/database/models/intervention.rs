use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::choices::{InterventionType, SyrupType, TreatmentType};
use super::reference::{DetailRef, ReferenceError};

/// A logged action on a hive.
///
/// `content_type` is kept as the raw stored tag so that an unexpected value
/// surfaces from [`Intervention::detail_ref`] rather than failing row decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Intervention {
    pub id: i64,
    pub intervention_type: InterventionType,
    pub date: DateTime<Utc>,
    pub hive_affected_id: i64,
    pub content_type: Option<String>,
    pub object_id: Option<i64>,
}

impl Intervention {
    pub fn detail_ref(&self) -> Result<Option<DetailRef>, ReferenceError> {
        DetailRef::from_columns(self.content_type.as_deref(), self.object_id)
    }

    pub fn set_detail(&mut self, detail: Option<DetailRef>) {
        let (tag, id) = DetailRef::to_columns(detail);
        self.content_type = tag.map(str::to_string);
        self.object_id = id;
    }
}

/// How a write supplies the intervention's detail record.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailDraft {
    None,
    /// Point at a row that already exists.
    Existing(DetailRef),
    /// Create a harvest row alongside the intervention.
    Harvest { quantity: f64 },
    SyrupDistribution { syrup_type: SyrupType, quantity: f64 },
    /// Resolved to the canonical row for this treatment type.
    Treatment(TreatmentType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterventionDraft {
    pub intervention_type: InterventionType,
    pub hive_affected_id: i64,
    pub detail: DetailDraft,
}

impl InterventionDraft {
    pub fn bare(intervention_type: InterventionType, hive_affected_id: i64) -> Self {
        InterventionDraft {
            intervention_type,
            hive_affected_id,
            detail: DetailDraft::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Intervention {
        Intervention {
            id: 1,
            intervention_type: InterventionType::Harvest,
            date: Utc::now(),
            hive_affected_id: 3,
            content_type: None,
            object_id: None,
        }
    }

    #[test]
    fn set_detail_writes_both_columns() {
        let mut row = sample();
        row.set_detail(Some(DetailRef::Harvest(12)));
        assert_eq!(row.content_type.as_deref(), Some("harvest"));
        assert_eq!(row.object_id, Some(12));
        assert_eq!(row.detail_ref(), Ok(Some(DetailRef::Harvest(12))));

        row.set_detail(None);
        assert_eq!((row.content_type, row.object_id), (None, None));
    }

    #[test]
    fn foreign_tag_is_reported_on_read() {
        let mut row = sample();
        row.content_type = Some("beeyard".into());
        row.object_id = Some(1);
        assert!(matches!(row.detail_ref(), Err(ReferenceError::Configuration { .. })));
    }
}
