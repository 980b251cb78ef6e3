use thiserror::Error;

use super::choices::DetailKind;

/// The detail record an intervention points at.
///
/// Stored as a `(content_type, object_id)` pair; both columns are null when the
/// intervention carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailRef {
    Harvest(i64),
    SyrupDistribution(i64),
    Treatment(i64),
    /// Child hive produced by an artificial swarming.
    Hive(i64),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReferenceError {
    /// A stored tag outside the permitted set. Write-time validation keeps
    /// this from happening.
    #[error("stored detail reference ({tag:?}, {id:?}) is not a permitted intervention detail")]
    Configuration { tag: Option<String>, id: Option<i64> },

    /// The referenced row was deleted after the intervention was written.
    #[error("{kind} {id} referenced by an intervention no longer exists")]
    Dangling { kind: DetailKind, id: i64 },

    /// Rejected at write time.
    #[error("{message}")]
    Invalid { field: &'static str, message: String },
}

impl ReferenceError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ReferenceError::Invalid {
            field,
            message: message.into(),
        }
    }
}

impl DetailRef {
    pub fn new(kind: DetailKind, id: i64) -> Self {
        match kind {
            DetailKind::Harvest => DetailRef::Harvest(id),
            DetailKind::SyrupDistribution => DetailRef::SyrupDistribution(id),
            DetailKind::Treatment => DetailRef::Treatment(id),
            DetailKind::Hive => DetailRef::Hive(id),
        }
    }

    pub fn kind(&self) -> DetailKind {
        match self {
            DetailRef::Harvest(_) => DetailKind::Harvest,
            DetailRef::SyrupDistribution(_) => DetailKind::SyrupDistribution,
            DetailRef::Treatment(_) => DetailKind::Treatment,
            DetailRef::Hive(_) => DetailKind::Hive,
        }
    }

    pub fn id(&self) -> i64 {
        match *self {
            DetailRef::Harvest(id)
            | DetailRef::SyrupDistribution(id)
            | DetailRef::Treatment(id)
            | DetailRef::Hive(id) => id,
        }
    }

    /// Decode the stored column pair.
    pub fn from_columns(tag: Option<&str>, id: Option<i64>) -> Result<Option<Self>, ReferenceError> {
        let configuration = || ReferenceError::Configuration {
            tag: tag.map(str::to_string),
            id,
        };
        match (tag, id) {
            (None, None) => Ok(None),
            (Some(tag), Some(id)) if id > 0 => {
                let kind = tag.parse::<DetailKind>().map_err(|_| configuration())?;
                Ok(Some(DetailRef::new(kind, id)))
            }
            _ => Err(configuration()),
        }
    }

    pub fn to_columns(detail: Option<DetailRef>) -> (Option<&'static str>, Option<i64>) {
        match detail {
            Some(d) => (Some(d.kind().as_str()), Some(d.id())),
            None => (None, None),
        }
    }

    /// Harvest and syrup rows belong to a single intervention and go away with it.
    pub fn is_owned_payload(&self) -> bool {
        matches!(self, DetailRef::Harvest(_) | DetailRef::SyrupDistribution(_))
    }
}
