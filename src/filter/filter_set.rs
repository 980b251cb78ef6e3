use std::collections::HashMap;

use super::error::FilterError;
use super::types::{Condition, FieldDef, FieldKind, FieldSource, Lookup};
use crate::database::models::{Harvest, SyrupDistribution, Treatment};

/// The listings that accept query string filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    BeeYard,
    Hive,
    Intervention,
    Contamination,
    PublicBeeYard,
    PublicHive,
    Contact,
}

// SQL aliases: b = beeyards, h = hives, i = interventions, c = contaminations,
// u = users, pc = public_contacts.
const BEEYARD_FIELDS: &[FieldDef] = &[FieldDef::text("name", "b.name")];

const HIVE_FIELDS: &[FieldDef] = &[
    FieldDef::text("name", "h.name"),
    FieldDef::text("status", "h.status"),
    FieldDef::text("species", "h.species"),
    FieldDef::text("beeyard__name", "b.name"),
    FieldDef::range("date_updated", "h.date_updated", FieldKind::Date),
    FieldDef::range("queen_year", "h.queen_year", FieldKind::Integer),
    FieldDef::id("beeyard__id", "h.beeyard_id"),
];

const INTERVENTION_FIELDS: &[FieldDef] = &[
    FieldDef::text("intervention_type", "i.intervention_type"),
    FieldDef::range("date", "(i.date AT TIME ZONE 'UTC')::date", FieldKind::Date),
    FieldDef::id("hive_affected__id", "i.hive_affected_id"),
    FieldDef::id("hive_affected__beeyard_id", "h.beeyard_id"),
    FieldDef::id("object_id", "i.object_id"),
];

const CONTAMINATION_FIELDS: &[FieldDef] = &[
    FieldDef::text("type", "c.type"),
    FieldDef::range("date", "c.date", FieldKind::Date),
];

const CONTACT_FIELDS: &[FieldDef] = &[
    FieldDef::search("first_name", "u.first_name"),
    FieldDef::search("last_name", "u.last_name"),
];

impl Resource {
    pub fn fields(&self) -> &'static [FieldDef] {
        match self {
            Resource::BeeYard | Resource::PublicBeeYard => BEEYARD_FIELDS,
            Resource::Hive | Resource::PublicHive => HIVE_FIELDS,
            Resource::Intervention => INTERVENTION_FIELDS,
            Resource::Contamination => CONTAMINATION_FIELDS,
            Resource::Contact => CONTACT_FIELDS,
        }
    }

    /// Parameter naming the owner of a public listing row.
    fn keeper_param(&self) -> Option<&'static str> {
        match self {
            Resource::PublicBeeYard => Some("beekeeper"),
            Resource::PublicHive => Some("beeyard__beekeeper"),
            _ => None,
        }
    }
}

/// Filters over an intervention's detail record.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailFilter {
    TreatmentType(String),
    SyrupType(String),
    HarvestLt(f64),
    HarvestGt(f64),
}

/// The resolved detail row an intervention points at, for in-process matching.
#[derive(Debug, Clone, Copy)]
pub enum DetailSubject<'a> {
    Harvest(&'a Harvest),
    SyrupDistribution(&'a SyrupDistribution),
    Treatment(&'a Treatment),
    Other,
}

impl DetailFilter {
    fn parse(param: &str, raw: &str) -> Result<Option<DetailFilter>, FilterError> {
        let quantity = || {
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|q| q.is_finite())
                .ok_or_else(|| FilterError::invalid_value(param, "Enter a number."))
        };
        Ok(Some(match param {
            "treatment_type" => DetailFilter::TreatmentType(raw.to_string()),
            "syrup_type" => DetailFilter::SyrupType(raw.to_string()),
            "harvest_lt" => DetailFilter::HarvestLt(quantity()?),
            "harvest_gt" => DetailFilter::HarvestGt(quantity()?),
            _ => return Ok(None),
        }))
    }

    pub fn admits(&self, subject: DetailSubject<'_>) -> bool {
        match (self, subject) {
            (DetailFilter::TreatmentType(needle), DetailSubject::Treatment(t)) => {
                icontains(t.treatment_type.as_str(), needle)
            }
            (DetailFilter::SyrupType(needle), DetailSubject::SyrupDistribution(s)) => {
                icontains(s.syrup_type.as_str(), needle)
            }
            (DetailFilter::HarvestLt(limit), DetailSubject::Harvest(h)) => h.quantity < *limit,
            (DetailFilter::HarvestGt(limit), DetailSubject::Harvest(h)) => h.quantity > *limit,
            _ => false,
        }
    }
}

/// Public owner-name search. Only owners with a published contact match.
#[derive(Debug, Clone, PartialEq)]
pub enum KeeperName {
    /// One word, matched against first or last name.
    Either(String),
    /// First word against the first name, second against the last name.
    Split { first: String, last: String },
}

impl KeeperName {
    fn parse(raw: &str) -> Option<KeeperName> {
        let mut words = raw.split_whitespace();
        let first = words.next()?;
        Some(match words.next() {
            Some(last) => KeeperName::Split {
                first: first.to_string(),
                last: last.to_string(),
            },
            None => KeeperName::Either(first.to_string()),
        })
    }

    /// Patterns for the first and last name comparisons.
    pub fn needles(&self) -> (&str, &str) {
        match self {
            KeeperName::Either(word) => (word, word),
            KeeperName::Split { first, last } => (first, last),
        }
    }

    pub fn admits(&self, first_name: &str, last_name: &str) -> bool {
        let (first, last) = self.needles();
        icontains(first_name, first) || icontains(last_name, last)
    }
}

fn icontains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Validated filters for one listing request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub conditions: Vec<Condition>,
    pub details: Vec<DetailFilter>,
    pub keeper_name: Option<KeeperName>,
}

impl FilterSet {
    pub fn none() -> Self {
        FilterSet::default()
    }

    /// Build from query parameters. Unknown parameters and empty values are ignored.
    pub fn from_query(resource: Resource, params: &HashMap<String, String>) -> Result<Self, FilterError> {
        let mut set = FilterSet::default();

        // Sorted so that conditions and error reporting are deterministic.
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();

        for param in keys {
            let raw = &params[param];
            if raw.trim().is_empty() {
                continue;
            }

            if resource.keeper_param() == Some(param.as_str()) {
                set.keeper_name = KeeperName::parse(raw);
                continue;
            }

            if resource == Resource::Intervention {
                if let Some(detail) = DetailFilter::parse(param, raw)? {
                    set.details.push(detail);
                    continue;
                }
            }

            let Some((def, lookup)) = resolve(resource.fields(), param)? else {
                continue;
            };
            let value = def.parse_value(param, raw)?;
            set.conditions.push(Condition {
                field: def.name,
                column: def.column,
                lookup,
                value,
            });
        }

        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.details.is_empty() && self.keeper_name.is_none()
    }

    /// Plain field conditions only; detail and owner filters need store context.
    pub fn matches(&self, source: &dyn FieldSource) -> bool {
        self.conditions.iter().all(|c| c.matches(source))
    }
}

/// Split `field__lookup` against the field table. The field name may itself
/// contain `__` (`beeyard__name`), so the full parameter is tried first.
fn resolve(
    fields: &'static [FieldDef],
    param: &str,
) -> Result<Option<(&'static FieldDef, Lookup)>, FilterError> {
    if let Some(def) = fields.iter().find(|d| d.name == param) {
        return Ok(Some((def, def.default)));
    }
    let Some((name, suffix)) = param.rsplit_once("__") else {
        return Ok(None);
    };
    let Some(def) = fields.iter().find(|d| d.name == name) else {
        return Ok(None);
    };
    match Lookup::parse(suffix) {
        Some(lookup) if def.lookups.contains(&lookup) => Ok(Some((def, lookup))),
        _ => Err(FilterError::UnsupportedLookup {
            param: param.to_string(),
            field: def.name.to_string(),
            lookup: suffix.to_string(),
        }),
    }
}
