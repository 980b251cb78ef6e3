use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::manager::DatabaseError;
use super::models::{
    BeeYard, BeeYardDraft, ContactEntry, Contamination, ContaminationDraft, DetailDraft, DetailRef,
    Harvest, Hive, HiveDraft, Intervention, InterventionDraft, NewUser, PublicContact,
    SyrupDistribution, Treatment, TreatmentType, User, UserId,
};
use super::store::{ApiaryStore, DbResult, Listing, Window};
use crate::filter::{DetailSubject, FieldSource, FilterSet, FilterValue};
use crate::ownership::{Owned, Ownership, Scope};

/// In-process store with the same semantics as the Postgres one.
///
/// Every operation runs under a single lock and validates before it mutates,
/// which gives multi-row writes the same all-or-nothing behavior.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    beeyards: BTreeMap<i64, BeeYard>,
    hives: BTreeMap<i64, Hive>,
    interventions: BTreeMap<i64, Intervention>,
    harvests: BTreeMap<i64, Harvest>,
    syrups: BTreeMap<i64, SyrupDistribution>,
    treatments: BTreeMap<i64, Treatment>,
    contaminations: BTreeMap<i64, Contamination>,
    contacts: BTreeMap<i64, PublicContact>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> DbResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| DatabaseError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn integrity(message: impl Into<String>) -> DatabaseError {
    DatabaseError::Integrity(message.into())
}

fn page<T>(rows: Vec<T>, window: Option<Window>) -> Listing<T> {
    let total = rows.len() as i64;
    let rows = match window {
        Some(w) => rows
            .into_iter()
            .skip(w.offset.max(0) as usize)
            .take(w.limit.max(0) as usize)
            .collect(),
        None => rows,
    };
    Listing { rows, total }
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn yard_owner(&self, beeyard_id: Option<i64>) -> Option<UserId> {
        beeyard_id
            .and_then(|id| self.beeyards.get(&id))
            .and_then(|yard| yard.beekeeper_id)
    }

    fn hive_owner(&self, hive_id: i64) -> Option<UserId> {
        self.hives.get(&hive_id).and_then(|h| self.yard_owner(h.beeyard_id))
    }

    fn ownership(found: bool, owner: Option<UserId>) -> Ownership {
        match (found, owner) {
            (false, _) => Ownership::Missing,
            (true, None) => Ownership::Unowned,
            (true, Some(owner)) => Ownership::Owner(owner),
        }
    }

    fn detail_exists(&self, detail: DetailRef) -> bool {
        match detail {
            DetailRef::Harvest(id) => self.harvests.contains_key(&id),
            DetailRef::SyrupDistribution(id) => self.syrups.contains_key(&id),
            DetailRef::Treatment(id) => self.treatments.contains_key(&id),
            DetailRef::Hive(id) => self.hives.contains_key(&id),
        }
    }

    fn subject(&self, intervention: &Intervention) -> DetailSubject<'_> {
        match intervention.detail_ref() {
            Ok(Some(DetailRef::Harvest(id))) => {
                self.harvests.get(&id).map_or(DetailSubject::Other, DetailSubject::Harvest)
            }
            Ok(Some(DetailRef::SyrupDistribution(id))) => self
                .syrups
                .get(&id)
                .map_or(DetailSubject::Other, DetailSubject::SyrupDistribution),
            Ok(Some(DetailRef::Treatment(id))) => self
                .treatments
                .get(&id)
                .map_or(DetailSubject::Other, DetailSubject::Treatment),
            _ => DetailSubject::Other,
        }
    }

    fn keeper_matches(&self, filters: &FilterSet, owner: Option<UserId>) -> bool {
        let Some(name) = &filters.keeper_name else {
            return true;
        };
        let Some(owner) = owner else {
            return false;
        };
        let published = self.contacts.values().any(|c| c.user_id == owner);
        published
            && self
                .users
                .get(&owner)
                .is_some_and(|u| name.admits(&u.first_name, &u.last_name))
    }

    fn ensure_treatment(&mut self, treatment_type: TreatmentType) -> Treatment {
        if let Some(existing) = self
            .treatments
            .values()
            .find(|t| t.treatment_type == treatment_type)
        {
            return existing.clone();
        }
        let treatment = Treatment {
            id: self.next_id(),
            treatment_type,
        };
        self.treatments.insert(treatment.id, treatment.clone());
        treatment
    }

    /// Checks that a draft can be written without touching any table.
    fn check_draft(&self, draft: &InterventionDraft) -> DbResult<()> {
        if !self.hives.contains_key(&draft.hive_affected_id) {
            return Err(integrity(format!("hive {} does not exist", draft.hive_affected_id)));
        }
        if let DetailDraft::Existing(detail) = &draft.detail {
            if !self.detail_exists(*detail) {
                return Err(integrity(format!("{} {} no longer exists", detail.kind(), detail.id())));
            }
        }
        if let DetailDraft::Harvest { quantity } | DetailDraft::SyrupDistribution { quantity, .. } = &draft.detail {
            if *quantity < 0.0 {
                return Err(integrity("quantity must not be negative"));
            }
        }
        Ok(())
    }

    fn write_detail(&mut self, detail: &DetailDraft) -> Option<DetailRef> {
        match detail {
            DetailDraft::None => None,
            DetailDraft::Existing(reference) => Some(*reference),
            DetailDraft::Harvest { quantity } => {
                let id = self.next_id();
                self.harvests.insert(id, Harvest { id, quantity: *quantity });
                Some(DetailRef::Harvest(id))
            }
            DetailDraft::SyrupDistribution { syrup_type, quantity } => {
                let id = self.next_id();
                self.syrups.insert(
                    id,
                    SyrupDistribution {
                        id,
                        syrup_type: *syrup_type,
                        quantity: *quantity,
                    },
                );
                Some(DetailRef::SyrupDistribution(id))
            }
            DetailDraft::Treatment(treatment_type) => {
                Some(DetailRef::Treatment(self.ensure_treatment(*treatment_type).id))
            }
        }
    }

    fn insert_intervention(&mut self, draft: &InterventionDraft) -> Intervention {
        let detail = self.write_detail(&draft.detail);
        let mut intervention = Intervention {
            id: self.next_id(),
            intervention_type: draft.intervention_type,
            date: Utc::now(),
            hive_affected_id: draft.hive_affected_id,
            content_type: None,
            object_id: None,
        };
        intervention.set_detail(detail);
        self.interventions.insert(intervention.id, intervention.clone());
        intervention
    }

    fn drop_owned_payload(&mut self, detail: Option<DetailRef>) {
        match detail {
            Some(DetailRef::Harvest(id)) => {
                self.harvests.remove(&id);
            }
            Some(DetailRef::SyrupDistribution(id)) => {
                self.syrups.remove(&id);
            }
            _ => {}
        }
    }
}

struct YardRow<'a>(&'a BeeYard);

impl FieldSource for YardRow<'_> {
    fn field(&self, name: &str) -> Option<FilterValue> {
        match name {
            "name" => Some(FilterValue::Text(self.0.name.clone())),
            _ => None,
        }
    }
}

struct HiveRow<'a> {
    hive: &'a Hive,
    yard: Option<&'a BeeYard>,
}

impl FieldSource for HiveRow<'_> {
    fn field(&self, name: &str) -> Option<FilterValue> {
        let hive = self.hive;
        Some(match name {
            "name" => FilterValue::Text(hive.name.clone()),
            "status" => FilterValue::Text(hive.status.to_string()),
            "species" => FilterValue::Text(hive.species.to_string()),
            "beeyard__name" => FilterValue::Text(self.yard?.name.clone()),
            "date_updated" => FilterValue::Date(hive.date_updated),
            "queen_year" => FilterValue::Integer(hive.queen_year as i64),
            "beeyard__id" => FilterValue::Integer(hive.beeyard_id?),
            _ => return None,
        })
    }
}

struct InterventionRow<'a> {
    intervention: &'a Intervention,
    hive: Option<&'a Hive>,
}

impl FieldSource for InterventionRow<'_> {
    fn field(&self, name: &str) -> Option<FilterValue> {
        let i = self.intervention;
        Some(match name {
            "intervention_type" => FilterValue::Text(i.intervention_type.to_string()),
            "date" => FilterValue::Date(i.date.date_naive()),
            "hive_affected__id" => FilterValue::Integer(i.hive_affected_id),
            "hive_affected__beeyard_id" => FilterValue::Integer(self.hive?.beeyard_id?),
            "object_id" => FilterValue::Integer(i.object_id?),
            _ => return None,
        })
    }
}

struct ContaminationRow<'a>(&'a Contamination);

impl FieldSource for ContaminationRow<'_> {
    fn field(&self, name: &str) -> Option<FilterValue> {
        Some(match name {
            "type" => FilterValue::Text(self.0.contamination_type.to_string()),
            "date" => FilterValue::Date(self.0.date),
            _ => return None,
        })
    }
}

struct ContactRow<'a>(&'a ContactEntry);

impl FieldSource for ContactRow<'_> {
    fn field(&self, name: &str) -> Option<FilterValue> {
        Some(match name {
            "first_name" => FilterValue::Text(self.0.first_name.clone()),
            "last_name" => FilterValue::Text(self.0.last_name.clone()),
            _ => return None,
        })
    }
}

#[async_trait]
impl ApiaryStore for MemoryStore {
    async fn health_check(&self) -> DbResult<()> {
        self.tables().map(|_| ())
    }

    async fn insert_user(&self, user: NewUser) -> DbResult<User> {
        let mut t = self.tables()?;
        if t.users.values().any(|u| u.username == user.username) {
            return Err(integrity(format!("username {} already exists", user.username)));
        }
        let user = user.into_user(t.next_id());
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user(&self, id: UserId) -> DbResult<Option<User>> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        Ok(self.tables()?.users.values().find(|u| u.username == username).cloned())
    }

    async fn owner_of(&self, target: Owned) -> DbResult<Ownership> {
        let t = self.tables()?;
        Ok(match target {
            Owned::BeeYard(id) => {
                let yard = t.beeyards.get(&id);
                Tables::ownership(yard.is_some(), yard.and_then(|y| y.beekeeper_id))
            }
            Owned::Hive(id) => Tables::ownership(t.hives.contains_key(&id), t.hive_owner(id)),
            Owned::Intervention(id) => {
                let row = t.interventions.get(&id);
                Tables::ownership(row.is_some(), row.and_then(|i| t.hive_owner(i.hive_affected_id)))
            }
            Owned::Contamination(id) => {
                let row = t.contaminations.get(&id);
                Tables::ownership(row.is_some(), row.and_then(|c| t.hive_owner(c.hive_id)))
            }
        })
    }

    async fn list_beeyards(
        &self,
        scope: Scope,
        filters: &FilterSet,
        window: Option<Window>,
    ) -> DbResult<Listing<BeeYard>> {
        let t = self.tables()?;
        let rows = t
            .beeyards
            .values()
            .filter(|y| scope.admits(y.beekeeper_id))
            .filter(|y| filters.matches(&YardRow(y)))
            .filter(|y| t.keeper_matches(filters, y.beekeeper_id))
            .cloned()
            .collect();
        Ok(page(rows, window))
    }

    async fn beeyard(&self, id: i64) -> DbResult<Option<BeeYard>> {
        Ok(self.tables()?.beeyards.get(&id).cloned())
    }

    async fn insert_beeyard(&self, draft: BeeYardDraft) -> DbResult<BeeYard> {
        let mut t = self.tables()?;
        if let Some(owner) = draft.beekeeper_id {
            if !t.users.contains_key(&owner) {
                return Err(integrity(format!("user {} does not exist", owner)));
            }
        }
        let yard = draft.into_beeyard(t.next_id());
        t.beeyards.insert(yard.id, yard.clone());
        Ok(yard)
    }

    async fn update_beeyard(&self, id: i64, draft: BeeYardDraft) -> DbResult<Option<BeeYard>> {
        let mut t = self.tables()?;
        if !t.beeyards.contains_key(&id) {
            return Ok(None);
        }
        let yard = draft.into_beeyard(id);
        t.beeyards.insert(id, yard.clone());
        Ok(Some(yard))
    }

    async fn delete_beeyard(&self, id: i64) -> DbResult<bool> {
        let mut t = self.tables()?;
        if t.beeyards.remove(&id).is_none() {
            return Ok(false);
        }
        for hive in t.hives.values_mut() {
            if hive.beeyard_id == Some(id) {
                hive.beeyard_id = None;
            }
        }
        Ok(true)
    }

    async fn list_hives(
        &self,
        scope: Scope,
        filters: &FilterSet,
        window: Option<Window>,
    ) -> DbResult<Listing<Hive>> {
        let t = self.tables()?;
        let rows = t
            .hives
            .values()
            .filter(|h| {
                let owner = t.yard_owner(h.beeyard_id);
                let row = HiveRow {
                    hive: h,
                    yard: h.beeyard_id.and_then(|id| t.beeyards.get(&id)),
                };
                scope.admits(owner) && filters.matches(&row) && t.keeper_matches(filters, owner)
            })
            .cloned()
            .collect();
        Ok(page(rows, window))
    }

    async fn hive(&self, id: i64) -> DbResult<Option<Hive>> {
        Ok(self.tables()?.hives.get(&id).cloned())
    }

    async fn hives_in_yard(&self, beeyard_id: i64) -> DbResult<Vec<Hive>> {
        Ok(self
            .tables()?
            .hives
            .values()
            .filter(|h| h.beeyard_id == Some(beeyard_id))
            .cloned()
            .collect())
    }

    async fn insert_hive(&self, draft: HiveDraft) -> DbResult<Hive> {
        let mut t = self.tables()?;
        if let Some(yard) = draft.beeyard_id {
            if !t.beeyards.contains_key(&yard) {
                return Err(integrity(format!("bee yard {} does not exist", yard)));
            }
        }
        let hive = draft.into_hive(t.next_id(), Utc::now().date_naive());
        t.hives.insert(hive.id, hive.clone());
        Ok(hive)
    }

    async fn update_hive(&self, id: i64, draft: HiveDraft) -> DbResult<Option<Hive>> {
        let mut t = self.tables()?;
        if !t.hives.contains_key(&id) {
            return Ok(None);
        }
        if let Some(yard) = draft.beeyard_id {
            if !t.beeyards.contains_key(&yard) {
                return Err(integrity(format!("bee yard {} does not exist", yard)));
            }
        }
        let hive = draft.into_hive(id, Utc::now().date_naive());
        t.hives.insert(id, hive.clone());
        Ok(Some(hive))
    }

    async fn delete_hive(&self, id: i64) -> DbResult<bool> {
        let mut t = self.tables()?;
        if t.hives.remove(&id).is_none() {
            return Ok(false);
        }

        let removed: Vec<Intervention> = t
            .interventions
            .values()
            .filter(|i| i.hive_affected_id == id)
            .cloned()
            .collect();
        for intervention in removed {
            t.interventions.remove(&intervention.id);
            t.drop_owned_payload(intervention.detail_ref().ok().flatten());
        }

        for intervention in t.interventions.values_mut() {
            if intervention.detail_ref() == Ok(Some(DetailRef::Hive(id))) {
                intervention.set_detail(None);
            }
        }

        t.contaminations.retain(|_, c| c.hive_id != id);
        Ok(true)
    }

    async fn list_interventions(
        &self,
        scope: Scope,
        filters: &FilterSet,
        window: Option<Window>,
    ) -> DbResult<Listing<Intervention>> {
        let t = self.tables()?;
        let rows = t
            .interventions
            .values()
            .filter(|i| {
                let hive = t.hives.get(&i.hive_affected_id);
                let owner = hive.and_then(|h| t.yard_owner(h.beeyard_id));
                let row = InterventionRow { intervention: i, hive };
                scope.admits(owner)
                    && filters.matches(&row)
                    && filters.details.iter().all(|d| d.admits(t.subject(i)))
            })
            .cloned()
            .collect();
        Ok(page(rows, window))
    }

    async fn intervention(&self, id: i64) -> DbResult<Option<Intervention>> {
        Ok(self.tables()?.interventions.get(&id).cloned())
    }

    async fn insert_intervention(&self, draft: InterventionDraft) -> DbResult<Intervention> {
        let mut t = self.tables()?;
        t.check_draft(&draft)?;
        Ok(t.insert_intervention(&draft))
    }

    async fn insert_interventions(&self, drafts: Vec<InterventionDraft>) -> DbResult<Vec<Intervention>> {
        let mut t = self.tables()?;
        for draft in &drafts {
            t.check_draft(draft)?;
        }
        Ok(drafts.iter().map(|d| t.insert_intervention(d)).collect())
    }

    async fn replace_intervention(&self, id: i64, draft: InterventionDraft) -> DbResult<Option<Intervention>> {
        let mut t = self.tables()?;
        let Some(current) = t.interventions.get(&id).cloned() else {
            return Ok(None);
        };
        t.check_draft(&draft)?;

        let detail = t.write_detail(&draft.detail);
        let mut updated = current.clone();
        updated.intervention_type = draft.intervention_type;
        updated.hive_affected_id = draft.hive_affected_id;
        updated.set_detail(detail);
        t.interventions.insert(id, updated.clone());

        let previous = current.detail_ref().ok().flatten();
        if previous != detail {
            t.drop_owned_payload(previous);
        }
        Ok(Some(updated))
    }

    async fn delete_intervention(&self, id: i64) -> DbResult<bool> {
        let mut t = self.tables()?;
        let Some(removed) = t.interventions.remove(&id) else {
            return Ok(false);
        };
        t.drop_owned_payload(removed.detail_ref().ok().flatten());
        Ok(true)
    }

    async fn detail_in_use(&self, detail: DetailRef, excluding: Option<i64>) -> DbResult<bool> {
        let t = self.tables()?;
        Ok(t.interventions.values().any(|i| {
            Some(i.id) != excluding && i.detail_ref() == Ok(Some(detail))
        }))
    }

    async fn harvest(&self, id: i64) -> DbResult<Option<Harvest>> {
        Ok(self.tables()?.harvests.get(&id).cloned())
    }

    async fn syrup_distribution(&self, id: i64) -> DbResult<Option<SyrupDistribution>> {
        Ok(self.tables()?.syrups.get(&id).cloned())
    }

    async fn treatment(&self, id: i64) -> DbResult<Option<Treatment>> {
        Ok(self.tables()?.treatments.get(&id).cloned())
    }

    async fn ensure_treatment(&self, treatment_type: TreatmentType) -> DbResult<Treatment> {
        Ok(self.tables()?.ensure_treatment(treatment_type))
    }

    async fn list_contaminations(
        &self,
        scope: Scope,
        filters: &FilterSet,
        window: Option<Window>,
    ) -> DbResult<Listing<Contamination>> {
        let t = self.tables()?;
        let rows = t
            .contaminations
            .values()
            .filter(|c| scope.admits(t.hive_owner(c.hive_id)) && filters.matches(&ContaminationRow(c)))
            .cloned()
            .collect();
        Ok(page(rows, window))
    }

    async fn contamination(&self, id: i64) -> DbResult<Option<Contamination>> {
        Ok(self.tables()?.contaminations.get(&id).cloned())
    }

    async fn insert_contamination(&self, draft: ContaminationDraft) -> DbResult<Contamination> {
        let mut t = self.tables()?;
        if !t.hives.contains_key(&draft.hive_id) {
            return Err(integrity(format!("hive {} does not exist", draft.hive_id)));
        }
        let row = draft.into_contamination(t.next_id(), Utc::now().date_naive());
        t.contaminations.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_contamination(&self, id: i64, draft: ContaminationDraft) -> DbResult<Option<Contamination>> {
        let mut t = self.tables()?;
        if !t.contaminations.contains_key(&id) {
            return Ok(None);
        }
        if !t.hives.contains_key(&draft.hive_id) {
            return Err(integrity(format!("hive {} does not exist", draft.hive_id)));
        }
        let row = draft.into_contamination(id, Utc::now().date_naive());
        t.contaminations.insert(id, row.clone());
        Ok(Some(row))
    }

    async fn delete_contamination(&self, id: i64) -> DbResult<bool> {
        Ok(self.tables()?.contaminations.remove(&id).is_some())
    }

    async fn list_contacts(&self, filters: &FilterSet, window: Option<Window>) -> DbResult<Listing<ContactEntry>> {
        let t = self.tables()?;
        let rows = t
            .contacts
            .values()
            .filter_map(|c| {
                let user = t.users.get(&c.user_id)?;
                Some(ContactEntry {
                    id: c.id,
                    user_id: user.id,
                    first_name: user.first_name.clone(),
                    last_name: user.last_name.clone(),
                    email: user.email.clone(),
                })
            })
            .filter(|entry| filters.matches(&ContactRow(entry)))
            .collect();
        Ok(page(rows, window))
    }

    async fn contact_for(&self, user_id: UserId) -> DbResult<Option<PublicContact>> {
        Ok(self
            .tables()?
            .contacts
            .values()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn publish_contact(&self, user_id: UserId) -> DbResult<PublicContact> {
        let mut t = self.tables()?;
        if !t.users.contains_key(&user_id) {
            return Err(integrity(format!("user {} does not exist", user_id)));
        }
        if let Some(existing) = t.contacts.values().find(|c| c.user_id == user_id) {
            return Ok(existing.clone());
        }
        let contact = PublicContact {
            id: t.next_id(),
            user_id,
        };
        t.contacts.insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn revoke_contact(&self, user_id: UserId) -> DbResult<bool> {
        let mut t = self.tables()?;
        let before = t.contacts.len();
        t.contacts.retain(|_, c| c.user_id != user_id);
        Ok(t.contacts.len() != before)
    }
}
