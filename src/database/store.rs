use async_trait::async_trait;

use super::manager::DatabaseError;
use super::models::{
    BeeYard, BeeYardDraft, ContactEntry, Contamination, ContaminationDraft, DetailRef, Harvest,
    Hive, HiveDraft, Intervention, InterventionDraft, NewUser, PublicContact, SyrupDistribution,
    Treatment, TreatmentType, User, UserId,
};
use crate::filter::FilterSet;
use crate::ownership::{Owned, Ownership, Scope};

pub type DbResult<T> = Result<T, DatabaseError>;

/// A page of a listing, as `LIMIT`/`OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: i64,
    pub offset: i64,
}

/// Rows of one listing request and the number of rows matching it overall.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub rows: Vec<T>,
    pub total: i64,
}

impl<T> Listing<T> {
    pub fn from_rows(rows: Vec<T>) -> Self {
        let total = rows.len() as i64;
        Listing { rows, total }
    }
}

/// Persistence for every entity of the apiary.
///
/// Multi-row writes (intervention with a new detail, bulk insert, replacement,
/// hive deletion) are atomic. Write methods return `Ok(None)` or `Ok(false)`
/// when the addressed row does not exist. Constraint failures surface as
/// [`DatabaseError::Integrity`].
#[async_trait]
pub trait ApiaryStore: Send + Sync {
    async fn health_check(&self) -> DbResult<()>;

    // Users
    async fn insert_user(&self, user: NewUser) -> DbResult<User>;
    async fn user(&self, id: UserId) -> DbResult<Option<User>>;
    async fn user_by_username(&self, username: &str) -> DbResult<Option<User>>;

    /// Walk the ownership chain for one row.
    async fn owner_of(&self, target: Owned) -> DbResult<Ownership>;

    // Bee yards
    async fn list_beeyards(
        &self,
        scope: Scope,
        filters: &FilterSet,
        window: Option<Window>,
    ) -> DbResult<Listing<BeeYard>>;
    async fn beeyard(&self, id: i64) -> DbResult<Option<BeeYard>>;
    async fn insert_beeyard(&self, draft: BeeYardDraft) -> DbResult<BeeYard>;
    async fn update_beeyard(&self, id: i64, draft: BeeYardDraft) -> DbResult<Option<BeeYard>>;
    /// Hives of the yard are kept with their yard set to null.
    async fn delete_beeyard(&self, id: i64) -> DbResult<bool>;

    // Hives
    async fn list_hives(
        &self,
        scope: Scope,
        filters: &FilterSet,
        window: Option<Window>,
    ) -> DbResult<Listing<Hive>>;
    async fn hive(&self, id: i64) -> DbResult<Option<Hive>>;
    async fn hives_in_yard(&self, beeyard_id: i64) -> DbResult<Vec<Hive>>;
    async fn insert_hive(&self, draft: HiveDraft) -> DbResult<Hive>;
    async fn update_hive(&self, id: i64, draft: HiveDraft) -> DbResult<Option<Hive>>;
    /// Removes the hive's interventions (with the harvest and syrup rows they
    /// own) and contaminations, and nulls swarming references to it.
    async fn delete_hive(&self, id: i64) -> DbResult<bool>;

    // Interventions
    async fn list_interventions(
        &self,
        scope: Scope,
        filters: &FilterSet,
        window: Option<Window>,
    ) -> DbResult<Listing<Intervention>>;
    async fn intervention(&self, id: i64) -> DbResult<Option<Intervention>>;
    async fn insert_intervention(&self, draft: InterventionDraft) -> DbResult<Intervention>;
    /// All rows or none.
    async fn insert_interventions(&self, drafts: Vec<InterventionDraft>) -> DbResult<Vec<Intervention>>;
    /// Keeps the original `date`; deletes an owned detail row no longer referenced.
    async fn replace_intervention(&self, id: i64, draft: InterventionDraft) -> DbResult<Option<Intervention>>;
    async fn delete_intervention(&self, id: i64) -> DbResult<bool>;
    /// Whether another intervention already points at `detail`.
    async fn detail_in_use(&self, detail: DetailRef, excluding: Option<i64>) -> DbResult<bool>;

    // Detail records
    async fn harvest(&self, id: i64) -> DbResult<Option<Harvest>>;
    async fn syrup_distribution(&self, id: i64) -> DbResult<Option<SyrupDistribution>>;
    async fn treatment(&self, id: i64) -> DbResult<Option<Treatment>>;
    /// Get-or-create the canonical row for a treatment type.
    async fn ensure_treatment(&self, treatment_type: TreatmentType) -> DbResult<Treatment>;

    // Contaminations
    async fn list_contaminations(
        &self,
        scope: Scope,
        filters: &FilterSet,
        window: Option<Window>,
    ) -> DbResult<Listing<Contamination>>;
    async fn contamination(&self, id: i64) -> DbResult<Option<Contamination>>;
    async fn insert_contamination(&self, draft: ContaminationDraft) -> DbResult<Contamination>;
    async fn update_contamination(&self, id: i64, draft: ContaminationDraft) -> DbResult<Option<Contamination>>;
    async fn delete_contamination(&self, id: i64) -> DbResult<bool>;

    // Public contacts
    async fn list_contacts(&self, filters: &FilterSet, window: Option<Window>) -> DbResult<Listing<ContactEntry>>;
    async fn contact_for(&self, user_id: UserId) -> DbResult<Option<PublicContact>>;
    /// Idempotent.
    async fn publish_contact(&self, user_id: UserId) -> DbResult<PublicContact>;
    async fn revoke_contact(&self, user_id: UserId) -> DbResult<bool>;
}
