use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool};

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    BeeYard, BeeYardDraft, ContactEntry, Contamination, ContaminationDraft, DetailDraft, DetailKind,
    DetailRef, Harvest, Hive, HiveDraft, Intervention, InterventionDraft, NewUser, PublicContact,
    SyrupDistribution, Treatment, TreatmentType, User, UserId,
};
use super::store::{ApiaryStore, DbResult, Listing, Window};
use crate::filter::filter_where::{bind_query_as, bind_query_scalar};
use crate::filter::{FilterSet, FilterWhere, SqlParam};
use crate::ownership::{Owned, Ownership, Scope};

const USER_COLUMNS: &str = "id, username, password_hash, first_name, last_name, email";
const HIVE_COLUMNS: &str = "h.id, h.name, h.status, h.species, h.date_updated, h.beeyard_id, h.queen_year";
const INTERVENTION_COLUMNS: &str =
    "i.id, i.intervention_type, i.date, i.hive_affected_id, i.content_type, i.object_id";
const CONTAMINATION_COLUMNS: &str = "c.id, c.type, c.date, c.hive_id";

const HIVES_FROM: &str = "hives h LEFT JOIN beeyards b ON b.id = h.beeyard_id";
const INTERVENTIONS_FROM: &str = "interventions i \
    JOIN hives h ON h.id = i.hive_affected_id \
    LEFT JOIN beeyards b ON b.id = h.beeyard_id";
const CONTAMINATIONS_FROM: &str = "contaminations c \
    JOIN hives h ON h.id = c.hive_id \
    LEFT JOIN beeyards b ON b.id = h.beeyard_id";
const CONTACTS_FROM: &str = "public_contacts pc JOIN users u ON u.id = pc.public_beekeeper_info_id";

/// Every owner-scoped query reaches the yard as `b`.
const OWNER_COLUMN: &str = "b.beekeeper_id";

fn detail_table(kind: DetailKind) -> &'static str {
    match kind {
        DetailKind::Harvest => "harvests",
        DetailKind::SyrupDistribution => "syrup_distributions",
        DetailKind::Treatment => "treatments",
        DetailKind::Hive => "hives",
    }
}

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn scoped(scope: Scope, filters: &FilterSet) -> FilterWhere {
        let mut fw = FilterWhere::new();
        scope.push_sql(&mut fw, OWNER_COLUMN);
        fw.apply(filters, OWNER_COLUMN);
        fw
    }

    async fn fetch_listing<T>(
        &self,
        select: &str,
        from: &str,
        order: &str,
        mut fw: FilterWhere,
        window: Option<Window>,
    ) -> DbResult<Listing<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let where_sql = fw.to_sql();
        let count_params: Vec<SqlParam> = fw.params().to_vec();
        let mut sql = format!("SELECT {} FROM {}{} ORDER BY {}", select, from, where_sql, order);
        if let Some(w) = window {
            let limit = fw.param(SqlParam::Integer(w.limit));
            let offset = fw.param(SqlParam::Integer(w.offset));
            sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        }

        let rows = bind_query_as(sqlx::query_as::<_, T>(&sql), fw.params())
            .fetch_all(&self.pool)
            .await?;

        let total = match window {
            Some(_) => {
                let count_sql = format!("SELECT COUNT(*) FROM {}{}", from, where_sql);
                bind_query_scalar(sqlx::query_scalar::<_, i64>(&count_sql), &count_params)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => rows.len() as i64,
        };

        Ok(Listing { rows, total })
    }

    async fn owner_by(&self, sql: &str, id: i64) -> DbResult<Ownership> {
        let row: Option<Option<UserId>> = sqlx::query_scalar(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            None => Ownership::Missing,
            Some(None) => Ownership::Unowned,
            Some(Some(owner)) => Ownership::Owner(owner),
        })
    }
}

/// Resolve a write's detail into a stored reference, creating the row if needed.
async fn write_detail(conn: &mut PgConnection, detail: &DetailDraft) -> DbResult<Option<DetailRef>> {
    match detail {
        DetailDraft::None => Ok(None),
        DetailDraft::Existing(reference) => {
            let sql = format!(
                "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
                detail_table(reference.kind())
            );
            let exists: bool = sqlx::query_scalar(&sql)
                .bind(reference.id())
                .fetch_one(&mut *conn)
                .await?;
            if !exists {
                return Err(DatabaseError::Integrity(format!(
                    "{} {} no longer exists",
                    reference.kind(),
                    reference.id()
                )));
            }
            Ok(Some(*reference))
        }
        DetailDraft::Harvest { quantity } => {
            let id: i64 = sqlx::query_scalar("INSERT INTO harvests (quantity) VALUES ($1) RETURNING id")
                .bind(*quantity)
                .fetch_one(&mut *conn)
                .await?;
            Ok(Some(DetailRef::Harvest(id)))
        }
        DetailDraft::SyrupDistribution { syrup_type, quantity } => {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO syrup_distributions (syrup_type, quantity) VALUES ($1, $2) RETURNING id",
            )
            .bind(*syrup_type)
            .bind(*quantity)
            .fetch_one(&mut *conn)
            .await?;
            Ok(Some(DetailRef::SyrupDistribution(id)))
        }
        DetailDraft::Treatment(treatment_type) => {
            let treatment = upsert_treatment(&mut *conn, *treatment_type).await?;
            Ok(Some(DetailRef::Treatment(treatment.id)))
        }
    }
}

async fn upsert_treatment(conn: &mut PgConnection, treatment_type: TreatmentType) -> DbResult<Treatment> {
    let treatment = sqlx::query_as::<_, Treatment>(
        "INSERT INTO treatments (treatment_type) VALUES ($1) \
         ON CONFLICT (treatment_type) DO UPDATE SET treatment_type = EXCLUDED.treatment_type \
         RETURNING id, treatment_type",
    )
    .bind(treatment_type)
    .fetch_one(&mut *conn)
    .await?;
    Ok(treatment)
}

async fn insert_intervention_row(conn: &mut PgConnection, draft: &InterventionDraft) -> DbResult<Intervention> {
    let detail = write_detail(&mut *conn, &draft.detail).await?;
    let (tag, object_id) = DetailRef::to_columns(detail);
    let intervention = sqlx::query_as::<_, Intervention>(
        "INSERT INTO interventions (intervention_type, date, hive_affected_id, content_type, object_id) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, intervention_type, date, hive_affected_id, content_type, object_id",
    )
    .bind(draft.intervention_type)
    .bind(Utc::now())
    .bind(draft.hive_affected_id)
    .bind(tag)
    .bind(object_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(intervention)
}

/// Delete a harvest or syrup row owned by a removed or replaced intervention.
async fn drop_owned_payload(conn: &mut PgConnection, detail: Option<DetailRef>) -> DbResult<()> {
    if let Some(detail) = detail.filter(DetailRef::is_owned_payload) {
        let sql = format!("DELETE FROM {} WHERE id = $1", detail_table(detail.kind()));
        sqlx::query(&sql).bind(detail.id()).execute(&mut *conn).await?;
    }
    Ok(())
}

fn stored_detail(intervention: &Intervention) -> Option<DetailRef> {
    match intervention.detail_ref() {
        Ok(detail) => detail,
        Err(err) => {
            tracing::error!(intervention_id = intervention.id, "{}", err);
            None
        }
    }
}

#[async_trait]
impl ApiaryStore for PgStore {
    async fn health_check(&self) -> DbResult<()> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn insert_user(&self, user: NewUser) -> DbResult<User> {
        let sql = format!(
            "INSERT INTO users (username, password_hash, first_name, last_name, email) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn user(&self, id: UserId) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn owner_of(&self, target: Owned) -> DbResult<Ownership> {
        match target {
            Owned::BeeYard(id) => {
                self.owner_by("SELECT b.beekeeper_id FROM beeyards b WHERE b.id = $1", id)
                    .await
            }
            Owned::Hive(id) => {
                let sql = format!("SELECT {} FROM {} WHERE h.id = $1", OWNER_COLUMN, HIVES_FROM);
                self.owner_by(&sql, id).await
            }
            Owned::Intervention(id) => {
                let sql = format!("SELECT {} FROM {} WHERE i.id = $1", OWNER_COLUMN, INTERVENTIONS_FROM);
                self.owner_by(&sql, id).await
            }
            Owned::Contamination(id) => {
                let sql = format!("SELECT {} FROM {} WHERE c.id = $1", OWNER_COLUMN, CONTAMINATIONS_FROM);
                self.owner_by(&sql, id).await
            }
        }
    }

    async fn list_beeyards(
        &self,
        scope: Scope,
        filters: &FilterSet,
        window: Option<Window>,
    ) -> DbResult<Listing<BeeYard>> {
        let fw = Self::scoped(scope, filters);
        self.fetch_listing("b.id, b.name, b.beekeeper_id", "beeyards b", "b.id", fw, window)
            .await
    }

    async fn beeyard(&self, id: i64) -> DbResult<Option<BeeYard>> {
        Ok(sqlx::query_as::<_, BeeYard>("SELECT id, name, beekeeper_id FROM beeyards WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_beeyard(&self, draft: BeeYardDraft) -> DbResult<BeeYard> {
        Ok(sqlx::query_as::<_, BeeYard>(
            "INSERT INTO beeyards (name, beekeeper_id) VALUES ($1, $2) RETURNING id, name, beekeeper_id",
        )
        .bind(&draft.name)
        .bind(draft.beekeeper_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_beeyard(&self, id: i64, draft: BeeYardDraft) -> DbResult<Option<BeeYard>> {
        Ok(sqlx::query_as::<_, BeeYard>(
            "UPDATE beeyards SET name = $1, beekeeper_id = $2 WHERE id = $3 \
             RETURNING id, name, beekeeper_id",
        )
        .bind(&draft.name)
        .bind(draft.beekeeper_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_beeyard(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM beeyards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_hives(
        &self,
        scope: Scope,
        filters: &FilterSet,
        window: Option<Window>,
    ) -> DbResult<Listing<Hive>> {
        let fw = Self::scoped(scope, filters);
        self.fetch_listing(HIVE_COLUMNS, HIVES_FROM, "h.id", fw, window).await
    }

    async fn hive(&self, id: i64) -> DbResult<Option<Hive>> {
        let sql = format!("SELECT {} FROM hives h WHERE h.id = $1", HIVE_COLUMNS);
        Ok(sqlx::query_as::<_, Hive>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn hives_in_yard(&self, beeyard_id: i64) -> DbResult<Vec<Hive>> {
        let sql = format!("SELECT {} FROM hives h WHERE h.beeyard_id = $1 ORDER BY h.id", HIVE_COLUMNS);
        Ok(sqlx::query_as::<_, Hive>(&sql).bind(beeyard_id).fetch_all(&self.pool).await?)
    }

    async fn insert_hive(&self, draft: HiveDraft) -> DbResult<Hive> {
        Ok(sqlx::query_as::<_, Hive>(
            "INSERT INTO hives (name, status, species, date_updated, beeyard_id, queen_year) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, name, status, species, date_updated, beeyard_id, queen_year",
        )
        .bind(&draft.name)
        .bind(draft.status)
        .bind(draft.species)
        .bind(Utc::now().date_naive())
        .bind(draft.beeyard_id)
        .bind(draft.queen_year)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_hive(&self, id: i64, draft: HiveDraft) -> DbResult<Option<Hive>> {
        Ok(sqlx::query_as::<_, Hive>(
            "UPDATE hives SET name = $1, status = $2, species = $3, date_updated = $4, \
             beeyard_id = $5, queen_year = $6 WHERE id = $7 \
             RETURNING id, name, status, species, date_updated, beeyard_id, queen_year",
        )
        .bind(&draft.name)
        .bind(draft.status)
        .bind(draft.species)
        .bind(Utc::now().date_naive())
        .bind(draft.beeyard_id)
        .bind(draft.queen_year)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_hive(&self, id: i64) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let owned: Vec<(Option<String>, Option<i64>)> = sqlx::query_as(
            "SELECT content_type, object_id FROM interventions \
             WHERE hive_affected_id = $1 AND content_type IN ('harvest', 'syrup_distribution')",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM interventions WHERE hive_affected_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for (tag, object_id) in owned {
            let detail = DetailRef::from_columns(tag.as_deref(), object_id)
                .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
            drop_owned_payload(&mut tx, detail).await?;
        }

        sqlx::query(
            "UPDATE interventions SET content_type = NULL, object_id = NULL \
             WHERE content_type = 'hive' AND object_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM hives WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_interventions(
        &self,
        scope: Scope,
        filters: &FilterSet,
        window: Option<Window>,
    ) -> DbResult<Listing<Intervention>> {
        let fw = Self::scoped(scope, filters);
        self.fetch_listing(INTERVENTION_COLUMNS, INTERVENTIONS_FROM, "i.id", fw, window)
            .await
    }

    async fn intervention(&self, id: i64) -> DbResult<Option<Intervention>> {
        let sql = format!("SELECT {} FROM interventions i WHERE i.id = $1", INTERVENTION_COLUMNS);
        Ok(sqlx::query_as::<_, Intervention>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_intervention(&self, draft: InterventionDraft) -> DbResult<Intervention> {
        let mut tx = self.pool.begin().await?;
        let intervention = insert_intervention_row(&mut tx, &draft).await?;
        tx.commit().await?;
        Ok(intervention)
    }

    async fn insert_interventions(&self, drafts: Vec<InterventionDraft>) -> DbResult<Vec<Intervention>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            created.push(insert_intervention_row(&mut tx, draft).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn replace_intervention(&self, id: i64, draft: InterventionDraft) -> DbResult<Option<Intervention>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM interventions i WHERE i.id = $1 FOR UPDATE",
            INTERVENTION_COLUMNS
        );
        let Some(current) = sqlx::query_as::<_, Intervention>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let detail = write_detail(&mut tx, &draft.detail).await?;
        let (tag, object_id) = DetailRef::to_columns(detail);
        let updated = sqlx::query_as::<_, Intervention>(
            "UPDATE interventions SET intervention_type = $1, hive_affected_id = $2, \
             content_type = $3, object_id = $4 WHERE id = $5 \
             RETURNING id, intervention_type, date, hive_affected_id, content_type, object_id",
        )
        .bind(draft.intervention_type)
        .bind(draft.hive_affected_id)
        .bind(tag)
        .bind(object_id)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let previous = stored_detail(&current);
        if previous != detail {
            drop_owned_payload(&mut tx, previous).await?;
        }

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete_intervention(&self, id: i64) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "DELETE FROM interventions i WHERE i.id = $1 RETURNING {}",
            INTERVENTION_COLUMNS
        );
        let removed = sqlx::query_as::<_, Intervention>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(removed) = removed else {
            return Ok(false);
        };
        drop_owned_payload(&mut tx, stored_detail(&removed)).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn detail_in_use(&self, detail: DetailRef, excluding: Option<i64>) -> DbResult<bool> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM interventions \
             WHERE content_type = $1 AND object_id = $2 AND ($3::BIGINT IS NULL OR id <> $3))",
        )
        .bind(detail.kind())
        .bind(detail.id())
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn harvest(&self, id: i64) -> DbResult<Option<Harvest>> {
        Ok(sqlx::query_as::<_, Harvest>("SELECT id, quantity FROM harvests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn syrup_distribution(&self, id: i64) -> DbResult<Option<SyrupDistribution>> {
        Ok(sqlx::query_as::<_, SyrupDistribution>(
            "SELECT id, syrup_type, quantity FROM syrup_distributions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn treatment(&self, id: i64) -> DbResult<Option<Treatment>> {
        Ok(sqlx::query_as::<_, Treatment>("SELECT id, treatment_type FROM treatments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn ensure_treatment(&self, treatment_type: TreatmentType) -> DbResult<Treatment> {
        let mut conn = self.pool.acquire().await?;
        upsert_treatment(&mut conn, treatment_type).await
    }

    async fn list_contaminations(
        &self,
        scope: Scope,
        filters: &FilterSet,
        window: Option<Window>,
    ) -> DbResult<Listing<Contamination>> {
        let fw = Self::scoped(scope, filters);
        self.fetch_listing(CONTAMINATION_COLUMNS, CONTAMINATIONS_FROM, "c.id", fw, window)
            .await
    }

    async fn contamination(&self, id: i64) -> DbResult<Option<Contamination>> {
        let sql = format!("SELECT {} FROM contaminations c WHERE c.id = $1", CONTAMINATION_COLUMNS);
        Ok(sqlx::query_as::<_, Contamination>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_contamination(&self, draft: ContaminationDraft) -> DbResult<Contamination> {
        Ok(sqlx::query_as::<_, Contamination>(
            "INSERT INTO contaminations (type, date, hive_id) VALUES ($1, $2, $3) \
             RETURNING id, type, date, hive_id",
        )
        .bind(draft.contamination_type)
        .bind(Utc::now().date_naive())
        .bind(draft.hive_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_contamination(&self, id: i64, draft: ContaminationDraft) -> DbResult<Option<Contamination>> {
        Ok(sqlx::query_as::<_, Contamination>(
            "UPDATE contaminations SET type = $1, date = $2, hive_id = $3 WHERE id = $4 \
             RETURNING id, type, date, hive_id",
        )
        .bind(draft.contamination_type)
        .bind(Utc::now().date_naive())
        .bind(draft.hive_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_contamination(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM contaminations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_contacts(&self, filters: &FilterSet, window: Option<Window>) -> DbResult<Listing<ContactEntry>> {
        let mut fw = FilterWhere::new();
        fw.apply(filters, "u.id");
        self.fetch_listing(
            "pc.id, u.id AS user_id, u.first_name, u.last_name, u.email",
            CONTACTS_FROM,
            "pc.id",
            fw,
            window,
        )
        .await
    }

    async fn contact_for(&self, user_id: UserId) -> DbResult<Option<PublicContact>> {
        Ok(sqlx::query_as::<_, PublicContact>(
            "SELECT id, public_beekeeper_info_id FROM public_contacts WHERE public_beekeeper_info_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn publish_contact(&self, user_id: UserId) -> DbResult<PublicContact> {
        Ok(sqlx::query_as::<_, PublicContact>(
            "INSERT INTO public_contacts (public_beekeeper_info_id) VALUES ($1) \
             ON CONFLICT (public_beekeeper_info_id) \
             DO UPDATE SET public_beekeeper_info_id = EXCLUDED.public_beekeeper_info_id \
             RETURNING id, public_beekeeper_info_id",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn revoke_contact(&self, user_id: UserId) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM public_contacts WHERE public_beekeeper_info_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
