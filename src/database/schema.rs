use sqlx::PgPool;
use tracing::info;

use super::manager::DatabaseError;

/// Schema DDL, applied in order. Every statement is idempotent.
pub const STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT ''
    )"#,
    r#"CREATE TABLE IF NOT EXISTS beeyards (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        beekeeper_id BIGINT REFERENCES users(id) ON DELETE SET NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS hives (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('active', 'pending', 'destroyed')),
        species TEXT NOT NULL CHECK (species IN
            ('black_bee', 'italian_bee', 'caucasian_bee', 'carnolian_bee', 'buckfast_bee')),
        date_updated DATE NOT NULL DEFAULT CURRENT_DATE,
        beeyard_id BIGINT REFERENCES beeyards(id) ON DELETE SET NULL,
        queen_year INTEGER NOT NULL CHECK (queen_year BETWEEN 2000 AND 2040)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS harvests (
        id BIGSERIAL PRIMARY KEY,
        quantity DOUBLE PRECISION NOT NULL CHECK (quantity >= 0)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS syrup_distributions (
        id BIGSERIAL PRIMARY KEY,
        syrup_type TEXT NOT NULL CHECK (syrup_type IN ('nectar', 'cane_sugar', 'white_sugar', 'raw_sugar')),
        quantity DOUBLE PRECISION NOT NULL CHECK (quantity >= 0)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS treatments (
        id BIGSERIAL PRIMARY KEY,
        treatment_type TEXT NOT NULL UNIQUE CHECK (treatment_type IN ('antifungal', 'apivar', 'oxalic_acid'))
    )"#,
    r#"CREATE TABLE IF NOT EXISTS interventions (
        id BIGSERIAL PRIMARY KEY,
        intervention_type TEXT NOT NULL CHECK (intervention_type IN
            ('artificial_swarming', 'destruction_queen_cells', 'harvest', 'health_check',
             'super_installation', 'syrup_distribution', 'treatment')),
        date TIMESTAMPTZ NOT NULL DEFAULT now(),
        hive_affected_id BIGINT NOT NULL REFERENCES hives(id) ON DELETE CASCADE,
        content_type TEXT CHECK (content_type IN ('harvest', 'syrup_distribution', 'treatment', 'hive')),
        object_id BIGINT CHECK (object_id > 0),
        CHECK ((content_type IS NULL) = (object_id IS NULL))
    )"#,
    r#"CREATE INDEX IF NOT EXISTS interventions_detail_idx
        ON interventions (content_type, object_id)"#,
    r#"CREATE INDEX IF NOT EXISTS interventions_hive_idx
        ON interventions (hive_affected_id)"#,
    r#"CREATE TABLE IF NOT EXISTS contaminations (
        id BIGSERIAL PRIMARY KEY,
        type TEXT NOT NULL CHECK (type IN ('parasite', 'illness')),
        date DATE NOT NULL DEFAULT CURRENT_DATE,
        hive_id BIGINT NOT NULL REFERENCES hives(id) ON DELETE CASCADE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS public_contacts (
        id BIGSERIAL PRIMARY KEY,
        public_beekeeper_info_id BIGINT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE
    )"#,
];

/// Apply the schema inside one transaction.
pub async fn apply(pool: &PgPool) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;
    for statement in STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    info!("Applied {} schema statements", STATEMENTS.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_are_idempotent() {
        for statement in STATEMENTS {
            assert!(statement.contains("IF NOT EXISTS"), "{}", statement);
        }
    }

    #[test]
    fn tables_are_created_before_they_are_referenced() {
        let position = |needle: &str| {
            STATEMENTS
                .iter()
                .position(|s| s.contains(needle))
                .unwrap_or(usize::MAX)
        };
        assert!(position("TABLE IF NOT EXISTS users") < position("REFERENCES users"));
        assert!(position("TABLE IF NOT EXISTS hives") < position("REFERENCES hives"));
        assert!(position("TABLE IF NOT EXISTS beeyards") < position("REFERENCES beeyards"));
    }
}
