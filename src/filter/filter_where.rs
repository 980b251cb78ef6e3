use chrono::NaiveDate;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{FromRow, Postgres};

use super::filter_set::{DetailFilter, FilterSet, KeeperName};
use super::types::{like_pattern, Condition, FilterValue, Lookup};

/// A positional parameter collected while building a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
}

impl From<&FilterValue> for SqlParam {
    fn from(value: &FilterValue) -> Self {
        match value {
            FilterValue::Text(s) => SqlParam::Text(s.clone()),
            FilterValue::Integer(i) => SqlParam::Integer(*i),
            FilterValue::Float(f) => SqlParam::Float(*f),
            FilterValue::Date(d) => SqlParam::Date(*d),
        }
    }
}

/// Accumulates `AND`-joined predicates and their `$n` parameters.
#[derive(Debug, Default)]
pub struct FilterWhere {
    clauses: Vec<String>,
    params: Vec<SqlParam>,
}

impl FilterWhere {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter and return its placeholder.
    pub fn param(&mut self, value: SqlParam) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    pub fn push_raw(&mut self, clause: impl Into<String>) {
        self.clauses.push(clause.into());
    }

    /// Apply every condition of a filter set. Keeper name clauses compare
    /// against `owner_column`.
    pub fn apply(&mut self, filters: &FilterSet, owner_column: &str) {
        for condition in &filters.conditions {
            self.push_condition(condition);
        }
        for detail in &filters.details {
            self.push_detail(detail);
        }
        if let Some(name) = &filters.keeper_name {
            self.push_keeper_name(name, owner_column);
        }
    }

    fn push_condition(&mut self, condition: &Condition) {
        let column = condition.column;
        let clause = match (condition.lookup, &condition.value) {
            (Lookup::Contains, FilterValue::Text(s)) => {
                format!("{} LIKE {}", column, self.param(SqlParam::Text(like_pattern(s))))
            }
            (Lookup::IContains, FilterValue::Text(s)) => {
                format!("{} ILIKE {}", column, self.param(SqlParam::Text(like_pattern(s))))
            }
            (lookup, value) => {
                let op = match lookup {
                    Lookup::Gt => ">",
                    Lookup::Gte => ">=",
                    Lookup::Lt => "<",
                    Lookup::Lte => "<=",
                    Lookup::Exact | Lookup::Contains | Lookup::IContains => "=",
                };
                format!("{} {} {}", column, op, self.param(SqlParam::from(value)))
            }
        };
        self.clauses.push(clause);
    }

    // Dispatch through the content_type discriminator so each detail filter
    // is a single EXISTS probe on its own table.
    fn push_detail(&mut self, detail: &DetailFilter) {
        let clause = match detail {
            DetailFilter::TreatmentType(needle) => format!(
                "EXISTS (SELECT 1 FROM treatments t WHERE i.content_type = 'treatment' \
                 AND t.id = i.object_id AND t.treatment_type ILIKE {})",
                self.param(SqlParam::Text(like_pattern(needle)))
            ),
            DetailFilter::SyrupType(needle) => format!(
                "EXISTS (SELECT 1 FROM syrup_distributions s WHERE i.content_type = 'syrup_distribution' \
                 AND s.id = i.object_id AND s.syrup_type ILIKE {})",
                self.param(SqlParam::Text(like_pattern(needle)))
            ),
            DetailFilter::HarvestLt(limit) => format!(
                "EXISTS (SELECT 1 FROM harvests hv WHERE i.content_type = 'harvest' \
                 AND hv.id = i.object_id AND hv.quantity < {})",
                self.param(SqlParam::Float(*limit))
            ),
            DetailFilter::HarvestGt(limit) => format!(
                "EXISTS (SELECT 1 FROM harvests hv WHERE i.content_type = 'harvest' \
                 AND hv.id = i.object_id AND hv.quantity > {})",
                self.param(SqlParam::Float(*limit))
            ),
        };
        self.clauses.push(clause);
    }

    fn push_keeper_name(&mut self, name: &KeeperName, owner_column: &str) {
        let (first, last) = name.needles();
        let first = self.param(SqlParam::Text(like_pattern(first)));
        let last = self.param(SqlParam::Text(like_pattern(last)));
        self.clauses.push(format!(
            "EXISTS (SELECT 1 FROM public_contacts kpc JOIN users ku ON ku.id = kpc.public_beekeeper_info_id \
             WHERE ku.id = {} AND (ku.first_name ILIKE {} OR ku.last_name ILIKE {}))",
            owner_column, first, last
        ));
    }

    /// ` WHERE ...` or an empty string.
    pub fn to_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }
}

pub fn bind_query_as<'q, O>(
    mut q: QueryAs<'q, Postgres, O, PgArguments>,
    params: &[SqlParam],
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    for p in params {
        q = match p {
            SqlParam::Text(s) => q.bind(s.clone()),
            SqlParam::Integer(i) => q.bind(*i),
            SqlParam::Float(f) => q.bind(*f),
            SqlParam::Date(d) => q.bind(*d),
        };
    }
    q
}

pub fn bind_query_scalar<'q, O>(
    mut q: QueryScalar<'q, Postgres, O, PgArguments>,
    params: &[SqlParam],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for p in params {
        q = match p {
            SqlParam::Text(s) => q.bind(s.clone()),
            SqlParam::Integer(i) => q.bind(*i),
            SqlParam::Float(f) => q.bind(*f),
            SqlParam::Date(d) => q.bind(*d),
        };
    }
    q
}
