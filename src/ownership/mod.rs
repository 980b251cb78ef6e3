//! Who the caller is and which rows they may see.
//!
//! Ownership always resolves through the chain user -> bee yard -> hive ->
//! {intervention, contamination}. List queries are narrowed with a [`Scope`];
//! by-id access is re-checked per object with [`authorize`].

use thiserror::Error;

use crate::database::models::UserId;
use crate::database::store::ApiaryStore;
use crate::database::DatabaseError;
use crate::filter::{FilterWhere, SqlParam};

/// The caller of a request, resolved by the identity middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Beekeeper { id: UserId, username: String },
}

impl Identity {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Identity::Beekeeper { id, .. } => Some(*id),
            Identity::Anonymous => None,
        }
    }

    /// Private surface entry check.
    pub fn require(&self) -> Result<UserId, AccessError> {
        self.user_id().ok_or(AccessError::Unauthenticated)
    }

    pub fn scope(&self) -> Scope {
        match self.user_id() {
            Some(id) => Scope::Owner(id),
            None => Scope::Nobody,
        }
    }
}

/// Row visibility for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Public surface.
    Everyone,
    Owner(UserId),
    /// Anonymous caller on an owner-scoped listing: always empty.
    Nobody,
}

impl Scope {
    /// Restrict a query; `owner_column` is the bee yard's `beekeeper_id`
    /// reached through the query's joins.
    pub fn push_sql(&self, fw: &mut FilterWhere, owner_column: &str) {
        match self {
            Scope::Everyone => {}
            Scope::Owner(id) => {
                let p = fw.param(SqlParam::Integer(*id));
                fw.push_raw(format!("{} = {}", owner_column, p));
            }
            Scope::Nobody => fw.push_raw("FALSE"),
        }
    }

    pub fn admits(&self, owner: Option<UserId>) -> bool {
        match self {
            Scope::Everyone => true,
            Scope::Owner(id) => owner == Some(*id),
            Scope::Nobody => false,
        }
    }
}

/// A row whose owner can be looked up through the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owned {
    BeeYard(i64),
    Hive(i64),
    Intervention(i64),
    Contamination(i64),
}

impl Owned {
    pub fn label(&self) -> &'static str {
        match self {
            Owned::BeeYard(_) => "Bee yard",
            Owned::Hive(_) => "Hive",
            Owned::Intervention(_) => "Intervention",
            Owned::Contamination(_) => "Contamination",
        }
    }
}

/// Result of walking the ownership chain for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Missing,
    /// The row exists but its chain ends at a yard without keeper, or no yard.
    Unowned,
    Owner(UserId),
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

impl AccessError {
    /// By-id CRUD routes do not reveal that another owner's row exists.
    pub fn conceal(self, target: Owned) -> Self {
        match self {
            AccessError::Forbidden => AccessError::NotFound(target.label()),
            other => other,
        }
    }
}

/// Check that the caller owns `target`, evaluated against the store now.
pub async fn authorize(
    store: &dyn ApiaryStore,
    identity: &Identity,
    target: Owned,
) -> Result<UserId, AccessError> {
    let user_id = identity.require()?;
    match store.owner_of(target).await? {
        Ownership::Missing => Err(AccessError::NotFound(target.label())),
        Ownership::Owner(owner) if owner == user_id => Ok(user_id),
        Ownership::Owner(_) | Ownership::Unowned => {
            tracing::debug!(user_id, ?target, "ownership check refused");
            Err(AccessError::Forbidden)
        }
    }
}
