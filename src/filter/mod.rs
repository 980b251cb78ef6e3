pub mod error;
pub mod filter_set;
pub mod filter_where;
pub mod types;

pub use error::FilterError;
pub use filter_set::{DetailFilter, DetailSubject, FilterSet, KeeperName, Resource};
pub use filter_where::{FilterWhere, SqlParam};
pub use types::*;
