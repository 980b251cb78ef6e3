// handlers/public/api/mod.rs - Read-only public API (/public/*)
//
// Anyone may read every yard and hive. Keeper contact details are redacted
// unless the keeper published them.

pub mod beekeepers;
pub mod beeyards;
pub mod hives;
pub mod index;

pub use beekeepers::beekeeper_list;
pub use index::index;
