// handlers/protected/mod.rs - Private API handlers (/api/*)
//
// Every handler receives the caller's Identity from the identity middleware.
// Anonymous callers are refused with 401 before any query runs; listings are
// narrowed to the caller's rows and by-id routes re-check ownership.

pub mod auth;
pub mod beeyards;
pub mod contaminations;
pub mod hives;
pub mod interventions;

pub use beeyards::*;
pub use contaminations::*;
pub use hives::*;
pub use interventions::*;
