// handlers/public/mod.rs - Public handlers (no identity required)
//
// Token acquisition under /auth/* and the read-only API under /public/*.

pub mod api;
pub mod auth;
