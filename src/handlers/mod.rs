// handlers/mod.rs - HTTP handlers by surface
//
// public    - /auth/* token acquisition and the read-only /public/* API
// protected - /api/* private API, identity required
// pages     - /apiary/* server-rendered pages

pub mod pages;
pub mod protected;
pub mod public;
