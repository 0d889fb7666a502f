//! Lorekeeper client — World State bounded context.
//!
//! Holds the latest known world, NPC and event snapshot, refreshes it from
//! the backend, and polls in the background for out-of-band changes.

pub mod application;
pub mod domain;
