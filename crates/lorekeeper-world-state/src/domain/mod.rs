//! Pure world-state types.

pub mod sync_store;
