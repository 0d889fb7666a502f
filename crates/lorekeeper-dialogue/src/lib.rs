//! Lorekeeper client — NPC Dialogue bounded context.
//!
//! Responsible for the per-NPC conversation log and for keeping at most one
//! chat request outstanding per session.

pub mod application;
pub mod domain;
