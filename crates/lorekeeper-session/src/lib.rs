//! Lorekeeper client — Session Resume bounded context.
//!
//! Responsible for onboarding progress, scenario choice, and restoring both
//! across restarts.

pub mod application;
pub mod domain;
