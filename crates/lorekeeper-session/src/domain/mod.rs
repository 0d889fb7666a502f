//! Persisted onboarding state.

pub mod resume;
