//! Backend-facing dialogue operations.

pub mod exchange;
