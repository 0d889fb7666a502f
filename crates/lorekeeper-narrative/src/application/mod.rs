//! Backend-facing simulation operations.

pub mod simulate;
