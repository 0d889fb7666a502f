//! Backend-facing world-state operations.

pub mod poller;
pub mod refresh;
