//! Lorekeeper Core — shared models and ports.
//!
//! This crate defines the wire models exchanged with the game backend, the
//! ports every bounded context depends on, and the cancellable timer used by
//! the client state machines. It contains no transport code.

pub mod backend;
pub mod error;
pub mod model;
pub mod storage;
pub mod timer;
