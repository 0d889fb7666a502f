//! Lorekeeper game client.
//!
//! Wires the bounded contexts together behind a single orchestrator task and
//! provides the production adapters: an HTTP backend, a file-backed store,
//! environment configuration and tracing setup.

pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod storage;
pub mod telemetry;
pub mod terminal;
