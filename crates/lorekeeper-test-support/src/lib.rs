//! Shared test doubles and fixtures for the Lorekeeper client.

mod backend;
pub mod fixtures;
mod store;

pub use backend::ScriptedBackend;
pub use store::{FailingStore, MemoryStore};
