//! Conversation state.

pub mod entry;
pub mod session;
