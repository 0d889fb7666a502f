//! Playback and simulation state.

pub mod coordinator;
pub mod phase;
pub mod player;
