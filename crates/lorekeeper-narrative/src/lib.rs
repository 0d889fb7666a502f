//! Lorekeeper client — Narrative Playback bounded context.
//!
//! Responsible for "advance time" requests and for the timed, phased reveal
//! of their outcome: recap, event, gossip, done.

pub mod application;
pub mod domain;
