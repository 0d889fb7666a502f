//! Playback phases and reveal timing.

use std::time::Duration;

use lorekeeper_core::model::{NarrativeRecap, SimulationResult};
use serde::Serialize;

/// A stage of cinematic playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// "While you were away..." summary.
    Recap,
    /// The simulated event and NPC reactions.
    Event,
    /// NPC-to-NPC gossip.
    Gossip,
    /// Playback finished.
    Done,
}

impl Phase {
    /// The phase playback starts in.
    pub fn initial(recap: Option<&NarrativeRecap>) -> Self {
        if recap.is_some_and(NarrativeRecap::is_presentable) {
            Self::Recap
        } else {
            Self::Event
        }
    }

    /// The phase a "continue" leads to.
    pub const fn next(self, has_gossip: bool) -> Self {
        match self {
            Self::Recap => Self::Event,
            Self::Event if has_gossip => Self::Gossip,
            Self::Event | Self::Gossip | Self::Done => Self::Done,
        }
    }
}

/// Delays driving the reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTiming {
    /// Pause between entering a phase and showing its content.
    pub entry_delay: Duration,
    /// Reading time per character of phase text.
    pub per_character: Duration,
    /// Reading time added to every text-proportional delay.
    pub base_delay: Duration,
    /// Fixed reading time for the gossip phase.
    pub gossip_delay: Duration,
    /// Offset between consecutive reaction or gossip items.
    pub item_stagger: Duration,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            entry_delay: Duration::from_millis(500),
            per_character: Duration::from_millis(35),
            base_delay: Duration::from_millis(2000),
            gossip_delay: Duration::from_millis(2000),
            item_stagger: Duration::from_millis(300),
        }
    }
}

impl PlaybackTiming {
    /// How long after content appears the continue affordance may appear.
    pub fn continue_delay(
        &self,
        phase: Phase,
        result: &SimulationResult,
        recap: Option<&NarrativeRecap>,
    ) -> Duration {
        match phase {
            Phase::Recap => self.reading_time(recap.map_or("", |r| r.summary.as_str())),
            Phase::Event => self.reading_time(&result.event.description),
            Phase::Gossip => self.gossip_delay,
            Phase::Done => Duration::ZERO,
        }
    }

    /// Presentation offsets for `count` staggered items.
    pub fn item_offsets(&self, count: usize) -> Vec<Duration> {
        (0..count)
            .map(|index| {
                self.item_stagger
                    .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
            })
            .collect()
    }

    fn reading_time(&self, text: &str) -> Duration {
        let length = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        self.per_character
            .saturating_mul(length)
            .saturating_add(self.base_delay)
    }
}
