//! Wire models exchanged with the game backend.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Suggested opening lines for the active scenario, keyed by NPC id.
pub type StarterPrompts = HashMap<String, Vec<String>>;

/// The narrative state of the world at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Free-text description of the setting.
    pub description: String,
    /// Short descriptions of recent happenings, oldest first.
    #[serde(default)]
    pub recent_events: Vec<String>,
    /// Hours elapsed since the scenario began. Never decreases.
    #[serde(default)]
    pub hours_passed: u64,
}

impl WorldSnapshot {
    /// The 1-based in-world day.
    pub const fn day(&self) -> u64 {
        self.hours_passed / 24 + 1
    }

    /// Hour within the current day, `0..24`.
    pub const fn hour_of_day(&self) -> u64 {
        self.hours_passed % 24
    }
}

/// Static character sheet of an NPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcPersonality {
    /// Display name.
    pub name: String,
    /// Occupation or archetype, e.g. "blacksmith".
    pub role: String,
    /// Background narrative.
    pub backstory: String,
    /// Goals in priority order.
    #[serde(default)]
    pub goals: Vec<String>,
}

/// A non-player character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    /// Unique identifier.
    pub id: String,
    /// Character sheet.
    pub personality: NpcPersonality,
    /// Current mood as reported by the backend.
    #[serde(default = "default_mood")]
    pub current_mood: String,
}

impl Npc {
    /// Display name of the NPC.
    pub fn name(&self) -> &str {
        &self.personality.name
    }

    /// Whether the NPC is in its resting mood.
    pub fn is_neutral(&self) -> bool {
        self.current_mood == "neutral"
    }
}

fn default_mood() -> String {
    "neutral".to_owned()
}

/// An entry in the append-only world history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldEvent {
    /// Unique identifier.
    pub id: String,
    /// Narrated description of what happened.
    pub description: String,
    /// When the event happened (backend local time, no offset).
    pub timestamp: NaiveDateTime,
    /// NPCs touched by the event.
    #[serde(default)]
    pub affected_npc_ids: Vec<String>,
}

/// Information passed from one NPC to another during a simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GossipItem {
    /// Speaking NPC id.
    pub from_npc: String,
    /// Listening NPC id.
    pub to_npc: String,
    /// What was said.
    pub content: String,
}

/// Outcome of one "advance time" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// The event that occurred.
    pub event: WorldEvent,
    /// Each affected NPC's reaction as `(npc id, reaction)`, in the order
    /// the backend listed them.
    #[serde(default, with = "ordered_pairs")]
    pub npc_reactions: Vec<(String, String)>,
    /// NPC-to-NPC exchanges, in order. May be empty.
    #[serde(default)]
    pub gossip: Vec<GossipItem>,
}

impl SimulationResult {
    /// Whether the result carries any gossip to play back.
    pub fn has_gossip(&self) -> bool {
        !self.gossip.is_empty()
    }

    /// The reaction of `npc_id`, if it reacted.
    pub fn reaction(&self, npc_id: &str) -> Option<&str> {
        self.npc_reactions
            .iter()
            .find(|(id, _)| id == npc_id)
            .map(|(_, reaction)| reaction.as_str())
    }
}

/// A JSON object read into key/value pairs without reordering its keys.
mod ordered_pairs {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        pairs: &[(String, String)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(pairs.len()))?;
        for (key, value) in pairs {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, String)>, D::Error> {
        deserializer.deserialize_map(PairsVisitor)
    }

    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object of string values")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(pair) = access.next_entry()? {
                pairs.push(pair);
            }
            Ok(pairs)
        }
    }
}

/// Optional narrative summary of what happened since the last visit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeRecap {
    /// Prose summary. May be empty.
    #[serde(default)]
    pub summary: String,
    /// Highlighted beats. May be empty.
    #[serde(default)]
    pub key_moments: Vec<String>,
}

impl NarrativeRecap {
    /// A recap is worth showing only with a summary and at least one moment.
    /// A whitespace-only summary counts as empty.
    pub fn is_presentable(&self) -> bool {
        !self.summary.trim().is_empty() && !self.key_moments.is_empty()
    }
}

/// An NPC's answer to a player message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// The NPC that answered.
    pub npc_id: String,
    /// What the NPC said.
    pub npc_dialogue: String,
    /// Memories the engine retrieved while composing the answer.
    #[serde(default)]
    pub memories_retrieved: Vec<String>,
    /// Suggested next replies for the player.
    #[serde(default)]
    pub choices: Vec<String>,
}

/// A scenario the backend can host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    /// Scenario identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Genre label, e.g. "Fantasy".
    pub genre: String,
    /// One-line hook.
    pub tagline: String,
}
