//! Fixture builders for backend models.

use chrono::NaiveDate;
use lorekeeper_core::model::{
    ChatReply, GossipItem, NarrativeRecap, Npc, NpcPersonality, ScenarioSummary,
    SimulationResult, WorldEvent, WorldSnapshot,
};

/// A world snapshot at `hours_passed`.
#[must_use]
pub fn snapshot(hours_passed: u64) -> WorldSnapshot {
    WorldSnapshot {
        description: "A quiet trading post at the edge of the Ashwood.".to_owned(),
        recent_events: vec![],
        hours_passed,
    }
}

/// An NPC with a single goal and neutral mood.
#[must_use]
pub fn npc(id: &str, name: &str, role: &str) -> Npc {
    Npc {
        id: id.to_owned(),
        personality: NpcPersonality {
            name: name.to_owned(),
            role: role.to_owned(),
            backstory: format!("{name} has lived here for years."),
            goals: vec![format!("keep the {role} trade alive")],
        },
        current_mood: "neutral".to_owned(),
    }
}

/// The two-NPC cast used across tests.
#[must_use]
pub fn cast() -> Vec<Npc> {
    vec![
        npc("aldric", "Aldric", "merchant"),
        npc("mira", "Blacksmith Mira", "blacksmith"),
    ]
}

/// A world event with a fixed timestamp.
///
/// # Panics
///
/// Never; the fixed date is valid.
#[must_use]
pub fn event(id: &str, description: &str) -> WorldEvent {
    WorldEvent {
        id: id.to_owned(),
        description: description.to_owned(),
        timestamp: NaiveDate::from_ymd_opt(2026, 1, 15)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap(),
        affected_npc_ids: vec!["aldric".to_owned()],
    }
}

/// A simulation result with one reaction and `gossip_count` gossip items.
#[must_use]
pub fn simulation_result(description: &str, gossip_count: usize) -> SimulationResult {
    let npc_reactions = vec![("aldric".to_owned(), "Aldric bars the shop door.".to_owned())];
    let gossip = (0..gossip_count)
        .map(|i| GossipItem {
            from_npc: "aldric".to_owned(),
            to_npc: "mira".to_owned(),
            content: format!("rumour {i}"),
        })
        .collect();
    SimulationResult {
        event: event("sim-event", description),
        npc_reactions,
        gossip,
    }
}

/// A recap with one key moment.
#[must_use]
pub fn recap(summary: &str) -> NarrativeRecap {
    NarrativeRecap {
        summary: summary.to_owned(),
        key_moments: vec!["The northern road closed.".to_owned()],
    }
}

/// A chat reply from `npc_id` with one memory and the given choices.
#[must_use]
pub fn chat_reply(npc_id: &str, text: &str, choices: &[&str]) -> ChatReply {
    ChatReply {
        npc_id: npc_id.to_owned(),
        npc_dialogue: text.to_owned(),
        memories_retrieved: vec!["The player asked about the roads.".to_owned()],
        choices: choices.iter().map(|c| (*c).to_owned()).collect(),
    }
}

/// A scenario summary.
#[must_use]
pub fn scenario(id: &str, name: &str) -> ScenarioSummary {
    ScenarioSummary {
        id: id.to_owned(),
        name: name.to_owned(),
        genre: "Fantasy".to_owned(),
        tagline: "Bandits at the gates.".to_owned(),
    }
}
