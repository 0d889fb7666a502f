//! Line-oriented terminal front end.
//!
//! Input lines starting with `/` are commands; anything else is said to the
//! current NPC. Output is computed as the difference between two successive
//! [`GameView`]s so only new lines are printed.

use lorekeeper_core::model::ScenarioSummary;
use lorekeeper_dialogue::domain::entry::{DialogueEntry, Speaker};
use lorekeeper_narrative::domain::phase::Phase;
use lorekeeper_narrative::domain::player::PlaybackView;
use lorekeeper_world_state::domain::sync_store::WorldView;

use crate::orchestrator::{Command, GameView};

/// Number of events listed by `/world`.
pub const RECENT_EVENT_LIMIT: usize = 4;

/// Help text for the game screen.
pub const HELP: &str = "\
/npcs              list who is here
/talk <n|id>       talk to someone
/back              step away
/choose <n>        pick a suggested reply
/wait              let time pass
/continue          continue the story (or press enter)
/replay            show the current scene again
/world             describe the world
/switch            pick another scenario
/quit              leave
anything else      say it";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Forward to the orchestrator.
    Command(Command),
    /// Talk to an NPC by list position (1-based) or id.
    Talk(String),
    /// Print the NPC list.
    Npcs,
    /// Print the world summary.
    World,
    /// Print help.
    Help,
    /// Leave the scenario and choose another.
    Switch,
    /// Exit.
    Quit,
    /// Blank line.
    Empty,
    /// A command that was not understood.
    Unknown(String),
}

/// Parses one line of input.
pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Input::Command(Command::Say(line.to_owned()));
    };
    let (verb, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(verb, arg)| (verb, arg.trim()));

    match (verb.to_ascii_lowercase().as_str(), arg) {
        ("talk", id) if !id.is_empty() => Input::Talk(id.to_owned()),
        ("back", _) => Input::Command(Command::LeaveNpc),
        ("choose", n) => n
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .map_or_else(
                || Input::Unknown(line.to_owned()),
                |index| Input::Command(Command::Choose(index)),
            ),
        ("wait", _) => Input::Command(Command::PassTime),
        ("continue", _) => Input::Command(Command::Continue),
        ("replay", _) => Input::Command(Command::ReplayPhase),
        ("npcs", _) => Input::Npcs,
        ("world", _) => Input::World,
        ("help", _) => Input::Help,
        ("switch", _) => Input::Switch,
        ("quit" | "exit", _) => Input::Quit,
        _ => Input::Unknown(line.to_owned()),
    }
}

/// Resolves a `/talk` argument to an NPC id.
pub fn resolve_npc(world: &WorldView, target: &str) -> Option<String> {
    if let Some(npc) = target
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| world.npcs.get(index))
    {
        return Some(npc.id.clone());
    }
    world
        .npcs
        .iter()
        .find(|npc| npc.id == target || npc.name().eq_ignore_ascii_case(target))
        .map(|npc| npc.id.clone())
}

/// One dialogue entry as printed, followed by the memories it drew on.
pub fn render_entry(entry: &DialogueEntry) -> Vec<String> {
    let text = entry.text();
    let mut lines = vec![match entry.speaker() {
        Speaker::Player => format!("> {text}"),
        Speaker::Narrator => format!("  {text}"),
        Speaker::Npc(name) => format!("{name}: {text}"),
    }];
    lines.extend(entry.memories().iter().map(|m| format!("    ~ recalls: {m}")));
    lines
}

/// Numbered suggested replies.
pub fn render_choices(choices: &[String]) -> Vec<String> {
    choices
        .iter()
        .enumerate()
        .map(|(i, choice)| format!("  [{}] {choice}", i + 1))
        .collect()
}

/// The NPC list.
pub fn render_npcs(world: &WorldView) -> Vec<String> {
    world
        .npcs
        .iter()
        .enumerate()
        .map(|(i, npc)| {
            let goal = npc.personality.goals.first().map_or("", String::as_str);
            let mood = if npc.is_neutral() {
                String::new()
            } else {
                format!(" [{}]", npc.current_mood)
            };
            format!(
                "  {}. {} the {}{mood} {goal}",
                i + 1,
                npc.name(),
                npc.personality.role,
            )
        })
        .collect()
}

/// The world summary: clock, description and recent events.
pub fn render_world(world: &WorldView) -> Vec<String> {
    let snapshot = &world.snapshot;
    let mut lines = vec![
        format!("Day {} · Hour {}", snapshot.day(), snapshot.hour_of_day()),
        snapshot.description.clone(),
    ];
    let events = world.recent_events(RECENT_EVENT_LIMIT);
    if !events.is_empty() {
        lines.push("Recent events:".to_owned());
        lines.extend(events.iter().map(|e| format!("  · {}", e.description)));
    }
    lines
}

/// The scenario list.
pub fn render_scenarios(scenarios: &[ScenarioSummary]) -> Vec<String> {
    scenarios
        .iter()
        .enumerate()
        .map(|(i, s)| format!("  {}. {} ({}) - {}", i + 1, s.name, s.genre, s.tagline))
        .collect()
}

/// Lines to print when moving from `previous` to `next`.
pub fn render_changes(previous: &GameView, next: &GameView) -> Vec<String> {
    let mut lines = Vec::new();

    let hours = |view: &GameView| view.world.as_ref().map(|w| w.snapshot.hours_passed);
    if let (Some(before), Some(world)) = (hours(previous), next.world.as_ref())
        && Some(before) != hours(next)
    {
        lines.push(format!(
            "-- Day {} · Hour {} --",
            world.snapshot.day(),
            world.snapshot.hour_of_day()
        ));
    }

    let continues = next.npc_id == previous.npc_id
        && next.dialogue.len() >= previous.dialogue.len()
        && next.dialogue.starts_with(&previous.dialogue);
    let fresh = if continues {
        &next.dialogue[previous.dialogue.len()..]
    } else {
        &next.dialogue[..]
    };
    lines.extend(fresh.iter().flat_map(render_entry));
    if !fresh.is_empty() {
        lines.extend(render_choices(&next.choices));
    }

    if let Some(playback) = &next.playback {
        lines.extend(render_playback(
            previous.playback.as_ref(),
            playback,
            next.world.as_deref(),
        ));
    }
    lines
}

fn render_playback(
    previous: Option<&PlaybackView>,
    next: &PlaybackView,
    world: Option<&WorldView>,
) -> Vec<String> {
    // A replay re-enters the same phase, so entries tells it apart.
    let same_entry = previous.filter(|p| {
        p.playback_id == next.playback_id && p.phase == next.phase && p.entries == next.entries
    });
    let content_new = next.content_visible && !same_entry.is_some_and(|p| p.content_visible);
    let continue_new = next.continue_visible && !same_entry.is_some_and(|p| p.continue_visible);

    let mut lines = Vec::new();
    if content_new {
        lines.extend(render_phase(next, world));
    }
    if continue_new {
        lines.push("  (press enter to continue)".to_owned());
    }
    lines
}

fn render_phase(playback: &PlaybackView, world: Option<&WorldView>) -> Vec<String> {
    let name = |id: &str| {
        world
            .map_or(id, |w| w.npc_name(id))
            .to_owned()
    };
    match playback.phase {
        Phase::Recap => {
            let mut lines = vec!["== While you were away... ==".to_owned()];
            if let Some(recap) = &playback.recap {
                lines.push(recap.summary.clone());
                lines.extend(recap.key_moments.iter().map(|m| format!("  * {m}")));
            }
            lines
        }
        Phase::Event => {
            let mut lines = vec![
                "== Time passes ==".to_owned(),
                playback.result.event.description.clone(),
            ];
            lines.extend(
                playback
                    .result
                    .npc_reactions
                    .iter()
                    .map(|(id, reaction)| format!("  {}: {reaction}", name(id))),
            );
            lines
        }
        Phase::Gossip => {
            let mut lines = vec!["== Whispers ==".to_owned()];
            lines.extend(playback.result.gossip.iter().map(|g| {
                format!("  {} -> {}: {}", name(&g.from_npc), name(&g.to_npc), g.content)
            }));
            lines
        }
        Phase::Done => Vec::new(),
    }
}
