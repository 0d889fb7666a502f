//! Dialogue log entries.

use serde::Serialize;

/// Who produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker<'a> {
    /// The human player.
    Player,
    /// Scene-setting and system text.
    Narrator,
    /// An NPC, by display name.
    Npc(&'a str),
}

/// One line in a conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DialogueEntry {
    /// A line the player typed or chose.
    Player {
        /// What was said.
        text: String,
    },
    /// Narration, optionally offering opening replies.
    Narrator {
        /// The narration.
        text: String,
        /// Suggested replies. Empty for plain narration.
        choices: Vec<String>,
    },
    /// An NPC's reply.
    Npc {
        /// The NPC's display name.
        speaker: String,
        /// What was said.
        text: String,
        /// Memories the engine drew on.
        memories: Vec<String>,
        /// Suggested next replies.
        choices: Vec<String>,
    },
}

impl DialogueEntry {
    /// A player line.
    pub fn player(text: impl Into<String>) -> Self {
        Self::Player { text: text.into() }
    }

    /// Plain narration.
    pub fn narrator(text: impl Into<String>) -> Self {
        Self::Narrator {
            text: text.into(),
            choices: Vec::new(),
        }
    }

    /// Who produced the entry.
    pub fn speaker(&self) -> Speaker<'_> {
        match self {
            Self::Player { .. } => Speaker::Player,
            Self::Narrator { .. } => Speaker::Narrator,
            Self::Npc { speaker, .. } => Speaker::Npc(speaker),
        }
    }

    /// The entry text.
    pub fn text(&self) -> &str {
        match self {
            Self::Player { text } | Self::Narrator { text, .. } | Self::Npc { text, .. } => text,
        }
    }

    /// Suggested replies carried by the entry.
    pub fn choices(&self) -> &[String] {
        match self {
            Self::Player { .. } => &[],
            Self::Narrator { choices, .. } | Self::Npc { choices, .. } => choices,
        }
    }

    /// Memories carried by the entry.
    pub fn memories(&self) -> &[String] {
        match self {
            Self::Npc { memories, .. } => memories,
            Self::Player { .. } | Self::Narrator { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_expose_only_their_own_extras() {
        let player = DialogueEntry::player("hello");
        let npc = DialogueEntry::Npc {
            speaker: "Aldric".to_owned(),
            text: "Welcome.".to_owned(),
            memories: vec!["We met before.".to_owned()],
            choices: vec!["Thanks.".to_owned()],
        };

        assert_eq!(player.speaker(), Speaker::Player);
        assert!(player.choices().is_empty());
        assert!(player.memories().is_empty());
        assert_eq!(npc.speaker(), Speaker::Npc("Aldric"));
        assert_eq!(npc.text(), "Welcome.");
        assert_eq!(npc.memories().len(), 1);
        assert_eq!(npc.choices(), ["Thanks.".to_owned()]);
    }

    #[test]
    fn test_entries_serialize_with_kind_tag() {
        let json = serde_json::to_value(DialogueEntry::narrator("Rain falls.")).unwrap();

        assert_eq!(json["kind"], "narrator");
        assert_eq!(json["text"], "Rain falls.");
    }
}
