//! A conversation with one NPC.

use lorekeeper_core::error::DomainError;
use lorekeeper_core::model::{ChatReply, Npc};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::entry::DialogueEntry;

/// Why a message was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejected {
    /// A request for this session is still outstanding.
    #[error("a reply is still pending")]
    Busy,
    /// The message was empty or whitespace.
    #[error("message is empty")]
    Empty,
    /// No NPC is selected.
    #[error("no one to talk to")]
    Disabled,
    /// The chosen reply index does not exist on the last entry.
    #[error("no such choice")]
    NoSuchChoice,
}

/// A chat request the session has committed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Identity of the session that issued the request.
    pub session_id: Uuid,
    /// Correlation id for tracing the request.
    pub correlation_id: Uuid,
    /// Target NPC.
    pub npc_id: String,
    /// Trimmed player message.
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    npc_id: String,
    npc_name: String,
}

/// The active conversation log plus its single-flight guard.
///
/// Every session gets a fresh identity. Replies are matched against it, so a
/// reply for a session that has since been replaced is dropped.
#[derive(Debug, Clone)]
pub struct DialogueSession {
    id: Uuid,
    target: Option<Target>,
    entries: Vec<DialogueEntry>,
    pending: Option<Uuid>,
}

impl DialogueSession {
    /// Starts a conversation with `npc`, seeded with suggested opening lines.
    pub fn start(npc: &Npc, opening_choices: Vec<String>) -> Self {
        let intro = DialogueEntry::Narrator {
            text: format!(
                "You approach {}, the {}.",
                npc.personality.name, npc.personality.role
            ),
            choices: opening_choices,
        };
        Self {
            id: Uuid::new_v4(),
            target: Some(Target {
                npc_id: npc.id.clone(),
                npc_name: npc.personality.name.clone(),
            }),
            entries: vec![intro],
            pending: None,
        }
    }

    /// A session with no NPC selected. It accepts narration but no messages.
    pub fn ambient(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target: None,
            entries: vec![DialogueEntry::narrator(text)],
            pending: None,
        }
    }

    /// Session identity.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The NPC being spoken to, if any.
    pub fn npc_id(&self) -> Option<&str> {
        self.target.as_ref().map(|t| t.npc_id.as_str())
    }

    /// The NPC's display name, if any.
    pub fn npc_name(&self) -> Option<&str> {
        self.target.as_ref().map(|t| t.npc_name.as_str())
    }

    /// Whether messages can be sent.
    pub const fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Whether a reply is outstanding.
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The log, oldest first.
    pub fn entries(&self) -> &[DialogueEntry] {
        &self.entries
    }

    /// Replies the player can pick right now. Hidden while a reply is pending.
    pub fn available_choices(&self) -> &[String] {
        if self.is_pending() {
            return &[];
        }
        match self.entries.last() {
            Some(entry) => entry.choices(),
            None => &[],
        }
    }

    /// Appends narration without touching the guard.
    pub fn narrate(&mut self, text: impl Into<String>) {
        self.entries.push(DialogueEntry::narrator(text));
    }

    /// Appends the player's line and raises the guard.
    ///
    /// # Errors
    ///
    /// Returns `SendRejected` without changing anything when the session is
    /// disabled, busy, or `message` is blank.
    pub fn begin_send(&mut self, message: &str) -> Result<ChatRequest, SendRejected> {
        let Some(target) = &self.target else {
            return Err(SendRejected::Disabled);
        };
        if self.pending.is_some() {
            return Err(SendRejected::Busy);
        }
        let message = message.trim();
        if message.is_empty() {
            return Err(SendRejected::Empty);
        }

        let correlation_id = Uuid::new_v4();
        let request = ChatRequest {
            session_id: self.id,
            correlation_id,
            npc_id: target.npc_id.clone(),
            message: message.to_owned(),
        };
        self.entries.push(DialogueEntry::player(message));
        self.pending = Some(correlation_id);
        debug!(session_id = %self.id, %correlation_id, "chat request started");
        Ok(request)
    }

    /// Sends the `index`-th suggested reply of the last entry.
    ///
    /// # Errors
    ///
    /// Returns `SendRejected::NoSuchChoice` for an index the last entry does
    /// not offer, or any rejection of [`DialogueSession::begin_send`].
    pub fn choose(&mut self, index: usize) -> Result<ChatRequest, SendRejected> {
        if !self.is_enabled() {
            return Err(SendRejected::Disabled);
        }
        if self.is_pending() {
            return Err(SendRejected::Busy);
        }
        let choice = self
            .available_choices()
            .get(index)
            .cloned()
            .ok_or(SendRejected::NoSuchChoice)?;
        self.begin_send(&choice)
    }

    /// Applies the outcome of `request` and lowers the guard.
    ///
    /// Returns `false` and changes nothing when `request` belongs to another
    /// session or is not the outstanding request. Failures become a narrator
    /// fallback line; they never disable the session.
    pub fn complete(
        &mut self,
        request: &ChatRequest,
        outcome: Result<ChatReply, DomainError>,
    ) -> bool {
        if request.session_id != self.id || self.pending != Some(request.correlation_id) {
            debug!(
                session_id = %request.session_id,
                correlation_id = %request.correlation_id,
                "dropping stale chat reply"
            );
            return false;
        }
        self.pending = None;

        let speaker = self.npc_name().unwrap_or("The NPC").to_owned();
        match outcome {
            Ok(reply) => self.entries.push(DialogueEntry::Npc {
                speaker,
                text: reply.npc_dialogue,
                memories: reply.memories_retrieved,
                choices: reply.choices,
            }),
            Err(error) => {
                warn!(%error, correlation_id = %request.correlation_id, "chat failed");
                self.narrate(format!("{speaker} doesn't respond..."));
            }
        }
        true
    }
}
