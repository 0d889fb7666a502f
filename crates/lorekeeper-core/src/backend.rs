//! Game backend port.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::model::{
    ChatReply, NarrativeRecap, Npc, ScenarioSummary, SimulationResult, StarterPrompts, WorldEvent,
    WorldSnapshot,
};

/// The remote dialogue/simulation engine the client talks to.
///
/// Implementations must be cheap to share behind an `Arc`; the orchestrator
/// calls them from spawned tasks.
#[async_trait]
pub trait GameBackend: Send + Sync {
    /// Fetch the current world snapshot.
    async fn get_world(&self) -> Result<WorldSnapshot, DomainError>;

    /// Fetch every NPC, in backend order.
    async fn get_npcs(&self) -> Result<Vec<Npc>, DomainError>;

    /// Fetch the historical event log, newest first.
    async fn get_events(&self) -> Result<Vec<WorldEvent>, DomainError>;

    /// Send a player message to an NPC and return its reply.
    async fn chat(&self, npc_id: &str, message: &str) -> Result<ChatReply, DomainError>;

    /// Advance world time and return the simulated outcome.
    async fn simulate(&self) -> Result<SimulationResult, DomainError>;

    /// Fetch a narrative recap of recent events. May be empty.
    async fn get_recap(&self) -> Result<NarrativeRecap, DomainError>;

    /// List the scenarios the backend can host.
    async fn list_scenarios(&self) -> Result<Vec<ScenarioSummary>, DomainError>;

    /// Make a scenario the active world.
    async fn activate_scenario(&self, scenario_id: &str) -> Result<(), DomainError>;

    /// Fetch suggested opening lines for the active scenario, keyed by NPC id.
    async fn get_starters(&self) -> Result<StarterPrompts, DomainError>;
}
