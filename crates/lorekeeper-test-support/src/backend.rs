//! Scriptable `GameBackend` implementation for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lorekeeper_core::backend::GameBackend;
use lorekeeper_core::error::DomainError;
use lorekeeper_core::model::{
    ChatReply, NarrativeRecap, Npc, ScenarioSummary, SimulationResult, StarterPrompts, WorldEvent,
    WorldSnapshot,
};
use tokio::sync::Notify;

use crate::fixtures;

/// A backend whose responses are queued up front by the test.
///
/// Every call is counted under its operation name (`"get_world"`, `"chat"`,
/// `"simulate"`, ...) before it resolves, so tests can observe requests that
/// are still in flight. `hold_chat` and `hold_simulate` install a gate that
/// keeps each subsequent call pending until the test releases it with
/// `Notify::notify_one`.
#[derive(Debug)]
pub struct ScriptedBackend {
    world: Mutex<WorldSnapshot>,
    world_failing: AtomicBool,
    npcs: Mutex<Vec<Npc>>,
    events: Mutex<Vec<WorldEvent>>,
    chat_replies: Mutex<VecDeque<Result<ChatReply, DomainError>>>,
    simulations: Mutex<VecDeque<Result<SimulationResult, DomainError>>>,
    recap: Mutex<Result<NarrativeRecap, DomainError>>,
    scenarios: Mutex<Vec<ScenarioSummary>>,
    activation: Mutex<Result<(), DomainError>>,
    starters: Mutex<Result<StarterPrompts, DomainError>>,
    chat_gate: Mutex<Option<Arc<Notify>>>,
    simulate_gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    chat_log: Mutex<Vec<(String, String)>>,
    activated: Mutex<Vec<String>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// A backend at hour 0 with the fixture cast, no events, an empty recap
    /// and nothing queued for chat or simulate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            world: Mutex::new(fixtures::snapshot(0)),
            world_failing: AtomicBool::new(false),
            npcs: Mutex::new(fixtures::cast()),
            events: Mutex::new(Vec::new()),
            chat_replies: Mutex::new(VecDeque::new()),
            simulations: Mutex::new(VecDeque::new()),
            recap: Mutex::new(Ok(NarrativeRecap::default())),
            scenarios: Mutex::new(Vec::new()),
            activation: Mutex::new(Ok(())),
            starters: Mutex::new(Ok(StarterPrompts::new())),
            chat_gate: Mutex::new(None),
            simulate_gate: Mutex::new(None),
            calls: Mutex::new(HashMap::new()),
            chat_log: Mutex::new(Vec::new()),
            activated: Mutex::new(Vec::new()),
        }
    }

    /// Replace the world snapshot returned by `get_world`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_world(&self, snapshot: WorldSnapshot) {
        *self.world.lock().unwrap() = snapshot;
    }

    /// Set only the hours counter of the world snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_hours(&self, hours_passed: u64) {
        self.world.lock().unwrap().hours_passed = hours_passed;
    }

    /// Make `get_world` fail (or succeed again).
    pub fn fail_world(&self, failing: bool) {
        self.world_failing.store(failing, Ordering::SeqCst);
    }

    /// Replace the event log returned by `get_events`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_events(&self, events: Vec<WorldEvent>) {
        *self.events.lock().unwrap() = events;
    }

    /// Queue the outcome of the next `chat` call. When the queue is empty,
    /// `chat` answers with a generic line.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push_chat(&self, outcome: Result<ChatReply, DomainError>) {
        self.chat_replies.lock().unwrap().push_back(outcome);
    }

    /// Queue the outcome of the next `simulate` call. When the queue is
    /// empty, `simulate` fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push_simulation(&self, outcome: Result<SimulationResult, DomainError>) {
        self.simulations.lock().unwrap().push_back(outcome);
    }

    /// Set the outcome of every `get_recap` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_recap(&self, outcome: Result<NarrativeRecap, DomainError>) {
        *self.recap.lock().unwrap() = outcome;
    }

    /// Set the scenarios returned by `list_scenarios`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_scenarios(&self, scenarios: Vec<ScenarioSummary>) {
        *self.scenarios.lock().unwrap() = scenarios;
    }

    /// Set the outcome of every `activate_scenario` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_activation(&self, outcome: Result<(), DomainError>) {
        *self.activation.lock().unwrap() = outcome;
    }

    /// Set the outcome of every `get_starters` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_starters(&self, outcome: Result<StarterPrompts, DomainError>) {
        *self.starters.lock().unwrap() = outcome;
    }

    /// Hold every following `chat` call until the returned gate is notified.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn hold_chat(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.chat_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Hold every following `simulate` call until the returned gate is
    /// notified.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn hold_simulate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.simulate_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Number of calls made to `operation` so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    /// Every `(npc_id, message)` pair sent through `chat`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn chat_messages(&self) -> Vec<(String, String)> {
        self.chat_log.lock().unwrap().clone()
    }

    /// Every scenario id passed to `activate_scenario`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn activated(&self) -> Vec<String> {
        self.activated.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str) {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
    }

    async fn pass_gate(gate: &Mutex<Option<Arc<Notify>>>) {
        let gate = gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl GameBackend for ScriptedBackend {
    async fn get_world(&self) -> Result<WorldSnapshot, DomainError> {
        self.record("get_world");
        if self.world_failing.load(Ordering::SeqCst) {
            return Err(DomainError::backend("get_world", "connection refused"));
        }
        Ok(self.world.lock().unwrap().clone())
    }

    async fn get_npcs(&self) -> Result<Vec<Npc>, DomainError> {
        self.record("get_npcs");
        Ok(self.npcs.lock().unwrap().clone())
    }

    async fn get_events(&self) -> Result<Vec<WorldEvent>, DomainError> {
        self.record("get_events");
        Ok(self.events.lock().unwrap().clone())
    }

    async fn chat(&self, npc_id: &str, message: &str) -> Result<ChatReply, DomainError> {
        self.record("chat");
        self.chat_log
            .lock()
            .unwrap()
            .push((npc_id.to_owned(), message.to_owned()));
        Self::pass_gate(&self.chat_gate).await;
        let scripted = self.chat_replies.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(fixtures::chat_reply(npc_id, "Hm. Go on.", &[])))
    }

    async fn simulate(&self) -> Result<SimulationResult, DomainError> {
        self.record("simulate");
        Self::pass_gate(&self.simulate_gate).await;
        let scripted = self.simulations.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Err(DomainError::backend("simulate", "no worker running")))
    }

    async fn get_recap(&self) -> Result<NarrativeRecap, DomainError> {
        self.record("get_recap");
        self.recap.lock().unwrap().clone()
    }

    async fn list_scenarios(&self) -> Result<Vec<ScenarioSummary>, DomainError> {
        self.record("list_scenarios");
        Ok(self.scenarios.lock().unwrap().clone())
    }

    async fn activate_scenario(&self, scenario_id: &str) -> Result<(), DomainError> {
        self.record("activate_scenario");
        self.activated.lock().unwrap().push(scenario_id.to_owned());
        self.activation.lock().unwrap().clone()
    }

    async fn get_starters(&self) -> Result<StarterPrompts, DomainError> {
        self.record("get_starters");
        self.starters.lock().unwrap().clone()
    }
}
