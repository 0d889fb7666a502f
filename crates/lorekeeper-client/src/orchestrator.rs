//! The game orchestrator.
//!
//! One task owns every piece of client state: the world view, the active
//! dialogue session, the simulation guard, the cinematic player and the
//! background poller. Commands, backend results, poll ticks and playback
//! timer firings all arrive as messages on one channel and are applied in
//! order, so no state is ever shared between tasks. Backend calls run in
//! spawned tasks that post their result back as a message.
//!
//! The UI observes a [`GameView`] through a `watch` channel.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use lorekeeper_core::backend::GameBackend;
use lorekeeper_core::error::DomainError;
use lorekeeper_core::model::{ChatReply, StarterPrompts};
use lorekeeper_dialogue::application::exchange::exchange;
use lorekeeper_dialogue::domain::entry::DialogueEntry;
use lorekeeper_dialogue::domain::session::{ChatRequest, DialogueSession, SendRejected};
use lorekeeper_narrative::application::simulate::run_simulation;
use lorekeeper_narrative::domain::coordinator::{Settled, SimulationCoordinator, SimulationOutcome};
use lorekeeper_narrative::domain::phase::PlaybackTiming;
use lorekeeper_narrative::domain::player::{
    Advance, CinematicPlayer, PlaybackView, TimerFired, TimerSink,
};
use lorekeeper_world_state::application::poller::{
    BackgroundPoller, DEFAULT_POLL_INTERVAL, apply_poll,
};
use lorekeeper_world_state::application::refresh::fetch_world_view;
use lorekeeper_world_state::domain::sync_store::{WorldSyncStore, WorldView};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;

/// Narrator line after stepping away from an NPC.
pub const STEP_BACK_TEXT: &str = "You step back and survey your surroundings.";
/// Narrator line when a poll finds that world time moved.
pub const WORLD_SHIFTED_TEXT: &str = "The world has shifted while you were occupied.";
/// Narrator line when the initial world load fails.
pub const LOAD_FAILED_TEXT: &str = "The world is shrouded in fog... (could not reach the backend)";

/// A player action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start talking to the NPC with this id.
    SelectNpc(String),
    /// Stop talking to the current NPC.
    LeaveNpc,
    /// Say something to the current NPC.
    Say(String),
    /// Pick the n-th suggested reply.
    Choose(usize),
    /// Advance world time.
    PassTime,
    /// Continue past the current playback phase.
    Continue,
    /// Re-show the current playback phase.
    ReplayPhase,
    /// Stop the orchestrator.
    Shutdown,
}

/// Everything the UI renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameView {
    /// Latest known world, once loaded.
    pub world: Option<Arc<WorldView>>,
    /// The NPC being spoken to.
    pub npc_id: Option<String>,
    /// That NPC's display name.
    pub npc_name: Option<String>,
    /// The active dialogue log, oldest first.
    pub dialogue: Vec<DialogueEntry>,
    /// Suggested replies available right now.
    pub choices: Vec<String>,
    /// Whether messages can be sent.
    pub chat_enabled: bool,
    /// Whether a chat reply is outstanding.
    pub chat_pending: bool,
    /// Whether a simulation, its playback or its refresh is outstanding.
    pub simulating: bool,
    /// The playback overlay, while one is showing.
    pub playback: Option<PlaybackView>,
    /// Bumped on every published change.
    pub revision: u64,
}

/// Knobs for [`spawn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Playback reveal timing.
    pub timing: PlaybackTiming,
    /// Background poll period.
    pub poll_interval: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            timing: PlaybackTiming::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl From<&ClientConfig> for OrchestratorSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            timing: config.timing,
            poll_interval: config.poll_interval,
        }
    }
}

/// The orchestrator task is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the orchestrator has stopped")]
pub struct Stopped;

/// Owner-side handle to a running orchestrator.
#[derive(Debug)]
pub struct OrchestratorHandle {
    tx: mpsc::UnboundedSender<Message>,
    view: watch::Receiver<GameView>,
    task: JoinHandle<()>,
}

impl OrchestratorHandle {
    /// Queues a command.
    ///
    /// # Errors
    ///
    /// Returns `Stopped` if the orchestrator has shut down.
    pub fn send(&self, command: Command) -> Result<(), Stopped> {
        self.tx.send(Message::Command(command)).map_err(|_| Stopped)
    }

    /// A receiver that is notified of every published view.
    pub fn subscribe(&self) -> watch::Receiver<GameView> {
        self.view.clone()
    }

    /// The latest published view.
    pub fn view(&self) -> GameView {
        self.view.borrow().clone()
    }

    /// Stops the orchestrator and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.tx.send(Message::Command(Command::Shutdown));
        if let Err(error) = self.task.await {
            warn!(%error, "orchestrator task ended abnormally");
        }
    }
}

/// Starts the orchestrator: loads the world, fetches starter prompts and
/// begins polling.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the poll interval is zero.
pub fn spawn(
    backend: Arc<dyn GameBackend>,
    settings: OrchestratorSettings,
) -> Result<OrchestratorHandle, DomainError> {
    let poller = BackgroundPoller::new(settings.poll_interval)?;
    let (tx, rx) = mpsc::unbounded_channel();
    let (view_tx, view) = watch::channel(GameView::default());

    let weak = tx.downgrade();
    let sink: TimerSink = Arc::new(move |fired: TimerFired| {
        if let Some(tx) = weak.upgrade() {
            let _ = tx.send(Message::Timer(fired));
        }
    });

    let orchestrator = Orchestrator {
        backend,
        tx: tx.downgrade(),
        world: WorldSyncStore::new(),
        world_epoch: 0,
        session: DialogueSession::ambient("You arrive."),
        starters: StarterPrompts::new(),
        coordinator: SimulationCoordinator::new(),
        player: CinematicPlayer::new(settings.timing, sink),
        poller,
        poll_outstanding: false,
        view_tx,
    };
    let task = tokio::spawn(orchestrator.run(rx));
    Ok(OrchestratorHandle { tx, view, task })
}

#[derive(Debug)]
enum Message {
    Command(Command),
    Loaded(Result<WorldView, DomainError>),
    Starters(Result<StarterPrompts, DomainError>),
    ChatDone {
        request: ChatRequest,
        outcome: Result<ChatReply, DomainError>,
    },
    Simulated {
        correlation_id: Uuid,
        outcome: Result<SimulationOutcome, DomainError>,
    },
    Refreshed(Result<WorldView, DomainError>),
    PollTick,
    Polled {
        epoch: u64,
        outcome: Result<WorldView, DomainError>,
    },
    Timer(TimerFired),
}

struct Orchestrator {
    backend: Arc<dyn GameBackend>,
    tx: mpsc::WeakUnboundedSender<Message>,
    world: WorldSyncStore,
    world_epoch: u64,
    session: DialogueSession,
    starters: StarterPrompts,
    coordinator: SimulationCoordinator,
    player: CinematicPlayer,
    poller: BackgroundPoller,
    poll_outstanding: bool,
    view_tx: watch::Sender<GameView>,
}

impl Orchestrator {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Message>) {
        info!(poll_interval = ?self.poller.period(), "orchestrator started");
        self.start();
        self.publish();
        while let Some(message) = rx.recv().await {
            let flow = self.handle(message);
            self.publish();
            if flow.is_break() {
                break;
            }
        }
        self.poller.stop();
        self.player.stop();
        info!("orchestrator stopped");
    }

    fn start(&mut self) {
        self.spawn_call(|backend| async move {
            Message::Loaded(fetch_world_view(backend.as_ref()).await)
        });
        self.spawn_call(|backend| async move { Message::Starters(backend.get_starters().await) });

        let weak = self.tx.clone();
        self.poller.start(move || match weak.upgrade() {
            Some(tx) if tx.send(Message::PollTick).is_ok() => ControlFlow::Continue(()),
            _ => ControlFlow::Break(()),
        });
    }

    fn handle(&mut self, message: Message) -> ControlFlow<()> {
        match message {
            Message::Command(command) => return self.handle_command(command),
            Message::Loaded(outcome) => self.on_loaded(outcome),
            Message::Starters(Ok(starters)) => {
                debug!(npcs = starters.len(), "starter prompts loaded");
                self.starters = starters;
            }
            Message::Starters(Err(error)) => {
                warn!(%error, "starter prompts unavailable");
            }
            Message::ChatDone { request, outcome } => {
                self.session.complete(&request, outcome);
            }
            Message::Simulated {
                correlation_id,
                outcome,
            } => {
                if let Settled::Failed { notice } =
                    self.coordinator
                        .settle(correlation_id, outcome, &mut self.player)
                {
                    self.session.narrate(notice);
                }
            }
            Message::Refreshed(outcome) => {
                match outcome {
                    Ok(view) => {
                        self.world.replace(view);
                        self.world_epoch += 1;
                    }
                    Err(error) => warn!(%error, "post-simulation refresh failed"),
                }
                self.coordinator.finish();
            }
            Message::PollTick => self.on_poll_tick(),
            Message::Polled { epoch, outcome } => self.on_polled(epoch, outcome),
            Message::Timer(fired) => {
                self.player.on_timer(fired);
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        debug!(?command, "command received");
        match command {
            Command::SelectNpc(npc_id) => self.select_npc(&npc_id),
            Command::LeaveNpc => {
                self.session = DialogueSession::ambient(STEP_BACK_TEXT);
            }
            Command::Say(text) => {
                let request = self.session.begin_send(&text);
                self.dispatch_chat(request);
            }
            Command::Choose(index) => {
                let request = self.session.choose(index);
                self.dispatch_chat(request);
            }
            Command::PassTime => self.pass_time(),
            Command::Continue => self.advance_playback(),
            Command::ReplayPhase => {
                self.player.replay_phase();
            }
            Command::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn on_loaded(&mut self, outcome: Result<WorldView, DomainError>) {
        match outcome {
            Ok(view) => {
                let view = self.world.replace(view);
                self.world_epoch += 1;
                info!(
                    hours_passed = view.snapshot.hours_passed,
                    npcs = view.npcs.len(),
                    "world loaded"
                );
                self.session =
                    DialogueSession::ambient(format!("You arrive. {}", view.snapshot.description));
            }
            Err(error) => {
                warn!(%error, "initial world load failed");
                self.session.narrate(LOAD_FAILED_TEXT);
            }
        }
    }

    fn select_npc(&mut self, npc_id: &str) {
        let Some(view) = self.world.current() else {
            warn!(npc_id, "cannot select an NPC before the world has loaded");
            return;
        };
        let Some(npc) = view.npc(npc_id) else {
            warn!(npc_id, "ignoring selection of unknown NPC");
            return;
        };
        let openers = self.starters.get(npc_id).cloned().unwrap_or_default();
        self.session = DialogueSession::start(npc, openers);
        info!(npc_id, session_id = %self.session.id(), "dialogue session started");
    }

    fn dispatch_chat(&self, request: Result<ChatRequest, SendRejected>) {
        match request {
            Ok(request) => self.spawn_call(move |backend| async move {
                let outcome = exchange(backend.as_ref(), &request).await;
                Message::ChatDone { request, outcome }
            }),
            Err(rejected) => debug!(%rejected, "message not sent"),
        }
    }

    fn pass_time(&mut self) {
        let Some(correlation_id) = self.coordinator.begin() else {
            debug!("simulation already in flight");
            return;
        };
        self.spawn_call(move |backend| async move {
            let outcome = run_simulation(backend.as_ref(), correlation_id).await;
            Message::Simulated {
                correlation_id,
                outcome,
            }
        });
    }

    fn advance_playback(&mut self) {
        if let Advance::Completed(result) = self.player.advance() {
            let line = self.coordinator.playback_complete(&result);
            self.session.narrate(line);
            self.spawn_call(|backend| async move {
                Message::Refreshed(fetch_world_view(backend.as_ref()).await)
            });
        }
    }

    fn on_poll_tick(&mut self) {
        if self.coordinator.is_in_flight() {
            debug!("skipping poll while a simulation is in flight");
            return;
        }
        if self.poll_outstanding {
            debug!("skipping poll while the previous one is outstanding");
            return;
        }
        self.poll_outstanding = true;
        let epoch = self.world_epoch;
        self.spawn_call(move |backend| async move {
            Message::Polled {
                epoch,
                outcome: fetch_world_view(backend.as_ref()).await,
            }
        });
    }

    fn on_polled(&mut self, epoch: u64, outcome: Result<WorldView, DomainError>) {
        self.poll_outstanding = false;
        if epoch != self.world_epoch || self.coordinator.is_in_flight() {
            debug!("discarding poll overtaken by a newer refresh");
            return;
        }
        if apply_poll(&mut self.world, outcome).should_notify() {
            self.world_epoch += 1;
            self.session.narrate(WORLD_SHIFTED_TEXT);
        }
    }

    fn spawn_call<F, Fut>(&self, call: F)
    where
        F: FnOnce(Arc<dyn GameBackend>) -> Fut,
        Fut: Future<Output = Message> + Send + 'static,
    {
        let Some(tx) = self.tx.upgrade() else {
            return;
        };
        let call = call(Arc::clone(&self.backend));
        tokio::spawn(async move {
            let _ = tx.send(call.await);
        });
    }

    fn publish(&self) {
        let mut next = GameView {
            world: self.world.current(),
            npc_id: self.session.npc_id().map(str::to_owned),
            npc_name: self.session.npc_name().map(str::to_owned),
            dialogue: self.session.entries().to_vec(),
            choices: self.session.available_choices().to_vec(),
            chat_enabled: self.session.is_enabled(),
            chat_pending: self.session.is_pending(),
            simulating: self.coordinator.is_in_flight(),
            playback: self.player.view(),
            revision: 0,
        };
        self.view_tx.send_if_modified(|current| {
            next.revision = current.revision;
            if *current == next {
                return false;
            }
            next.revision += 1;
            *current = next;
            true
        });
    }
}
