//! Shared helpers for client integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use lorekeeper_client::orchestrator::{self, GameView, OrchestratorHandle, OrchestratorSettings};
use lorekeeper_core::backend::GameBackend;
use lorekeeper_narrative::domain::phase::PlaybackTiming;
use lorekeeper_test_support::ScriptedBackend;

/// Poll interval long enough that no poll fires during a test unless the
/// test asks for one.
pub const QUIET_POLL_INTERVAL: Duration = Duration::from_secs(3600);

/// Upper bound on how long a test waits for a view, in virtual time.
const WAIT_LIMIT: Duration = Duration::from_secs(600);

/// Settings with default timing and the given poll interval.
pub fn settings(poll_interval: Duration) -> OrchestratorSettings {
    OrchestratorSettings {
        timing: PlaybackTiming::default(),
        poll_interval,
    }
}

/// Spawns an orchestrator over `backend` and waits for the initial load.
pub async fn start(backend: &Arc<ScriptedBackend>, poll_interval: Duration) -> OrchestratorHandle {
    let backend: Arc<dyn GameBackend> = Arc::clone(backend) as Arc<dyn GameBackend>;
    let handle = orchestrator::spawn(backend, settings(poll_interval)).unwrap();
    wait_for(&handle, |view| view.world.is_some()).await;
    quiesce().await;
    handle
}

/// Waits until the published view satisfies `predicate`.
///
/// # Panics
///
/// Panics if it does not happen within the wait limit.
pub async fn wait_for(
    handle: &OrchestratorHandle,
    predicate: impl FnMut(&GameView) -> bool,
) -> GameView {
    let mut rx = handle.subscribe();
    let view = tokio::time::timeout(WAIT_LIMIT, rx.wait_for(predicate))
        .await
        .expect("view never reached the expected state")
        .expect("orchestrator stopped");
    view.clone()
}

/// Lets every runnable task finish. With a paused clock the sleep only
/// completes once the runtime is otherwise idle.
pub async fn quiesce() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Text of every dialogue entry in `view`.
pub fn texts(view: &GameView) -> Vec<String> {
    view.dialogue.iter().map(|e| e.text().to_owned()).collect()
}
