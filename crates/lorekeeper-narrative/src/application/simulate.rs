//! Running a simulation against the backend.

use lorekeeper_core::backend::GameBackend;
use lorekeeper_core::error::DomainError;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::coordinator::{Settled, SimulationCoordinator, SimulationOutcome};
use crate::domain::player::CinematicPlayer;

/// Advances world time, then fetches the recap.
///
/// The recap is only requested after the simulation resolves. A failed or
/// unpresentable recap yields `recap: None` rather than an error.
///
/// # Errors
///
/// Returns `DomainError` if the simulate call itself fails.
#[instrument(skip_all, fields(%correlation_id))]
pub async fn run_simulation(
    backend: &dyn GameBackend,
    correlation_id: Uuid,
) -> Result<SimulationOutcome, DomainError> {
    let result = backend.simulate().await?;
    info!(
        event_id = %result.event.id,
        reactions = result.npc_reactions.len(),
        gossip = result.gossip.len(),
        "simulation resolved"
    );
    let recap = match backend.get_recap().await {
        Ok(recap) if recap.is_presentable() => Some(recap),
        Ok(_) => None,
        Err(error) => {
            warn!(%error, "recap unavailable; playing without it");
            None
        }
    };
    Ok(SimulationOutcome { result, recap })
}

/// Begins, runs and settles one simulation in a single call.
///
/// Returns `Settled::Ignored` without calling the backend when a simulation
/// is already in flight.
pub async fn pass_time(
    coordinator: &mut SimulationCoordinator,
    player: &mut CinematicPlayer,
    backend: &dyn GameBackend,
) -> Settled {
    let Some(correlation_id) = coordinator.begin() else {
        return Settled::Ignored;
    };
    let outcome = run_simulation(backend, correlation_id).await;
    coordinator.settle(correlation_id, outcome, player)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::phase::{Phase, PlaybackTiming};
    use crate::domain::player::{Advance, TimerFired};
    use lorekeeper_test_support::{ScriptedBackend, fixtures};
    use tokio::sync::mpsc;

    fn player() -> (CinematicPlayer, mpsc::UnboundedReceiver<TimerFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Arc::new(move |fired: TimerFired| {
            let _ = tx.send(fired);
        });
        (CinematicPlayer::new(PlaybackTiming::default(), sink), rx)
    }

    #[tokio::test]
    async fn test_recap_failure_is_tolerated() {
        // Arrange
        let backend = ScriptedBackend::new();
        backend.push_simulation(Ok(fixtures::simulation_result("A storm rolls in.", 0)));
        backend.set_recap(Err(DomainError::backend("get_recap", "502")));

        // Act
        let outcome = run_simulation(&backend, Uuid::new_v4()).await.unwrap();

        // Assert
        assert_eq!(outcome.recap, None);
        assert_eq!(outcome.result.event.description, "A storm rolls in.");
        assert_eq!(backend.call_count("get_recap"), 1);
    }

    #[tokio::test]
    async fn test_simulate_failure_skips_recap() {
        let backend = ScriptedBackend::new();
        backend.push_simulation(Err(DomainError::backend("simulate", "no worker")));

        let result = run_simulation(&backend, Uuid::new_v4()).await;

        assert!(result.is_err());
        assert_eq!(backend.call_count("get_recap"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_time_without_recap_plays_event_then_completes() {
        // Arrange
        let backend = ScriptedBackend::new();
        backend.push_simulation(Ok(fixtures::simulation_result("A storm rolls in.", 0)));
        let mut coordinator = SimulationCoordinator::new();
        let (mut player, mut rx) = player();

        // Act
        let settled = pass_time(&mut coordinator, &mut player, &backend).await;
        while !player.view().is_some_and(|v| v.continue_visible) {
            player.on_timer(rx.recv().await.unwrap());
        }
        let advance = player.advance();

        // Assert
        assert_eq!(settled, Settled::Playing(Phase::Event));
        let Advance::Completed(result) = advance else {
            panic!("expected completion, got {advance:?}");
        };
        assert_eq!(
            coordinator.playback_complete(&result),
            "A storm rolls in."
        );
        assert!(coordinator.is_in_flight());
        coordinator.finish();
        assert!(!coordinator.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_time_with_recap_opens_on_recap() {
        let backend = ScriptedBackend::new();
        backend.push_simulation(Ok(fixtures::simulation_result("Bandits raid the mill.", 2)));
        backend.set_recap(Ok(fixtures::recap("Three days of rain.")));
        let mut coordinator = SimulationCoordinator::new();
        let (mut player, _rx) = player();

        let settled = pass_time(&mut coordinator, &mut player, &backend).await;

        assert_eq!(settled, Settled::Playing(Phase::Recap));
        assert!(player.view().unwrap().recap.is_some());
    }

    #[tokio::test]
    async fn test_pass_time_while_in_flight_is_noop() {
        let backend = ScriptedBackend::new();
        let mut coordinator = SimulationCoordinator::new();
        let (mut player, _rx) = player();
        coordinator.begin().unwrap();

        let settled = pass_time(&mut coordinator, &mut player, &backend).await;

        assert_eq!(settled, Settled::Ignored);
        assert_eq!(backend.call_count("simulate"), 0);
    }

    #[tokio::test]
    async fn test_failed_pass_time_lowers_guard() {
        let backend = ScriptedBackend::new();
        let mut coordinator = SimulationCoordinator::new();
        let (mut player, _rx) = player();

        let settled = pass_time(&mut coordinator, &mut player, &backend).await;

        assert!(matches!(settled, Settled::Failed { .. }));
        assert!(!coordinator.is_in_flight());
        assert!(!player.is_active());
    }
}
