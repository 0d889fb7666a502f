//! Scenario selection flow.

use lorekeeper_core::backend::GameBackend;
use lorekeeper_core::error::DomainError;
use lorekeeper_core::model::ScenarioSummary;
use lorekeeper_core::storage::KeyValueStore;
use tracing::{info, instrument};

use crate::domain::resume::{OnboardingPhase, ResumeState};

/// Lists the scenarios the player can choose from.
///
/// # Errors
///
/// Returns `DomainError` if the backend call fails.
#[instrument(skip_all)]
pub async fn list_scenarios(
    backend: &dyn GameBackend,
) -> Result<Vec<ScenarioSummary>, DomainError> {
    let scenarios = backend.list_scenarios().await?;
    info!(count = scenarios.len(), "listed scenarios");
    Ok(scenarios)
}

/// Moves from the title screen to scenario selection.
///
/// # Errors
///
/// Returns `DomainError::Storage` if the state cannot be persisted.
pub fn enter_selection(store: &dyn KeyValueStore) -> Result<ResumeState, DomainError> {
    let state = ResumeState {
        phase: OnboardingPhase::Select,
        scenario_id: None,
    };
    state.save(store)?;
    Ok(state)
}

/// Activates `scenario_id` on the backend and persists the game phase.
///
/// Nothing is persisted if activation fails.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank id, or whatever the backend
/// or store reports.
#[instrument(skip(backend, store))]
pub async fn activate(
    backend: &dyn GameBackend,
    store: &dyn KeyValueStore,
    scenario_id: &str,
) -> Result<ResumeState, DomainError> {
    if scenario_id.trim().is_empty() {
        return Err(DomainError::Validation("scenario id is empty".into()));
    }
    backend.activate_scenario(scenario_id).await?;
    let state = ResumeState::in_game(scenario_id);
    state.save(store)?;
    info!("scenario activated");
    Ok(state)
}

/// Leaves the current game and returns to scenario selection.
///
/// # Errors
///
/// Returns `DomainError::Storage` if the state cannot be persisted.
pub fn leave_game(store: &dyn KeyValueStore) -> Result<ResumeState, DomainError> {
    info!("leaving game");
    enter_selection(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resume::{PHASE_KEY, SCENARIO_KEY};
    use lorekeeper_test_support::{MemoryStore, ScriptedBackend, fixtures};

    #[tokio::test]
    async fn test_activate_persists_game_phase() {
        // Arrange
        let backend = ScriptedBackend::new();
        let store = MemoryStore::new();

        // Act
        let state = activate(&backend, &store, "ashwood").await.unwrap();

        // Assert
        assert_eq!(state, ResumeState::in_game("ashwood"));
        assert_eq!(backend.activated(), ["ashwood"]);
        assert_eq!(ResumeState::load(&store), state);
    }

    #[tokio::test]
    async fn test_failed_activation_persists_nothing() {
        // Arrange
        let backend = ScriptedBackend::new();
        backend.set_activation(Err(DomainError::NotFound("scenario ashwood".into())));
        let store = MemoryStore::with_entries(&[(PHASE_KEY, "select")]);

        // Act
        let result = activate(&backend, &store, "ashwood").await;

        // Assert
        assert!(matches!(result, Err(DomainError::NotFound(_))));
        assert_eq!(ResumeState::load(&store).phase, OnboardingPhase::Select);
        assert!(!store.snapshot().contains_key(SCENARIO_KEY));
    }

    #[tokio::test]
    async fn test_blank_scenario_id_is_rejected_before_backend() {
        let backend = ScriptedBackend::new();
        let store = MemoryStore::new();

        let result = activate(&backend, &store, "  ").await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(backend.call_count("activate_scenario"), 0);
    }

    #[tokio::test]
    async fn test_list_scenarios_returns_backend_order() {
        let backend = ScriptedBackend::new();
        backend.set_scenarios(vec![
            fixtures::scenario("ashwood", "Ashwood"),
            fixtures::scenario("saltmarsh", "Saltmarsh"),
        ]);

        let scenarios = list_scenarios(&backend).await.unwrap();

        let ids: Vec<&str> = scenarios.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["ashwood", "saltmarsh"]);
    }

    #[test]
    fn test_leave_game_returns_to_selection() {
        // Arrange
        let store = MemoryStore::with_entries(&[(PHASE_KEY, "game"), (SCENARIO_KEY, "ashwood")]);

        // Act
        let state = leave_game(&store).unwrap();

        // Assert
        assert_eq!(state.phase, OnboardingPhase::Select);
        assert_eq!(ResumeState::load(&store), state);
    }

    #[test]
    fn test_enter_selection_from_intro() {
        let store = MemoryStore::new();

        let state = enter_selection(&store).unwrap();

        assert_eq!(state.phase, OnboardingPhase::Select);
        assert_eq!(
            store.snapshot().get(PHASE_KEY).map(String::as_str),
            Some("select")
        );
    }
}
