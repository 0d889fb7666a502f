//! Where the player left off.

use std::fmt;
use std::str::FromStr;

use lorekeeper_core::error::DomainError;
use lorekeeper_core::storage::KeyValueStore;
use serde::Serialize;
use tracing::{debug, warn};

/// Storage key for the onboarding phase.
pub const PHASE_KEY: &str = "lorekeeper.phase";
/// Storage key for the active scenario id.
pub const SCENARIO_KEY: &str = "lorekeeper.scenario_id";

/// Onboarding progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingPhase {
    /// Title screen.
    #[default]
    Intro,
    /// Choosing a scenario.
    Select,
    /// Playing an activated scenario.
    Game,
}

impl OnboardingPhase {
    /// The persisted representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Select => "select",
            Self::Game => "game",
        }
    }
}

impl fmt::Display for OnboardingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OnboardingPhase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intro" => Ok(Self::Intro),
            "select" => Ok(Self::Select),
            "game" => Ok(Self::Game),
            other => Err(DomainError::Validation(format!(
                "unknown onboarding phase: {other}"
            ))),
        }
    }
}

/// The persisted onboarding phase and scenario.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResumeState {
    /// Onboarding progress.
    pub phase: OnboardingPhase,
    /// Active scenario, present in `Game`.
    pub scenario_id: Option<String>,
}

impl ResumeState {
    /// A state in the game phase for `scenario_id`.
    pub fn in_game(scenario_id: impl Into<String>) -> Self {
        Self {
            phase: OnboardingPhase::Game,
            scenario_id: Some(scenario_id.into()),
        }
    }

    /// Reads the state from `store`.
    ///
    /// An unknown phase falls back to `Intro`, and `Game` without a scenario
    /// falls back to `Select`.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let phase = match store.load(PHASE_KEY).map(|raw| raw.parse()) {
            Some(Ok(phase)) => phase,
            Some(Err(error)) => {
                warn!(%error, "ignoring persisted phase");
                OnboardingPhase::Intro
            }
            None => OnboardingPhase::Intro,
        };
        let scenario_id = store.load(SCENARIO_KEY).filter(|id| !id.trim().is_empty());

        let state = match (phase, scenario_id) {
            (OnboardingPhase::Game, None) => {
                warn!("game phase persisted without a scenario; returning to selection");
                Self {
                    phase: OnboardingPhase::Select,
                    scenario_id: None,
                }
            }
            (phase, scenario_id) => Self { phase, scenario_id },
        };
        debug!(phase = %state.phase, scenario_id = ?state.scenario_id, "loaded resume state");
        state
    }

    /// Writes the state to `store`, removing the scenario key when absent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Storage` if the store rejects a write.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), DomainError> {
        store.save(PHASE_KEY, self.phase.as_str())?;
        match &self.scenario_id {
            Some(id) => store.save(SCENARIO_KEY, id),
            None => store.remove(SCENARIO_KEY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeeper_test_support::{FailingStore, MemoryStore};

    #[test]
    fn test_empty_store_starts_at_intro() {
        let store = MemoryStore::new();

        assert_eq!(ResumeState::load(&store), ResumeState::default());
    }

    #[test]
    fn test_game_with_scenario_is_restored() {
        let store = MemoryStore::with_entries(&[(PHASE_KEY, "game"), (SCENARIO_KEY, "ashwood")]);

        let state = ResumeState::load(&store);

        assert_eq!(state, ResumeState::in_game("ashwood"));
    }

    #[test]
    fn test_game_without_scenario_falls_back_to_select() {
        let store = MemoryStore::with_entries(&[(PHASE_KEY, "game")]);

        let state = ResumeState::load(&store);

        assert_eq!(state.phase, OnboardingPhase::Select);
        assert_eq!(state.scenario_id, None);
    }

    #[test]
    fn test_unknown_phase_falls_back_to_intro() {
        let store = MemoryStore::with_entries(&[(PHASE_KEY, "credits")]);

        assert_eq!(ResumeState::load(&store).phase, OnboardingPhase::Intro);
    }

    #[test]
    fn test_save_removes_scenario_when_absent() {
        // Arrange
        let store = MemoryStore::new();
        ResumeState::in_game("ashwood").save(&store).unwrap();

        // Act
        ResumeState {
            phase: OnboardingPhase::Select,
            scenario_id: None,
        }
        .save(&store)
        .unwrap();

        // Assert
        let saved = store.snapshot();
        assert_eq!(saved.get(PHASE_KEY).map(String::as_str), Some("select"));
        assert!(!saved.contains_key(SCENARIO_KEY));
    }

    #[test]
    fn test_save_surfaces_storage_errors() {
        let result = ResumeState::default().save(&FailingStore);

        assert!(matches!(result, Err(DomainError::Storage(_))));
    }

    #[test]
    fn test_phase_round_trips_through_str() {
        for phase in [
            OnboardingPhase::Intro,
            OnboardingPhase::Select,
            OnboardingPhase::Game,
        ] {
            assert_eq!(phase.as_str().parse::<OnboardingPhase>().unwrap(), phase);
        }
    }
}
