//! Single-flight coordination of "advance time" requests.

use lorekeeper_core::error::DomainError;
use lorekeeper_core::model::{NarrativeRecap, SimulationResult};
use tracing::{info, warn};
use uuid::Uuid;

use super::phase::Phase;
use super::player::CinematicPlayer;

/// Narrator line shown when a simulation request fails.
pub const SIMULATION_FAILED_NOTICE: &str = "The world remains still... (simulation failed)";

/// A simulation result and the recap fetched alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationOutcome {
    /// What happened.
    pub result: SimulationResult,
    /// The recap, when one could be fetched.
    pub recap: Option<NarrativeRecap>,
}

/// What settling a simulation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    /// Playback started in the given phase.
    Playing(Phase),
    /// The request failed; show the notice. The guard is already lowered.
    Failed {
        /// Narrator text to append.
        notice: String,
    },
    /// No request was in flight under that correlation id.
    Ignored,
}

/// Guards against overlapping simulations.
///
/// The guard goes up in [`SimulationCoordinator::begin`] and stays up through
/// playback and the world refresh that follows it. It comes down on failure
/// or in [`SimulationCoordinator::finish`].
#[derive(Debug, Default)]
pub struct SimulationCoordinator {
    in_flight: Option<Uuid>,
}

impl SimulationCoordinator {
    /// Creates an idle coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the guard and returns a correlation id, or `None` if a
    /// simulation is already in flight.
    pub fn begin(&mut self) -> Option<Uuid> {
        if self.in_flight.is_some() {
            return None;
        }
        let correlation_id = Uuid::new_v4();
        info!(%correlation_id, "simulation requested");
        self.in_flight = Some(correlation_id);
        Some(correlation_id)
    }

    /// Whether a simulation, its playback, or its refresh is outstanding.
    pub const fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Applies the outcome of the request identified by `correlation_id`.
    /// On success playback starts on `player`.
    pub fn settle(
        &mut self,
        correlation_id: Uuid,
        outcome: Result<SimulationOutcome, DomainError>,
        player: &mut CinematicPlayer,
    ) -> Settled {
        if self.in_flight != Some(correlation_id) {
            return Settled::Ignored;
        }
        match outcome {
            Ok(SimulationOutcome { result, recap }) => {
                Settled::Playing(player.play(result, recap))
            }
            Err(error) => {
                warn!(%error, %correlation_id, "simulation failed");
                self.in_flight = None;
                Settled::Failed {
                    notice: SIMULATION_FAILED_NOTICE.to_owned(),
                }
            }
        }
    }

    /// Playback finished. Returns the narrator line summarising the event.
    /// The guard stays up until [`SimulationCoordinator::finish`].
    pub fn playback_complete(&self, result: &SimulationResult) -> String {
        result.event.description.clone()
    }

    /// The post-playback refresh settled; lowers the guard.
    pub fn finish(&mut self) {
        if let Some(correlation_id) = self.in_flight.take() {
            info!(%correlation_id, "simulation finished");
        }
    }
}
