//! Cinematic playback of a simulation result.
//!
//! Each phase reveals in two steps: content appears `entry_delay` after the
//! phase is entered, and the continue affordance appears a reading-time
//! delay after that. Timer firings are delivered through a sink so the owner
//! can route them back into its own event loop; every firing carries the
//! playback id and timer generation it was scheduled under, and anything
//! stale is ignored.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use lorekeeper_core::model::{NarrativeRecap, SimulationResult};
use lorekeeper_core::timer::CancellableTimer;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::phase::{Phase, PlaybackTiming};

/// Which half of a phase's reveal a timer firing triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStage {
    /// Show the phase content.
    Content,
    /// Show the continue affordance.
    Continue,
}

/// A timer firing routed back to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    /// Playback the firing was scheduled for.
    pub playback_id: Uuid,
    /// Timer generation at scheduling time.
    pub generation: u64,
    /// What the firing reveals.
    pub stage: RevealStage,
}

/// Receives timer firings. Called from a timer task.
pub type TimerSink = Arc<dyn Fn(TimerFired) + Send + Sync>;

/// Result of asking the player to continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Continue is not available right now.
    Ignored,
    /// Playback moved on to the given phase.
    Entered(Phase),
    /// Playback reached `Done`. Returned once per playback.
    Completed(SimulationResult),
}

/// A read-only snapshot of the playback for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackView {
    /// Playback identity.
    pub playback_id: Uuid,
    /// Current phase.
    pub phase: Phase,
    /// Bumped on every phase entry, including replays of the same phase.
    pub entries: u64,
    /// Whether the phase content is shown.
    pub content_visible: bool,
    /// Whether the continue affordance is shown.
    pub continue_visible: bool,
    /// The result being played.
    pub result: SimulationResult,
    /// The recap, present only when it was worth showing.
    pub recap: Option<NarrativeRecap>,
    /// Presentation offsets for the reactions or gossip items of this phase.
    pub item_offsets: Vec<Duration>,
}

#[derive(Debug)]
struct Playback {
    id: Uuid,
    result: SimulationResult,
    recap: Option<NarrativeRecap>,
    phase: Phase,
    entries: u64,
    content_visible: bool,
    continue_visible: bool,
}

#[derive(Debug, Clone, Copy)]
enum Entry {
    Delayed,
    Immediate,
}

/// The phased playback state machine.
pub struct CinematicPlayer {
    timing: PlaybackTiming,
    timer: CancellableTimer,
    sink: TimerSink,
    playback: Option<Playback>,
}

impl fmt::Debug for CinematicPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CinematicPlayer")
            .field("timing", &self.timing)
            .field("timer", &self.timer)
            .field("playback", &self.playback)
            .finish_non_exhaustive()
    }
}

impl CinematicPlayer {
    /// Creates an idle player that delivers timer firings to `sink`.
    pub fn new(timing: PlaybackTiming, sink: TimerSink) -> Self {
        Self {
            timing,
            timer: CancellableTimer::new(),
            sink,
            playback: None,
        }
    }

    /// Starts playing `result`, replacing any playback in progress.
    ///
    /// Playback opens on the recap when `recap` is presentable and on the
    /// event otherwise. Must be called from within a tokio runtime.
    pub fn play(&mut self, result: SimulationResult, recap: Option<NarrativeRecap>) -> Phase {
        let recap = recap.filter(NarrativeRecap::is_presentable);
        let phase = Phase::initial(recap.as_ref());
        let id = Uuid::new_v4();
        info!(playback_id = %id, ?phase, gossip = result.gossip.len(), "playback started");
        self.playback = Some(Playback {
            id,
            result,
            recap,
            phase,
            entries: 0,
            content_visible: false,
            continue_visible: false,
        });
        self.enter(phase, Entry::Delayed);
        phase
    }

    /// Applies a timer firing. Returns `false` for stale firings.
    pub fn on_timer(&mut self, fired: TimerFired) -> bool {
        let Some(playback) = self.playback.as_mut() else {
            return false;
        };
        if fired.playback_id != playback.id || !self.timer.accept(fired.generation) {
            debug!(playback_id = %fired.playback_id, generation = fired.generation, "ignoring stale timer");
            return false;
        }

        match fired.stage {
            RevealStage::Content => {
                playback.content_visible = true;
                let delay = self.timing.continue_delay(
                    playback.phase,
                    &playback.result,
                    playback.recap.as_ref(),
                );
                arm(&mut self.timer, &self.sink, playback.id, RevealStage::Continue, delay);
            }
            RevealStage::Continue => playback.continue_visible = true,
        }
        true
    }

    /// The player asked to continue. Only honoured once the continue
    /// affordance is visible.
    pub fn advance(&mut self) -> Advance {
        let Some(playback) = self.playback.as_ref() else {
            return Advance::Ignored;
        };
        if !playback.continue_visible {
            return Advance::Ignored;
        }

        let next = playback.phase.next(playback.result.has_gossip());
        if next == Phase::Done {
            self.timer.cancel();
            return match self.playback.take() {
                Some(finished) => {
                    info!(playback_id = %finished.id, "playback complete");
                    Advance::Completed(finished.result)
                }
                None => Advance::Ignored,
            };
        }
        self.enter(next, Entry::Delayed);
        Advance::Entered(next)
    }

    /// Re-enters the current phase with its content shown immediately. The
    /// continue affordance reappears after the phase's reading delay.
    pub fn replay_phase(&mut self) -> bool {
        let Some(phase) = self.phase() else {
            return false;
        };
        self.enter(phase, Entry::Immediate);
        true
    }

    /// Abandons the playback in progress without completing it.
    pub fn stop(&mut self) {
        self.timer.cancel();
        if let Some(playback) = self.playback.take() {
            debug!(playback_id = %playback.id, "playback stopped");
        }
    }

    /// Current phase, or `None` when idle.
    pub fn phase(&self) -> Option<Phase> {
        self.playback.as_ref().map(|p| p.phase)
    }

    /// Whether a playback is in progress.
    pub const fn is_active(&self) -> bool {
        self.playback.is_some()
    }

    /// Presentation snapshot, or `None` when idle.
    pub fn view(&self) -> Option<PlaybackView> {
        let playback = self.playback.as_ref()?;
        let items = match playback.phase {
            Phase::Event => playback.result.npc_reactions.len(),
            Phase::Gossip => playback.result.gossip.len(),
            Phase::Recap | Phase::Done => 0,
        };
        Some(PlaybackView {
            playback_id: playback.id,
            phase: playback.phase,
            entries: playback.entries,
            content_visible: playback.content_visible,
            continue_visible: playback.continue_visible,
            result: playback.result.clone(),
            recap: playback.recap.clone(),
            item_offsets: self.timing.item_offsets(items),
        })
    }

    fn enter(&mut self, phase: Phase, entry: Entry) {
        let Some(playback) = self.playback.as_mut() else {
            return;
        };
        debug!(playback_id = %playback.id, ?phase, ?entry, "entering phase");
        playback.phase = phase;
        playback.entries += 1;
        playback.continue_visible = false;
        match entry {
            Entry::Delayed => {
                playback.content_visible = false;
                arm(
                    &mut self.timer,
                    &self.sink,
                    playback.id,
                    RevealStage::Content,
                    self.timing.entry_delay,
                );
            }
            Entry::Immediate => {
                playback.content_visible = true;
                let delay =
                    self.timing
                        .continue_delay(phase, &playback.result, playback.recap.as_ref());
                arm(&mut self.timer, &self.sink, playback.id, RevealStage::Continue, delay);
            }
        }
    }
}

fn arm(
    timer: &mut CancellableTimer,
    sink: &TimerSink,
    playback_id: Uuid,
    stage: RevealStage,
    delay: Duration,
) {
    let sink = Arc::clone(sink);
    timer.schedule(delay, move |generation| {
        sink(TimerFired {
            playback_id,
            generation,
            stage,
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeeper_test_support::fixtures;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    fn player() -> (CinematicPlayer, mpsc::UnboundedReceiver<TimerFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink: TimerSink = Arc::new(move |fired: TimerFired| {
            let _ = tx.send(fired);
        });
        (CinematicPlayer::new(PlaybackTiming::default(), sink), rx)
    }

    /// Delivers timer firings until the continue affordance is visible.
    async fn reveal(player: &mut CinematicPlayer, rx: &mut mpsc::UnboundedReceiver<TimerFired>) {
        while !player.view().is_some_and(|v| v.continue_visible) {
            let fired = rx.recv().await.unwrap();
            player.on_timer(fired);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_only_playback_completes_once() {
        // Arrange
        let (mut player, mut rx) = player();
        let result = fixtures::simulation_result("A storm rolls in.", 0);

        // Act
        let first = player.play(result.clone(), None);
        reveal(&mut player, &mut rx).await;
        let done = player.advance();
        let again = player.advance();

        // Assert
        assert_eq!(first, Phase::Event);
        assert_eq!(done, Advance::Completed(result));
        assert_eq!(again, Advance::Ignored);
        assert!(!player.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recap_and_gossip_play_in_order() {
        // Arrange
        let (mut player, mut rx) = player();
        let result = fixtures::simulation_result("Bandits raid the mill.", 2);
        let mut phases = vec![player.play(result, Some(fixtures::recap("Days passed.")))];

        // Act
        loop {
            reveal(&mut player, &mut rx).await;
            match player.advance() {
                Advance::Entered(phase) => phases.push(phase),
                Advance::Completed(_) => break,
                Advance::Ignored => panic!("continue was visible"),
            }
        }

        // Assert
        assert_eq!(phases, [Phase::Recap, Phase::Event, Phase::Gossip]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unpresentable_recap_is_skipped() {
        let (mut player, _rx) = player();
        let blank = NarrativeRecap {
            summary: "   ".to_owned(),
            key_moments: vec!["something".to_owned()],
        };

        let phase = player.play(fixtures::simulation_result("Fog.", 0), Some(blank));

        assert_eq!(phase, Phase::Event);
        assert_eq!(player.view().unwrap().recap, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_continue_appears_after_reading_delay() {
        // Arrange
        let (mut player, mut rx) = player();
        let description = "x".repeat(20);
        let start = Instant::now();
        player.play(fixtures::simulation_result(&description, 0), None);

        // Act
        let content = rx.recv().await.unwrap();
        player.on_timer(content);
        let content_at = start.elapsed();
        let early = player.advance();
        let shown = rx.recv().await.unwrap();
        player.on_timer(shown);
        let continue_at = start.elapsed();

        // Assert
        assert_eq!(early, Advance::Ignored);
        assert!(content_at >= Duration::from_millis(500));
        assert!(content_at < Duration::from_millis(600));
        let reading = continue_at - content_at;
        assert!(reading >= Duration::from_millis(20 * 35 + 2000));
        assert!(reading < Duration::from_millis(20 * 35 + 2100));
        assert!(player.view().unwrap().continue_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_firing_from_previous_playback_is_ignored() {
        // Arrange
        let (mut player, mut rx) = player();
        player.play(fixtures::simulation_result("First.", 0), None);
        let stale = rx.recv().await.unwrap();

        // Act
        player.play(fixtures::simulation_result("Second.", 0), None);
        let applied = player.on_timer(stale);

        // Assert
        assert!(!applied);
        assert!(!player.view().unwrap().content_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_phase_shows_content_and_rearms_continue() {
        // Arrange
        let (mut player, mut rx) = player();
        player.play(fixtures::simulation_result("Fog.", 1), None);
        reveal(&mut player, &mut rx).await;

        // Act
        let replayed = player.replay_phase();
        let view = player.view().unwrap();

        // Assert
        assert!(replayed);
        assert_eq!(view.phase, Phase::Event);
        assert_eq!(view.entries, 2);
        assert!(view.content_visible);
        assert!(!view.continue_visible);
        reveal(&mut player, &mut rx).await;
        assert_eq!(player.advance(), Advance::Entered(Phase::Gossip));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_cancels_pending_reveal_of_same_playback() {
        // Arrange
        let (mut player, mut rx) = player();
        let description = "x".repeat(20);
        player.play(fixtures::simulation_result(&description, 0), None);
        let stale = rx.recv().await.unwrap();

        // Act
        player.replay_phase();
        let replayed_at = Instant::now();
        let applied = player.on_timer(stale);
        let after_stale = player.view().unwrap();
        let shown = rx.recv().await.unwrap();
        let waited = replayed_at.elapsed();
        let accepted = player.on_timer(shown);

        // Assert
        assert!(!applied);
        assert!(after_stale.content_visible);
        assert!(!after_stale.continue_visible);
        assert_eq!(shown.stage, RevealStage::Continue);
        assert!(accepted);
        assert!(waited >= Duration::from_millis(20 * 35 + 2000));
        assert!(waited < Duration::from_millis(20 * 35 + 2100));
        assert!(player.view().unwrap().continue_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_offsets_follow_phase_items() {
        // Arrange
        let (mut player, mut rx) = player();
        player.play(fixtures::simulation_result("Fog.", 3), None);
        reveal(&mut player, &mut rx).await;

        // Act
        let event_offsets = player.view().unwrap().item_offsets;
        player.advance();
        let gossip_offsets = player.view().unwrap().item_offsets;

        // Assert
        assert_eq!(event_offsets, [Duration::ZERO]);
        assert_eq!(gossip_offsets.len(), 3);
        assert_eq!(gossip_offsets[2], Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_playback() {
        let (mut player, _rx) = player();
        player.play(fixtures::simulation_result("Fog.", 0), None);

        player.stop();

        assert!(!player.is_active());
        assert_eq!(player.advance(), Advance::Ignored);
        assert!(!player.replay_phase());
    }
}
