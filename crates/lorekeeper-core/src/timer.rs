//! Cancellable one-shot timer.
//!
//! A state machine owns one `CancellableTimer`. Scheduling a new firing
//! cancels the previous one, and every firing carries the generation it was
//! scheduled under. A firing whose generation is no longer current was
//! cancelled after it had already been delivered and must be ignored; that
//! is the only way a late callback could reach a newer state.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Handle to at most one pending timer firing.
#[derive(Debug, Default)]
pub struct CancellableTimer {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl CancellableTimer {
    /// Creates an idle timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels any pending firing and schedules `fire` to run after `delay`
    /// with the new generation. Returns that generation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, delay: Duration, fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire(generation);
        }));
        generation
    }

    /// Cancels the pending firing, if any. Firings already delivered become
    /// stale.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Consumes a delivered firing. Returns `true` only for the firing of the
    /// currently scheduled generation, at most once.
    pub fn accept(&mut self, generation: u64) -> bool {
        if self.handle.is_some() && generation == self.generation {
            self.handle = None;
            true
        } else {
            false
        }
    }

    /// Whether a firing is scheduled and not yet accepted.
    pub const fn is_pending(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for CancellableTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
