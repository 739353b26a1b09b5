use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Process-lifetime accumulators consumed by the external health layer.
///
/// The pipeline only updates these marks; serving them over HTTP (or not)
/// is someone else's concern.
#[derive(Debug, Default)]
pub struct LivenessTracker {
    last_push: Mutex<Option<Instant>>,
    last_poll: Mutex<Option<Instant>>,
}

impl LivenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_push(&self) {
        *lock(&self.last_push) = Some(Instant::now());
    }

    pub fn record_poll(&self) {
        *lock(&self.last_poll) = Some(Instant::now());
    }

    /// Seconds since the last successful push; `None` before the first one.
    pub fn seconds_since_last_push(&self) -> Option<u64> {
        lock(&self.last_push).map(|at| at.elapsed().as_secs())
    }

    /// Seconds since the last successful poll; `None` before the first one.
    pub fn seconds_since_last_poll(&self) -> Option<u64> {
        lock(&self.last_poll).map(|at| at.elapsed().as_secs())
    }
}

fn lock(slot: &Mutex<Option<Instant>>) -> std::sync::MutexGuard<'_, Option<Instant>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
