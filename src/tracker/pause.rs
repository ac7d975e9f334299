use std::time::Duration;

use tokio::time::Instant;

/// Tracks whether the session is paused and since when.
///
/// The controller never corrects accumulated time itself. On resume the session moves its tick
/// reference to the resume instant, so paused time simply never becomes part of a tick.
#[derive(Debug, Default)]
pub struct PauseController {
    paused_at: Option<Instant>,
}

impl PauseController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Returns false if the session was already paused.
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.paused_at.is_some() {
            return false;
        }
        self.paused_at = Some(now);
        true
    }

    /// Returns how long the pause lasted, or `None` if the session wasn't paused.
    pub fn resume(&mut self, now: Instant) -> Option<Duration> {
        self.paused_at
            .take()
            .map(|paused_at| now.saturating_duration_since(paused_at))
    }
}
