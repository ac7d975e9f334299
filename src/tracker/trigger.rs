use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use crate::config::Settings;

/// Deadline of the next automatic report. It lives inside the tracking loop rather than in a
/// timer task of its own, so a report request can never race with accumulation.
#[derive(Debug, Default)]
pub struct PeriodicTrigger {
    period: Option<Duration>,
    next: Option<Instant>,
}

impl PeriodicTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restarts the timer from `now` with the period from `settings`, or disarms it if automatic
    /// reports are disabled. Any pending deadline is replaced, never kept alongside.
    pub fn rearm(&mut self, settings: &Settings, now: Instant) {
        if settings.auto_report_enabled {
            let period = settings.report_interval();
            info!("Automatic reports every {period:?}");
            self.period = Some(period);
            self.next = Some(now + period);
        } else {
            if self.period.is_some() {
                info!("Automatic reports disabled");
            }
            self.period = None;
            self.next = None;
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Returns true if a report is due at `now` and schedules the next one.
    pub fn fire(&mut self, now: Instant) -> bool {
        match (self.next, self.period) {
            (Some(next), Some(period)) if next <= now => {
                // Skips deadlines that were missed entirely instead of firing them in a burst.
                let mut upcoming = next + period;
                while upcoming <= now {
                    upcoming += period;
                }
                self.next = Some(upcoming);
                true
            }
            _ => false,
        }
    }

    pub fn disarm(&mut self) {
        self.period = None;
        self.next = None;
    }
}
