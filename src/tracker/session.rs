use std::{fmt::Display, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::debug;

use crate::{
    config::Settings,
    error::TrackerError,
    report::snapshot::{ReportKind, ReportSnapshot, TaskProgress},
};

use super::{
    accumulator::{Accumulator, AppTime},
    pause::PauseController,
    tasks::{GoalReached, Task, TaskMatcher},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Paused,
    Stopped,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Running => write!(f, "running"),
            SessionState::Paused => write!(f, "paused"),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Result of a single tick.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub elapsed: Duration,
    pub goals: Vec<GoalReached>,
}

/// State of one tracking session, from start to stop. A session is owned by exactly one
/// [Sampler](super::sampler::Sampler), every mutation goes through it.
#[derive(Debug)]
pub struct Session {
    stopped: bool,
    accumulator: Accumulator,
    tasks: TaskMatcher,
    pause: PauseController,
    last_tick: Instant,
}

impl Session {
    pub fn start(now: Instant) -> Self {
        Self {
            stopped: false,
            accumulator: Accumulator::new(),
            tasks: TaskMatcher::new(),
            pause: PauseController::new(),
            last_tick: now,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.stopped {
            SessionState::Stopped
        } else if self.pause.is_paused() {
            SessionState::Paused
        } else {
            SessionState::Running
        }
    }

    /// Whether the window system should be sampled at all.
    pub fn is_accumulating(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Credits the time since the previous tick to the total, to `title` and to every task
    /// matching `title`. Does nothing unless the session is running.
    pub fn tick(&mut self, now: Instant, title: Option<Arc<str>>) -> TickOutcome {
        if !self.is_accumulating() {
            return TickOutcome::default();
        }

        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;

        self.accumulator.add(elapsed, title.as_ref());
        let goals = self.tasks.record(elapsed, title.as_deref());

        debug!("Tick of {elapsed:?} for {title:?}");
        TickOutcome { elapsed, goals }
    }

    pub fn pause(&mut self, now: Instant) -> bool {
        if self.stopped {
            return false;
        }
        self.pause.pause(now)
    }

    /// Moves the tick reference to `now`, which is what keeps paused time out of every total.
    pub fn resume(&mut self, now: Instant) -> Option<Duration> {
        if self.stopped {
            return None;
        }
        let paused_for = self.pause.resume(now)?;
        self.last_tick = now;
        Some(paused_for)
    }

    pub fn register_task(&mut self, name: &str, planned_time: Duration) -> Result<(), TrackerError> {
        if self.stopped {
            return Err(TrackerError::SessionClosed);
        }
        self.tasks.register_task(name, planned_time)
    }

    /// Freezes the session. Tasks don't outlive the session, so they are dropped here; take the
    /// final snapshot before stopping.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.pause = PauseController::new();
        self.tasks.clear_tasks();
    }

    pub fn snapshot(
        &self,
        kind: ReportKind,
        generated_at: DateTime<Utc>,
        settings: Settings,
    ) -> ReportSnapshot {
        ReportSnapshot {
            kind,
            generated_at,
            total_time: self.accumulator.total_time(),
            apps: self.accumulator.app_times().to_vec(),
            tasks: self
                .tasks
                .tasks()
                .iter()
                .map(|task| TaskProgress {
                    name: task.name.clone(),
                    planned_time: task.planned_time,
                    real_time: task.real_time,
                })
                .collect(),
            settings,
        }
    }

    pub fn total_time(&self) -> Duration {
        self.accumulator.total_time()
    }

    pub fn app_times(&self) -> &[AppTime] {
        self.accumulator.app_times()
    }

    pub fn app_time(&self, title: &str) -> Option<Duration> {
        self.accumulator.app_time(title)
    }

    pub fn tasks(&self) -> &[Task] {
        self.tasks.tasks()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use chrono::Utc;
    use tokio::time::Instant;

    use crate::{config::Settings, error::TrackerError, report::snapshot::ReportKind};

    use super::{Session, SessionState};

    fn secs(v: u64) -> Duration {
        Duration::from_secs(v)
    }

    fn editor() -> Option<Arc<str>> {
        Some("Editor".into())
    }

    #[test]
    fn test_constant_window_accumulates() {
        let start = Instant::now();
        let mut session = Session::start(start);
        for i in 1..=3 {
            session.tick(start + secs(i), editor());
        }

        assert_eq!(session.total_time(), secs(3));
        assert_eq!(session.app_time("Editor"), Some(secs(3)));
        assert_eq!(session.app_times().len(), 1);
    }

    #[test]
    fn test_total_is_sum_of_elapsed() {
        let start = Instant::now();
        let mut session = Session::start(start);
        let offsets = [300u64, 1000, 1700, 2100, 4000];
        let mut elapsed_sum = Duration::ZERO;
        for offset in offsets {
            let outcome = session.tick(start + Duration::from_millis(offset), editor());
            elapsed_sum += outcome.elapsed;
        }

        assert_eq!(session.total_time(), elapsed_sum);
        assert_eq!(session.total_time(), Duration::from_millis(4000));
    }

    #[test]
    fn test_pause_is_excluded() {
        let start = Instant::now();
        let mut session = Session::start(start);
        session.tick(start + secs(1), editor());
        session.tick(start + secs(2), editor());

        assert!(session.pause(start + secs(2)));
        assert_eq!(session.state(), SessionState::Paused);
        // Ticks while paused are ignored.
        session.tick(start + secs(4), editor());
        assert_eq!(session.resume(start + secs(7)), Some(secs(5)));

        session.tick(start + secs(8), editor());
        session.tick(start + secs(9), editor());

        assert_eq!(session.total_time(), secs(4));
        assert_eq!(session.app_time("Editor"), Some(secs(4)));
    }

    #[test]
    fn test_repeated_pause_cycles() {
        let start = Instant::now();
        let mut session = Session::start(start);
        let mut now = start;
        for _ in 0..3 {
            now += secs(2);
            session.tick(now, editor());
            session.pause(now);
            now += secs(10);
            session.resume(now);
        }
        now += secs(1);
        session.tick(now, editor());

        assert_eq!(session.total_time(), secs(7));
    }

    #[test]
    fn test_apps_sum_at_most_total() {
        let start = Instant::now();
        let mut session = Session::start(start);
        session.tick(start + secs(1), editor());
        session.tick(start + secs(2), None);
        session.tick(start + secs(4), Some("Browser".into()));

        let apps_sum: Duration = session.app_times().iter().map(|v| v.duration).sum();
        assert_eq!(session.total_time(), secs(4));
        assert_eq!(apps_sum, secs(3));
    }

    #[test]
    fn test_task_goal_alert() {
        let start = Instant::now();
        let mut session = Session::start(start);
        session.register_task("Editor", secs(2)).unwrap();

        let mut alerts = 0;
        for i in 1..=4 {
            alerts += session.tick(start + secs(i), editor()).goals.len();
        }

        assert_eq!(alerts, 1);
        assert_eq!(session.tasks()[0].real_time, secs(2));
    }

    #[test]
    fn test_snapshot_copies_state() {
        let start = Instant::now();
        let mut session = Session::start(start);
        session.register_task("Editor", secs(10)).unwrap();
        session.tick(start + secs(3), editor());

        let snapshot = session.snapshot(ReportKind::OnDemand, Utc::now(), Settings::default());
        session.tick(start + secs(5), editor());

        assert_eq!(snapshot.total_time, secs(3));
        assert_eq!(snapshot.apps[0].duration, secs(3));
        assert_eq!(snapshot.tasks[0].real_time, secs(3));
        assert_eq!(session.total_time(), secs(5));
    }

    #[test]
    fn test_stop_freezes_and_clears_tasks() {
        let start = Instant::now();
        let mut session = Session::start(start);
        session.register_task("Editor", secs(10)).unwrap();
        session.tick(start + secs(1), editor());
        session.stop();

        session.tick(start + secs(2), editor());

        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(session.total_time(), secs(1));
        assert!(session.tasks().is_empty());
        assert!(!session.pause(start + secs(3)));
        assert_eq!(
            session.register_task("Browser", secs(1)),
            Err(TrackerError::SessionClosed)
        );
    }
}
