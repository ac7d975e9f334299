use std::{sync::Arc, time::Duration};

use tokio::sync::{
    broadcast,
    mpsc::{self, error::TrySendError},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::Settings,
    report::snapshot::{ReportKind, ReportSnapshot},
    utils::{
        clock::{Clock, sleep_until_opt},
        time::format_duration,
    },
    window_api::WindowObserver,
};

use super::{
    command::{SessionStatus, TrackerCommand, TrackerEvent},
    session::Session,
    trigger::PeriodicTrigger,
};

/// What woke the loop up.
enum Wake {
    Shutdown,
    Command(Option<TrackerCommand>),
    Tick,
    Report,
}

/// The tracking loop. It owns the [Session] and is the only place session state is changed:
/// ticks, commands and report requests are all serviced one after another from here.
pub struct Sampler {
    observer: Box<dyn WindowObserver>,
    clock: Box<dyn Clock>,
    commands: mpsc::Receiver<TrackerCommand>,
    events: broadcast::Sender<TrackerEvent>,
    reports: mpsc::Sender<ReportSnapshot>,
    shutdown: CancellationToken,
    tick_period: Duration,
    settings: Settings,
    trigger: PeriodicTrigger,
    session: Session,
    active_title: Option<Arc<str>>,
    observer_failing: bool,
}

impl Sampler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        observer: Box<dyn WindowObserver>,
        clock: Box<dyn Clock>,
        commands: mpsc::Receiver<TrackerCommand>,
        events: broadcast::Sender<TrackerEvent>,
        reports: mpsc::Sender<ReportSnapshot>,
        shutdown: CancellationToken,
        tick_period: Duration,
        settings: Settings,
    ) -> Self {
        let session = Session::start(clock.instant());
        Self {
            observer,
            clock,
            commands,
            events,
            reports,
            shutdown,
            tick_period,
            settings,
            trigger: PeriodicTrigger::new(),
            session,
            active_title: None,
            observer_failing: false,
        }
    }

    /// Executes the tracking loop until stopped. Returns the final report snapshot, which has
    /// also been queued for delivery.
    pub async fn run(mut self) -> ReportSnapshot {
        info!("Tracking started");
        let mut next_tick = self.clock.instant() + self.tick_period;
        self.trigger.rearm(&self.settings, self.clock.instant());

        loop {
            let wake = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => Wake::Shutdown,
                command = self.commands.recv() => Wake::Command(command),
                _ = self.clock.sleep_until(next_tick) => Wake::Tick,
                _ = sleep_until_opt(self.clock.as_ref(), self.trigger.deadline()) => Wake::Report,
            };

            match wake {
                // Dropping every handle means nobody is able to stop the session anymore.
                Wake::Shutdown | Wake::Command(None) | Wake::Command(Some(TrackerCommand::Stop)) => {
                    break;
                }
                Wake::Command(Some(command)) => self.handle_command(command),
                Wake::Tick => {
                    next_tick += self.tick_period;
                    self.sample();
                }
                Wake::Report => {
                    if self.trigger.fire(self.clock.instant()) {
                        self.queue_report(ReportKind::Periodic);
                    }
                }
            }
        }

        self.finish().await
    }

    /// Credits the time since the previous tick. The window system is not queried while paused.
    fn sample(&mut self) {
        if !self.session.is_accumulating() {
            return;
        }
        let title = self.observe();
        let outcome = self.session.tick(self.clock.instant(), title.clone());
        self.active_title = title;

        for goal in outcome.goals {
            info!(
                "Task {:?} reached its planned time of {}",
                goal.task,
                format_duration(goal.planned_time)
            );
            self.publish(TrackerEvent::GoalReached(goal));
        }
        self.publish(TrackerEvent::Status(self.status()));
    }

    fn observe(&mut self) -> Option<Arc<str>> {
        match self.observer.active_window_title() {
            Ok(title) => {
                self.observer_failing = false;
                title
            }
            Err(e) => {
                // Reported once per outage, the observer may keep failing every tick.
                if !self.observer_failing {
                    warn!("Can't query the active window, time is tracked without application {e:?}");
                } else {
                    debug!("Window observer still failing {e:?}");
                }
                self.observer_failing = true;
                None
            }
        }
    }

    #[instrument(skip(self))]
    fn handle_command(&mut self, command: TrackerCommand) {
        match command {
            TrackerCommand::Pause => {
                // The slice up to the pause still counts.
                self.sample();
                if self.session.pause(self.clock.instant()) {
                    info!("Tracking paused at {}", format_duration(self.session.total_time()));
                    self.publish(TrackerEvent::Paused);
                }
            }
            TrackerCommand::Resume => {
                if let Some(paused_for) = self.session.resume(self.clock.instant()) {
                    info!("Tracking resumed after a pause of {}", format_duration(paused_for));
                    self.publish(TrackerEvent::Resumed { paused_for });
                }
            }
            TrackerCommand::RegisterTask {
                name,
                planned_time,
                reply,
            } => {
                let result = self
                    .session
                    .register_task(&name, planned_time)
                    .inspect_err(|e| warn!("Rejected task {e}"));
                let _ = reply.send(result);
            }
            TrackerCommand::RequestReport => self.queue_report(ReportKind::OnDemand),
            TrackerCommand::UpdateSettings { settings, reply } => {
                let result = settings.validate();
                if result.is_ok() {
                    info!("Settings updated {settings:?}");
                    self.settings = settings;
                    self.trigger.rearm(&self.settings, self.clock.instant());
                }
                let _ = reply.send(result);
            }
            TrackerCommand::Status { reply } => {
                let _ = reply.send(Ok(self.status()));
            }
            TrackerCommand::Stop => debug!("Stop is handled by the tracking loop"),
        }
    }

    /// Hands a snapshot over to the report pipeline without waiting. If the pipeline is still
    /// busy with earlier reports the snapshot is dropped, sampling must never wait on delivery.
    fn queue_report(&mut self, kind: ReportKind) {
        let snapshot = self
            .session
            .snapshot(kind, self.clock.time(), self.settings);
        match self.reports.try_send(snapshot) {
            Ok(()) => {
                debug!("Queued {kind} report");
                self.publish(TrackerEvent::ReportQueued(kind));
            }
            Err(TrySendError::Full(_)) => warn!("Report pipeline is busy, skipping {kind} report"),
            Err(TrySendError::Closed(_)) => error!("Report pipeline is gone, {kind} report is lost"),
        }
    }

    async fn finish(mut self) -> ReportSnapshot {
        self.sample();
        self.trigger.disarm();
        let snapshot = self
            .session
            .snapshot(ReportKind::Final, self.clock.time(), self.settings);
        self.session.stop();
        info!(
            "Tracking stopped, total time {}",
            format_duration(snapshot.total_time)
        );

        // The final report is the one report that waits for room in the queue.
        if self.reports.send(snapshot.clone()).await.is_err() {
            error!("Report pipeline is gone, final report is lost");
        } else {
            self.publish(TrackerEvent::ReportQueued(ReportKind::Final));
        }
        self.publish(TrackerEvent::Stopped {
            total_time: snapshot.total_time,
        });
        snapshot
    }

    fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.session.state(),
            total_time: self.session.total_time(),
            active_title: self.active_title.clone(),
            settings: self.settings,
        }
    }

    fn publish(&self, event: TrackerEvent) {
        // Having no subscribers is fine.
        let _ = self.events.send(event);
    }
}
