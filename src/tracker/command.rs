use std::{sync::Arc, time::Duration};

use tokio::sync::{broadcast, mpsc, oneshot};

use crate::{config::Settings, error::TrackerError, report::snapshot::ReportKind};

use super::{session::SessionState, tasks::GoalReached};

type Reply<T> = oneshot::Sender<Result<T, TrackerError>>;

/// Requests serviced by the tracking loop. Nothing outside of the loop touches session state,
/// callers go through these instead.
#[derive(Debug)]
pub enum TrackerCommand {
    Pause,
    Resume,
    RegisterTask {
        name: String,
        planned_time: Duration,
        reply: Reply<()>,
    },
    RequestReport,
    UpdateSettings {
        settings: Settings,
        reply: Reply<()>,
    },
    Status {
        reply: Reply<SessionStatus>,
    },
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub total_time: Duration,
    pub active_title: Option<Arc<str>>,
    pub settings: Settings,
}

/// Notifications published by the tracking loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// Emitted after every tick that accumulated time.
    Status(SessionStatus),
    GoalReached(GoalReached),
    Paused,
    Resumed { paused_for: Duration },
    ReportQueued(ReportKind),
    Stopped { total_time: Duration },
}

/// Cloneable entry point for controlling a running tracker.
#[derive(Clone)]
pub struct TrackerHandle {
    commands: mpsc::Sender<TrackerCommand>,
    events: broadcast::Sender<TrackerEvent>,
}

impl TrackerHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<TrackerCommand>,
        events: broadcast::Sender<TrackerEvent>,
    ) -> Self {
        Self { commands, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    pub async fn pause(&self) -> Result<(), TrackerError> {
        self.send(TrackerCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<(), TrackerError> {
        self.send(TrackerCommand::Resume).await
    }

    pub async fn request_report(&self) -> Result<(), TrackerError> {
        self.send(TrackerCommand::RequestReport).await
    }

    /// Asks the tracker to stop. The tracker still takes the final slice of time and produces
    /// the final report before it finishes.
    pub async fn stop(&self) -> Result<(), TrackerError> {
        self.send(TrackerCommand::Stop).await
    }

    pub async fn register_task(
        &self,
        name: impl Into<String>,
        planned_time: Duration,
    ) -> Result<(), TrackerError> {
        let name = name.into();
        self.request(|reply| TrackerCommand::RegisterTask {
            name,
            planned_time,
            reply,
        })
        .await
    }

    pub async fn update_settings(&self, settings: Settings) -> Result<(), TrackerError> {
        self.request(|reply| TrackerCommand::UpdateSettings { settings, reply })
            .await
    }

    pub async fn status(&self) -> Result<SessionStatus, TrackerError> {
        self.request(|reply| TrackerCommand::Status { reply }).await
    }

    async fn send(&self, command: TrackerCommand) -> Result<(), TrackerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| TrackerError::SessionClosed)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> TrackerCommand,
    ) -> Result<T, TrackerError> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply)).await?;
        response.await.map_err(|_| TrackerError::SessionClosed)?
    }
}
