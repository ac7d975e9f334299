use std::{fmt::Display, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};

use crate::{config::Settings, tracker::accumulator::AppTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Produced by the report timer.
    Periodic,
    /// Explicitly requested by the user.
    OnDemand,
    /// Produced once, when the session stops.
    Final,
}

impl Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::Periodic => write!(f, "periodic"),
            ReportKind::OnDemand => write!(f, "on demand"),
            ReportKind::Final => write!(f, "final"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskProgress {
    pub name: Arc<str>,
    pub planned_time: Duration,
    pub real_time: Duration,
}

impl TaskProgress {
    pub fn is_completed(&self) -> bool {
        self.real_time >= self.planned_time
    }
}

/// Immutable copy of the session state. Snapshots leave the tracking loop and are consumed by
/// the report pipeline, so the session itself is never shared.
#[derive(Debug, Clone)]
pub struct ReportSnapshot {
    pub kind: ReportKind,
    pub generated_at: DateTime<Utc>,
    pub total_time: Duration,
    /// Applications in first seen order.
    pub apps: Vec<AppTime>,
    pub tasks: Vec<TaskProgress>,
    /// Settings in force when the snapshot was taken.
    pub settings: Settings,
}
