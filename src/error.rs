use thiserror::Error;

/// Failures the tracker reports to its callers. None of these are fatal to a running session:
/// only an explicit stop halts accumulation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// Task registration was rejected. The session is left untouched.
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// Settings outside of their allowed ranges.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// The window system could not be queried. Treated as "no active window" for the tick.
    #[error("Window observer unavailable: {0}")]
    ObserverUnavailable(String),

    /// Report was generated but could not be handed over to the delivery channel.
    #[error("Failed to deliver report: {0}")]
    DeliveryFailure(String),

    /// Distribution chart could not be produced. The text report is still delivered.
    #[error("Failed to render distribution chart: {0}")]
    RenderFailure(String),

    /// The tracker has already stopped and no longer accepts commands.
    #[error("Tracking session is closed")]
    SessionClosed,
}
