//! Contains logic for asking the window system which window is in the foreground.
//! [GenericWindowObserver] is the main artifact of this module that abstracts
//! the operations.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use std::sync::Arc;

use anyhow::Result;

#[cfg(test)]
use mockall::automock;

use crate::error::TrackerError;

/// Intended to serve as a contract windows and linux systems must implement.
#[cfg_attr(test, automock)]
pub trait WindowObserver: Send {
    /// Title of the foreground window. For example 'bash in hello' or 'Vibing in YouTube -
    /// Chrome'. `None` when nothing is focused.
    fn active_window_title(&mut self) -> Result<Option<Arc<str>>>;
}

/// Serves as a cross-compatible WindowObserver implementation.
pub struct GenericWindowObserver {
    inner: Box<dyn WindowObserver>,
}

impl GenericWindowObserver {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsWindowObserver;
                Ok(Self {
                    inner: Box::new(WindowsWindowObserver::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::LinuxWindowObserver;
                Ok(Self {
                    inner: Box::new(LinuxWindowObserver::new()?),
                })
            }
            else {
                Ok(Self {
                    inner: Box::new(UnavailableObserver),
                })
            }
        }
    }
}

impl WindowObserver for GenericWindowObserver {
    fn active_window_title(&mut self) -> Result<Option<Arc<str>>> {
        self.inner.active_window_title()
    }
}

/// Used when the crate is built without any window system backend. Time is still tracked as a
/// whole, it just never lands in a per-application bucket.
pub struct UnavailableObserver;

impl WindowObserver for UnavailableObserver {
    fn active_window_title(&mut self) -> Result<Option<Arc<str>>> {
        Err(TrackerError::ObserverUnavailable("no window system backend was enabled".into()).into())
    }
}

/// Whitespace-only titles carry no information and are treated as no window.
pub(crate) fn normalize_title(title: String) -> Option<Arc<str>> {
    if title.trim().is_empty() {
        None
    } else {
        Some(title.into())
    }
}
