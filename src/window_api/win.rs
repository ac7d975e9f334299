use std::sync::Arc;

use anyhow::Result;
use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowTextW};

use super::{WindowObserver, normalize_title};

#[tracing::instrument]
pub fn get_active_title() -> Result<Option<Arc<str>>> {
    let window = unsafe { GetForegroundWindow() };

    if window.is_invalid() {
        return Ok(None);
    }

    let mut text: [u16; 4096] = [0; 4096];
    let len = unsafe { GetWindowTextW(window, &mut text) };
    Ok(normalize_title(String::from_utf16_lossy(
        &text[..len.max(0) as usize],
    )))
}

#[derive(Default)]
pub struct WindowsWindowObserver {}

impl WindowsWindowObserver {
    pub fn new() -> Self {
        Self {}
    }
}

impl WindowObserver for WindowsWindowObserver {
    fn active_window_title(&mut self) -> Result<Option<Arc<str>>> {
        get_active_title()
    }
}
