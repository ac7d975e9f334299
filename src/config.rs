use std::{io::ErrorKind, ops::RangeInclusive, path::Path, time::Duration};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{error::TrackerError, fs::operations::overwrite_file};

pub const SETTINGS_FILE: &str = "settings.json";

const REPORT_INTERVAL_RANGE: RangeInclusive<u32> = 1..=60;
const THRESHOLD_PERCENTAGE_RANGE: RangeInclusive<u8> = 1..=100;
const ELEMENTS_THRESHOLD_RANGE: RangeInclusive<usize> = 1..=20;

/// Runtime tunables of a tracking session. Changes take effect the next time the periodic
/// report timer is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether reports are produced on a timer while tracking.
    pub auto_report_enabled: bool,
    pub report_interval_minutes: u32,
    /// Applications below this share of tracked time are merged into "Other".
    pub threshold_percentage: u8,
    /// Merging into "Other" only happens once there are more applications than this.
    pub elements_threshold: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_report_enabled: false,
            report_interval_minutes: 5,
            threshold_percentage: 5,
            elements_threshold: 10,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), TrackerError> {
        check_range(
            "report_interval_minutes",
            self.report_interval_minutes,
            REPORT_INTERVAL_RANGE,
        )?;
        check_range(
            "threshold_percentage",
            self.threshold_percentage,
            THRESHOLD_PERCENTAGE_RANGE,
        )?;
        check_range(
            "elements_threshold",
            self.elements_threshold,
            ELEMENTS_THRESHOLD_RANGE,
        )?;
        Ok(())
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_minutes as u64 * 60)
    }

    /// Reads settings from `path`. A missing file yields defaults, an invalid one is an error.
    pub async fn load(path: &Path) -> Result<Self> {
        let settings = match tokio::fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str::<Settings>(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No settings at {path:?}, using defaults");
                Settings::default()
            }
            Err(e) => return Err(e.into()),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = serde_json::to_vec_pretty(self)?;
        overwrite_file(path, &content).await?;
        info!("Saved settings to {path:?}");
        Ok(())
    }
}

fn check_range<T>(name: &str, value: T, range: RangeInclusive<T>) -> Result<(), TrackerError>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(TrackerError::InvalidSettings(format!(
            "{name} must be within {}..={}, got {value}",
            range.start(),
            range.end()
        )))
    }
}
