use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{error::TrackerError, fs::operations::overwrite_file};

use super::{distribution::Distribution, snapshot::ReportSnapshot};

pub const REPORT_FILE: &str = "report.txt";
pub const CHART_FILE: &str = "distribution.json";

/// Writes the text report, replacing the previous one.
pub async fn write_report(dir: &Path, text: &str) -> Result<PathBuf> {
    let path = dir.join(REPORT_FILE);
    overwrite_file(&path, text.as_bytes()).await?;
    Ok(path)
}

/// Turns a distribution into a chart artifact. Implementations may draw an actual image, the
/// tracker only cares about the resulting file.
#[async_trait]
pub trait ChartRenderer: Send {
    async fn render(
        &mut self,
        distribution: &Distribution,
        snapshot: &ReportSnapshot,
    ) -> Result<PathBuf, TrackerError>;
}

#[derive(Serialize)]
struct ChartData<'a> {
    title: &'static str,
    generated_at: DateTime<Utc>,
    total_seconds: f64,
    #[serde(flatten)]
    distribution: &'a Distribution,
}

/// Writes the numbers a pie chart is drawn from as JSON, so any plotting tool can pick them up.
pub struct JsonChartRenderer {
    dir: PathBuf,
}

impl JsonChartRenderer {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl ChartRenderer for JsonChartRenderer {
    async fn render(
        &mut self,
        distribution: &Distribution,
        snapshot: &ReportSnapshot,
    ) -> Result<PathBuf, TrackerError> {
        let data = ChartData {
            title: "Time spent in applications",
            generated_at: snapshot.generated_at,
            total_seconds: snapshot.total_time.as_secs_f64(),
            distribution,
        };
        let content = serde_json::to_vec_pretty(&data)
            .map_err(|e| TrackerError::RenderFailure(e.to_string()))?;
        let path = self.dir.join(CHART_FILE);
        overwrite_file(&path, &content)
            .await
            .map_err(|e| TrackerError::RenderFailure(format!("{e:#}")))?;
        Ok(path)
    }
}
