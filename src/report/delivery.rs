use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::error::TrackerError;

use super::snapshot::ReportKind;

/// Everything produced for a single report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDelivery {
    pub kind: ReportKind,
    pub summary: String,
    pub report_path: PathBuf,
    /// Missing when the chart couldn't be rendered.
    pub chart_path: Option<PathBuf>,
}

/// Outbound channel for finished reports, e.g. a chat bot or e-mail. Failures are reported to
/// the caller and logged, they never affect tracking.
#[async_trait]
pub trait Delivery: Send {
    async fn deliver(&mut self, report: &ReportDelivery) -> Result<(), TrackerError>;
}

/// Prints the summary and the artifact locations to the terminal.
pub struct ConsoleDelivery;

#[async_trait]
impl Delivery for ConsoleDelivery {
    async fn deliver(&mut self, report: &ReportDelivery) -> Result<(), TrackerError> {
        info!("Delivering {} report {:?}", report.kind, report.report_path);
        println!("[{} report] {}", report.kind, report.summary);
        println!("  report: {}", report.report_path.display());
        if let Some(chart) = &report.chart_path {
            println!("  chart data: {}", chart.display());
        }
        Ok(())
    }
}
