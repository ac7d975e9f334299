use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc::Receiver;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::{
    artifacts::{ChartRenderer, write_report},
    delivery::{Delivery, ReportDelivery},
    distribution::build_distribution,
    snapshot::ReportSnapshot,
    text::{build_report_text, summary_line},
};

/// Receives snapshots from the tracker and turns them into artifacts and deliveries. Runs in a
/// task of its own next to the tracking loop.
pub struct ReportPipeline<D> {
    receiver: Receiver<ReportSnapshot>,
    report_dir: PathBuf,
    renderer: Option<Box<dyn ChartRenderer>>,
    delivery: D,
}

impl<D: Delivery> ReportPipeline<D> {
    pub fn new(
        receiver: Receiver<ReportSnapshot>,
        report_dir: PathBuf,
        renderer: Option<Box<dyn ChartRenderer>>,
        delivery: D,
    ) -> Self {
        Self {
            receiver,
            report_dir,
            renderer,
            delivery,
        }
    }

    /// Processes snapshots until the tracker drops its sender. Whatever is still queued at that
    /// point, the final report included, is processed before returning.
    pub async fn run(mut self) -> Result<()> {
        while let Some(snapshot) = self.receiver.recv().await {
            let span = info_span!("report", kind = %snapshot.kind);
            if let Err(e) = self.process(snapshot).instrument(span).await {
                error!("Failed to produce report {e:?}");
            }
        }
        self.receiver.close();
        info!("Report pipeline finished");
        Ok(())
    }

    async fn process(&mut self, snapshot: ReportSnapshot) -> Result<ReportDelivery> {
        debug!("Processing snapshot {:?}", snapshot);
        let text = build_report_text(&snapshot);
        let report_path = write_report(&self.report_dir, &text).await?;

        let chart_path = match self.renderer.as_mut() {
            Some(renderer) => {
                let distribution = build_distribution(
                    &snapshot.apps,
                    snapshot.total_time,
                    snapshot.settings.threshold_percentage,
                    snapshot.settings.elements_threshold,
                );
                renderer
                    .render(&distribution, &snapshot)
                    .await
                    .inspect_err(|e| warn!("Delivering report without chart: {e}"))
                    .ok()
            }
            None => None,
        };

        let report = ReportDelivery {
            kind: snapshot.kind,
            summary: summary_line(&snapshot),
            report_path,
            chart_path,
        };

        // Artifacts stay on disk even if they couldn't be sent anywhere.
        match self.delivery.deliver(&report).await {
            Ok(()) => info!("Delivered report {:?}", report.report_path),
            Err(e) => error!("{e}, report is kept at {:?}", report.report_path),
        }
        Ok(report)
    }
}
