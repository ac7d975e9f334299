use std::{path::PathBuf, time::Duration};

use anyhow::{Result, anyhow};
use command::{TrackerEvent, TrackerHandle};
use sampler::Sampler;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    config::Settings,
    report::{
        artifacts::{ChartRenderer, JsonChartRenderer},
        delivery::Delivery,
        pipeline::ReportPipeline,
        snapshot::ReportSnapshot,
    },
    utils::clock::Clock,
    window_api::WindowObserver,
};

pub mod accumulator;
pub mod command;
pub mod pause;
pub mod sampler;
pub mod session;
pub mod shutdown;
pub mod tasks;
pub mod trigger;

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

const COMMAND_QUEUE_SIZE: usize = 32;
const REPORT_QUEUE_SIZE: usize = 4;
const EVENT_CAPACITY: usize = 64;

pub struct TrackerConfig {
    pub tick_period: Duration,
    pub settings: Settings,
    /// Where report artifacts are written.
    pub report_dir: PathBuf,
    pub render_chart: bool,
}

/// A tracking session ready to be started: the sampling loop and the report pipeline feeding
/// off it.
pub struct Tracker<D> {
    sampler: Sampler,
    pipeline: ReportPipeline<D>,
}

/// Wires up a tracker. The returned handle is how everything else talks to it once it runs.
pub fn create_tracker<D: Delivery>(
    config: TrackerConfig,
    observer: impl WindowObserver + 'static,
    clock: impl Clock,
    delivery: D,
    shutdown: &CancellationToken,
) -> (Tracker<D>, TrackerHandle) {
    let (command_sender, command_receiver) = mpsc::channel(COMMAND_QUEUE_SIZE);
    let (report_sender, report_receiver) = mpsc::channel(REPORT_QUEUE_SIZE);
    let (events, _) = broadcast::channel::<TrackerEvent>(EVENT_CAPACITY);

    let sampler = Sampler::new(
        Box::new(observer),
        Box::new(clock),
        command_receiver,
        events.clone(),
        report_sender,
        shutdown.clone(),
        config.tick_period,
        config.settings,
    );

    let renderer = config.render_chart.then(|| {
        Box::new(JsonChartRenderer::new(config.report_dir.clone())) as Box<dyn ChartRenderer>
    });
    let pipeline = ReportPipeline::new(report_receiver, config.report_dir, renderer, delivery);

    (
        Tracker { sampler, pipeline },
        TrackerHandle::new(command_sender, events),
    )
}

impl<D: Delivery + 'static> Tracker<D> {
    /// Tracks until stopped through the handle or the shutdown token. The report pipeline runs
    /// on its own task; it is drained, final report included, before this returns.
    pub async fn run(self) -> Result<ReportSnapshot> {
        let pipeline = tokio::spawn(self.pipeline.run());

        let final_snapshot = self.sampler.run().await;

        pipeline
            .await
            .map_err(|e| anyhow!("Report pipeline panicked {e:?}"))?
            .inspect_err(|e| error!("Report pipeline got an error {e:?}"))?;

        Ok(final_snapshot)
    }
}

#[cfg(test)]
mod tracker_tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use tempfile::{TempDir, tempdir};
    use tokio::{sync::broadcast, time::sleep};
    use tokio_util::sync::CancellationToken;

    use crate::{
        config::Settings,
        error::TrackerError,
        report::{
            artifacts::{CHART_FILE, REPORT_FILE},
            delivery::{Delivery, ReportDelivery, testing::RecordingDelivery},
            snapshot::ReportKind,
        },
        tracker::session::SessionState,
        utils::{clock::DefaultClock, logging::TEST_LOGGING},
        window_api::MockWindowObserver,
    };

    use super::{
        DEFAULT_TICK_PERIOD, REPORT_QUEUE_SIZE, Tracker, TrackerConfig,
        command::{TrackerEvent, TrackerHandle},
        create_tracker,
    };

    fn observer_of(title: &'static str) -> MockWindowObserver {
        let mut observer = MockWindowObserver::new();
        observer
            .expect_active_window_title()
            .returning(move || Ok(Some(Arc::from(title))));
        observer
    }

    fn setup(
        observer: MockWindowObserver,
        settings: Settings,
        shutdown: &CancellationToken,
    ) -> Result<(Tracker<RecordingDelivery>, TrackerHandle, RecordingDelivery, TempDir)> {
        let delivery = RecordingDelivery::default();
        let (tracker, handle, dir) = setup_with(observer, settings, delivery.clone(), shutdown)?;
        Ok((tracker, handle, delivery, dir))
    }

    fn setup_with<D: Delivery>(
        observer: MockWindowObserver,
        settings: Settings,
        delivery: D,
        shutdown: &CancellationToken,
    ) -> Result<(Tracker<D>, TrackerHandle, TempDir)> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let (tracker, handle) = create_tracker(
            TrackerConfig {
                tick_period: DEFAULT_TICK_PERIOD,
                settings,
                report_dir: dir.path().to_path_buf(),
                render_chart: true,
            },
            observer,
            DefaultClock,
            delivery,
            shutdown,
        );
        Ok((tracker, handle, dir))
    }

    /// Takes ten minutes for every report.
    #[derive(Clone, Default)]
    struct SlowDelivery {
        delivered: Arc<Mutex<Vec<ReportKind>>>,
    }

    #[async_trait]
    impl Delivery for SlowDelivery {
        async fn deliver(&mut self, report: &ReportDelivery) -> Result<(), TrackerError> {
            sleep(Duration::from_secs(600)).await;
            self.delivered.lock().unwrap().push(report.kind);
            Ok(())
        }
    }

    fn drain(events: &mut broadcast::Receiver<TrackerEvent>) -> Vec<TrackerEvent> {
        let mut drained = vec![];
        while let Ok(event) = events.try_recv() {
            drained.push(event);
        }
        drained
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracks_active_window() -> Result<()> {
        let shutdown = CancellationToken::new();
        let (tracker, handle, delivery, dir) =
            setup(observer_of("Editor"), Settings::default(), &shutdown)?;

        let running = tokio::spawn(tracker.run());
        sleep(Duration::from_millis(3500)).await;
        handle.stop().await?;
        let snapshot = running.await??;

        // Three full ticks plus the slice up to the stop.
        assert_eq!(snapshot.total_time, Duration::from_millis(3500));
        assert_eq!(snapshot.apps.len(), 1);
        assert_eq!(snapshot.apps[0].duration, Duration::from_millis(3500));
        assert_eq!(snapshot.kind, ReportKind::Final);

        let delivered = delivery.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].kind, ReportKind::Final);
        assert!(dir.path().join(REPORT_FILE).exists());
        assert!(dir.path().join(CHART_FILE).exists());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_excludes_time() -> Result<()> {
        let shutdown = CancellationToken::new();
        let mut observer = MockWindowObserver::new();
        // Ticks at 1s and 2s, the pause at 2.5s, ticks at 8s, 9s and 10s and the stop. None
        // while paused.
        observer
            .expect_active_window_title()
            .times(7)
            .returning(|| Ok(Some("Editor".into())));
        let (tracker, handle, _, _dir) = setup(observer, Settings::default(), &shutdown)?;
        let mut events = handle.subscribe();

        let running = tokio::spawn(tracker.run());
        sleep(Duration::from_millis(2500)).await;
        handle.pause().await?;
        // Pausing twice changes nothing.
        handle.pause().await?;
        sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.status().await?.state, SessionState::Paused);
        handle.resume().await?;
        sleep(Duration::from_millis(2700)).await;
        handle.stop().await?;
        let snapshot = running.await??;

        assert_eq!(snapshot.total_time, Duration::from_millis(5200));
        assert_eq!(snapshot.apps[0].duration, Duration::from_millis(5200));

        let events = drain(&mut events);
        assert_eq!(
            events.iter().filter(|v| **v == TrackerEvent::Paused).count(),
            1
        );
        assert!(events.contains(&TrackerEvent::Resumed {
            paused_for: Duration::from_secs(5)
        }));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_goal_reached_once() -> Result<()> {
        let shutdown = CancellationToken::new();
        let (tracker, handle, _, _dir) =
            setup(observer_of("main.rs - Editor"), Settings::default(), &shutdown)?;
        let mut events = handle.subscribe();

        let running = tokio::spawn(tracker.run());
        handle.register_task("Editor", Duration::from_secs(2)).await?;
        handle.register_task("Browser", Duration::from_secs(2)).await?;
        sleep(Duration::from_millis(4500)).await;
        handle.stop().await?;
        let snapshot = running.await??;

        let goals = drain(&mut events)
            .into_iter()
            .filter_map(|event| match event {
                TrackerEvent::GoalReached(goal) => Some(goal),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(goals.len(), 1);
        assert_eq!(&*goals[0].task, "Editor");

        assert_eq!(snapshot.tasks[0].real_time, Duration::from_secs(2));
        assert!(snapshot.tasks[0].is_completed());
        assert_eq!(snapshot.tasks[1].real_time, Duration::ZERO);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_task_rejected() -> Result<()> {
        let shutdown = CancellationToken::new();
        let (tracker, handle, _, _dir) = setup(observer_of("Editor"), Settings::default(), &shutdown)?;

        let running = tokio::spawn(tracker.run());
        let result = handle.register_task("  ", Duration::from_secs(2)).await;
        assert!(matches!(result, Err(TrackerError::InvalidTask(_))));
        let result = handle.register_task("Editor", Duration::ZERO).await;
        assert!(matches!(result, Err(TrackerError::InvalidTask(_))));

        sleep(Duration::from_millis(1500)).await;
        handle.stop().await?;
        let snapshot = running.await??;

        assert!(snapshot.tasks.is_empty());
        assert_eq!(snapshot.total_time, Duration::from_millis(1500));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_reports() -> Result<()> {
        let shutdown = CancellationToken::new();
        let settings = Settings {
            auto_report_enabled: true,
            report_interval_minutes: 1,
            ..Default::default()
        };
        let (tracker, handle, delivery, _dir) = setup(observer_of("Editor"), settings, &shutdown)?;

        let running = tokio::spawn(tracker.run());
        sleep(Duration::from_secs(150)).await;
        handle.stop().await?;
        let snapshot = running.await??;

        // Reports don't reset accumulation.
        assert_eq!(snapshot.total_time, Duration::from_secs(150));
        let kinds = delivery
            .delivered()
            .into_iter()
            .map(|v| v.kind)
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![ReportKind::Periodic, ReportKind::Periodic, ReportKind::Final]
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_settings_rearms_trigger() -> Result<()> {
        let shutdown = CancellationToken::new();
        let (tracker, handle, delivery, _dir) =
            setup(observer_of("Editor"), Settings::default(), &shutdown)?;

        let running = tokio::spawn(tracker.run());
        sleep(Duration::from_millis(30500)).await;

        let invalid = Settings {
            report_interval_minutes: 0,
            ..Default::default()
        };
        assert!(matches!(
            handle.update_settings(invalid).await,
            Err(TrackerError::InvalidSettings(_))
        ));

        let enabled = Settings {
            auto_report_enabled: true,
            report_interval_minutes: 1,
            ..Default::default()
        };
        handle.update_settings(enabled).await?;
        assert_eq!(handle.status().await?.settings, enabled);

        // Timer restarted at 30.5s, so only the report at 90.5s falls in.
        sleep(Duration::from_secs(70)).await;
        handle.stop().await?;
        running.await??;

        let kinds = delivery
            .delivered()
            .into_iter()
            .map(|v| v.kind)
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec![ReportKind::Periodic, ReportKind::Final]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_on_demand() -> Result<()> {
        let shutdown = CancellationToken::new();
        let (tracker, handle, delivery, _dir) =
            setup(observer_of("Editor"), Settings::default(), &shutdown)?;

        let running = tokio::spawn(tracker.run());
        sleep(Duration::from_millis(2500)).await;
        handle.request_report().await?;
        sleep(Duration::from_secs(1)).await;
        handle.stop().await?;
        running.await??;

        let delivered = delivery.delivered();
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].kind, ReportKind::OnDemand);
        assert_eq!(delivered[0].summary, "Total time: 2s.");
        assert_eq!(delivered[1].summary, "Total time: 3s.");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_pipeline_drops_reports_without_blocking_ticks() -> Result<()> {
        let shutdown = CancellationToken::new();
        let delivery = SlowDelivery::default();
        let (tracker, handle, _dir) = setup_with(
            observer_of("Editor"),
            Settings::default(),
            delivery.clone(),
            &shutdown,
        )?;

        let running = tokio::spawn(tracker.run());
        sleep(Duration::from_millis(500)).await;
        for _ in 0..20 {
            handle.request_report().await?;
        }

        // Reports are stuck in delivery, ticks keep crediting time regardless.
        for second in 1..=5 {
            sleep(Duration::from_secs(1)).await;
            assert_eq!(handle.status().await?.total_time, Duration::from_secs(second));
        }
        handle.stop().await?;
        let snapshot = running.await??;

        assert_eq!(snapshot.total_time, Duration::from_millis(5500));
        let delivered = delivery.delivered.lock().unwrap().clone();
        let on_demand = delivered
            .iter()
            .filter(|v| **v == ReportKind::OnDemand)
            .count();
        // One report in delivery plus a full queue at most, the rest were dropped.
        assert!(
            (1..=REPORT_QUEUE_SIZE + 1).contains(&on_demand),
            "{delivered:?}"
        );
        assert_eq!(delivered.last(), Some(&ReportKind::Final));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_failure_keeps_total_running() -> Result<()> {
        let shutdown = CancellationToken::new();
        let mut observer = MockWindowObserver::new();
        observer
            .expect_active_window_title()
            .returning(|| Err(anyhow!("display is gone")));
        let (tracker, handle, _, _dir) = setup(observer, Settings::default(), &shutdown)?;

        let running = tokio::spawn(tracker.run());
        sleep(Duration::from_millis(2500)).await;
        handle.stop().await?;
        let snapshot = running.await??;

        assert_eq!(snapshot.total_time, Duration::from_millis(2500));
        assert!(snapshot.apps.is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_token_stops_tracker() -> Result<()> {
        let shutdown = CancellationToken::new();
        let (tracker, handle, delivery, _dir) =
            setup(observer_of("Editor"), Settings::default(), &shutdown)?;

        let running = tokio::spawn(tracker.run());
        sleep(Duration::from_millis(1500)).await;
        shutdown.cancel();
        let snapshot = running.await??;

        assert_eq!(snapshot.total_time, Duration::from_millis(1500));
        assert_eq!(delivery.delivered().len(), 1);
        assert_eq!(handle.pause().await, Err(TrackerError::SessionClosed));
        Ok(())
    }
}
