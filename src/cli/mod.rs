pub mod console;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, builder::BoolishValueParser};
use console::{ConsoleExit, print_events, run_console};
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter};

use crate::{
    config::{SETTINGS_FILE, Settings},
    report::delivery::ConsoleDelivery,
    tracker::{DEFAULT_TICK_PERIOD, TrackerConfig, create_tracker, shutdown::detect_shutdown},
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::{CLI_PREFIX, TRACKER_PREFIX, enable_logging},
        time::format_duration,
    },
    window_api::GenericWindowObserver,
};

const REPORTS_DIR: &str = "reports";

#[derive(Parser, Debug)]
#[command(name = "Timetally", version, long_about = None)]
#[command(about = "Tracks time spent in applications and on planned tasks", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Also print logs to the terminal")]
    log: bool,
    #[arg(long, help = "Log level, e.g. debug or trace. Defaults to RUST_LOG or info")]
    log_filter: Option<LevelFilter>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start a tracking session controlled from this terminal")]
    Track {
        #[arg(
            long,
            help = "Application directory. By default $XDG_STATE_HOME/timetally or $HOME/.local/state/timetally"
        )]
        dir: Option<PathBuf>,
        #[command(flatten)]
        overrides: SettingsOverrides,
        #[arg(long, help = "Don't write chart data next to the report")]
        no_chart: bool,
    },
    #[command(about = "Show the saved settings, changing them first if any option is given")]
    Settings {
        #[arg(
            long,
            help = "Application directory. By default $XDG_STATE_HOME/timetally or $HOME/.local/state/timetally"
        )]
        dir: Option<PathBuf>,
        #[command(flatten)]
        overrides: SettingsOverrides,
    },
}

#[derive(clap::Args, Debug, Default)]
struct SettingsOverrides {
    #[arg(
        long,
        value_parser = BoolishValueParser::new(),
        help = "Produce reports periodically, on or off"
    )]
    auto_report: Option<bool>,
    #[arg(long, help = "Minutes between periodic reports, 1 to 60")]
    interval: Option<u32>,
    #[arg(long, help = "Applications under this percentage are grouped into Other, 1 to 100")]
    threshold: Option<u8>,
    #[arg(long, help = "Grouping only starts above this many applications, 1 to 20")]
    elements: Option<usize>,
}

impl SettingsOverrides {
    fn apply(&self, mut settings: Settings) -> Result<Settings> {
        if let Some(v) = self.auto_report {
            settings.auto_report_enabled = v;
        }
        if let Some(v) = self.interval {
            settings.report_interval_minutes = v;
        }
        if let Some(v) = self.threshold {
            settings.threshold_percentage = v;
        }
        if let Some(v) = self.elements {
            settings.elements_threshold = v;
        }
        settings.validate()?;
        Ok(settings)
    }

    fn is_empty(&self) -> bool {
        self.auto_report.is_none()
            && self.interval.is_none()
            && self.threshold.is_none()
            && self.elements.is_none()
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    match args.commands {
        Commands::Track {
            dir,
            overrides,
            no_chart,
        } => {
            let app_dir = dir.map_or_else(create_application_default_path, ensure_dir)?;
            enable_logging(TRACKER_PREFIX, &app_dir, args.log_filter, args.log)?;
            track(app_dir, overrides, !no_chart).await
        }
        Commands::Settings { dir, overrides } => {
            let app_dir = dir.map_or_else(create_application_default_path, ensure_dir)?;
            enable_logging(CLI_PREFIX, &app_dir, args.log_filter, args.log)?;
            settings(app_dir, overrides).await
        }
    }
}

async fn track(app_dir: PathBuf, overrides: SettingsOverrides, render_chart: bool) -> Result<()> {
    let settings = overrides.apply(Settings::load(&app_dir.join(SETTINGS_FILE)).await?)?;
    let report_dir = ensure_dir(app_dir.join(REPORTS_DIR))?;
    info!("Starting tracker in {app_dir:?} with {settings:?}");

    let shutdown = CancellationToken::new();
    let (tracker, handle) = create_tracker(
        TrackerConfig {
            tick_period: DEFAULT_TICK_PERIOD,
            settings,
            report_dir,
            render_chart,
        },
        GenericWindowObserver::new()?,
        DefaultClock,
        ConsoleDelivery,
        &shutdown,
    );

    let events = tokio::spawn(print_events(handle.subscribe()));
    let tracking = tokio::spawn(tracker.run());
    tokio::spawn(detect_shutdown(shutdown.clone()));

    let exit = select! {
        exit = run_console(&handle) => Some(exit?),
        _ = shutdown.cancelled() => None,
    };
    if exit == Some(ConsoleExit::InputClosed) {
        println!("Input closed, press Ctrl-C to stop tracking");
        shutdown.cancelled().await;
    }

    // Fails when the tracker already stopped on Ctrl-C.
    if handle.stop().await.is_err() {
        info!("Tracker already stopping");
    }
    drop(handle);

    let snapshot = tracking
        .await?
        .inspect_err(|e| error!("Tracker got an error {e:?}"))?;
    events.await?;
    shutdown.cancel();

    info!("Session finished with {}", format_duration(snapshot.total_time));
    Ok(())
}

async fn settings(app_dir: PathBuf, overrides: SettingsOverrides) -> Result<()> {
    let path = app_dir.join(SETTINGS_FILE);
    let mut settings = Settings::load(&path).await?;
    if !overrides.is_empty() {
        settings = overrides.apply(settings)?;
        settings.save(&path).await?;
    }
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
