use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, builder::BoolishValueParser};
use futures::StreamExt;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    error::TrackerError,
    tracker::command::{TrackerEvent, TrackerHandle},
    utils::time::format_duration,
};

/// One line typed into the console while tracking.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "timetally", no_binary_name = true, disable_version_flag = true)]
#[command(override_usage = "<COMMAND> [ARGS]")]
pub enum ConsoleCommand {
    #[command(about = "Stop counting time")]
    Pause,
    #[command(about = "Continue counting time")]
    Resume,
    #[command(about = "Plan time for a task, matched against window titles by any word of its name")]
    Task {
        #[arg(help = "Planned time in seconds")]
        seconds: u64,
        #[arg(required = true, num_args = 1.., help = "Task name")]
        name: Vec<String>,
    },
    #[command(about = "Produce a report now")]
    Report,
    #[command(about = "Change a setting of the running session")]
    Set {
        #[command(subcommand)]
        change: SettingChange,
    },
    #[command(about = "Show the current session")]
    Status,
    #[command(about = "Finish the session with a final report", alias = "quit")]
    Stop,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    #[command(about = "Produce reports periodically, on or off")]
    AutoReport {
        #[arg(action = clap::ArgAction::Set, value_parser = BoolishValueParser::new())]
        enabled: bool,
    },
    #[command(about = "Minutes between periodic reports, 1 to 60")]
    Interval { minutes: u32 },
    #[command(about = "Applications under this percentage are grouped into Other, 1 to 100")]
    Threshold { percentage: u8 },
    #[command(about = "Grouping only starts above this many applications, 1 to 20")]
    Elements { count: usize },
}

impl SettingChange {
    pub fn apply(self, mut settings: Settings) -> Result<Settings, TrackerError> {
        match self {
            SettingChange::AutoReport { enabled } => settings.auto_report_enabled = enabled,
            SettingChange::Interval { minutes } => settings.report_interval_minutes = minutes,
            SettingChange::Threshold { percentage } => settings.threshold_percentage = percentage,
            SettingChange::Elements { count } => settings.elements_threshold = count,
        }
        settings.validate()?;
        Ok(settings)
    }
}

/// Why the console stopped reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    Stop,
    InputClosed,
}

/// Parses one line typed by the user. Blank lines give `None`, `help` and mistakes come back as
/// clap errors carrying the text to show.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, clap::Error> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    ConsoleCommand::try_parse_from(line.split_whitespace()).map(Some)
}

/// Reads commands from stdin and forwards them to the tracker until `stop` is typed or stdin
/// is closed. Mistakes are printed back and reading continues.
pub async fn run_console(handle: &TrackerHandle) -> Result<ConsoleExit> {
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    println!("Tracking. Type help for the list of commands.");

    while let Some(line) = lines.next().await {
        let line = line?;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                print!("{}", e.render());
                continue;
            }
        };
        debug!("Console command {command:?}");
        if command == ConsoleCommand::Stop {
            return Ok(ConsoleExit::Stop);
        }
        if let Err(e) = execute(handle, command).await {
            println!("{e}");
        }
    }

    info!("Console input closed");
    Ok(ConsoleExit::InputClosed)
}

async fn execute(handle: &TrackerHandle, command: ConsoleCommand) -> Result<()> {
    match command {
        ConsoleCommand::Pause => handle.pause().await?,
        ConsoleCommand::Resume => handle.resume().await?,
        ConsoleCommand::Report => handle.request_report().await?,
        ConsoleCommand::Task { seconds, name } => {
            let planned_time = Duration::from_secs(seconds);
            let name = name.join(" ");
            handle.register_task(name.as_str(), planned_time).await?;
            println!("Planned {} for {name}", format_duration(planned_time));
        }
        ConsoleCommand::Set { change } => {
            let settings = change.apply(handle.status().await?.settings)?;
            handle.update_settings(settings).await?;
            println!("Settings updated");
        }
        ConsoleCommand::Status => {
            let status = handle.status().await?;
            println!(
                "Session is {}, total time {}",
                status.state,
                format_duration(status.total_time)
            );
            if let Some(title) = status.active_title {
                println!("Active window: {title}");
            }
            println!("Settings: {:?}", status.settings);
        }
        ConsoleCommand::Stop => (),
    }
    Ok(())
}

/// Prints notifications worth the user's attention until the tracker stops.
pub async fn print_events(mut events: broadcast::Receiver<TrackerEvent>) {
    loop {
        match events.recv().await {
            Ok(TrackerEvent::GoalReached(goal)) => println!(
                "Task {} reached its planned time of {}",
                goal.task,
                format_duration(goal.planned_time)
            ),
            Ok(TrackerEvent::Paused) => println!("Paused"),
            Ok(TrackerEvent::Resumed { paused_for }) => {
                println!("Resumed after {}", format_duration(paused_for))
            }
            Ok(TrackerEvent::Stopped { total_time }) => {
                println!("Stopped, total time {}", format_duration(total_time));
                return;
            }
            Ok(event) => debug!("Tracker event {event:?}"),
            Err(RecvError::Lagged(skipped)) => warn!("Missed {skipped} tracker events"),
            Err(RecvError::Closed) => return,
        }
    }
}
