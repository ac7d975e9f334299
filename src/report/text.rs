use std::fmt::Write;

use crate::utils::{percentage::duration_percentage, time::format_duration};

use super::snapshot::ReportSnapshot;

/// One line handed to the delivery channel alongside the report file.
pub fn summary_line(snapshot: &ReportSnapshot) -> String {
    format!("Total time: {}.", format_duration(snapshot.total_time))
}

/// Renders the textual report. Output only depends on the snapshot: applications are listed
/// by time spent (ties in first seen order), tasks in registration order.
pub fn build_report_text(snapshot: &ReportSnapshot) -> String {
    let mut out = String::new();
    // Writing into a String can't fail.
    let _ = write_report(&mut out, snapshot);
    out
}

fn write_report(out: &mut String, snapshot: &ReportSnapshot) -> std::fmt::Result {
    writeln!(
        out,
        "Report ({}) generated at {}",
        snapshot.kind,
        snapshot.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out, "Total time: {}", format_duration(snapshot.total_time))?;

    writeln!(out)?;
    writeln!(out, "Time by application:")?;
    let mut apps = snapshot.apps.iter().collect::<Vec<_>>();
    apps.sort_by(|a, b| b.duration.cmp(&a.duration));
    if apps.is_empty() {
        writeln!(out, "- none")?;
    }
    for app in apps {
        writeln!(
            out,
            "- {}: {} ({})",
            app.title,
            format_duration(app.duration),
            duration_percentage(app.duration, snapshot.total_time)
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Session tasks:")?;
    if snapshot.tasks.is_empty() {
        writeln!(out, "- none")?;
    }
    for task in &snapshot.tasks {
        if task.is_completed() {
            writeln!(out, "- {}: completed", task.name)?;
        } else {
            writeln!(
                out,
                "- {}: {} // {}",
                task.name,
                format_duration(task.planned_time),
                format_duration(task.real_time)
            )?;
        }
    }
    Ok(())
}
