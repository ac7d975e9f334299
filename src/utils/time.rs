use std::time::Duration;

/// This is the standard way of presenting tracked time in timetally, whole seconds only.
pub fn format_duration(v: Duration) -> String {
    let seconds = v.as_secs();
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds % 60)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds % 60)
    }
}
