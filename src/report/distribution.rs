use std::{sync::Arc, time::Duration};

use serde::Serialize;

use crate::tracker::accumulator::AppTime;

pub const OTHER_LABEL: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionEntry {
    pub label: Arc<str>,
    #[serde(rename = "seconds", serialize_with = "as_seconds")]
    pub duration: Duration,
}

/// Applications ordered by time spent, bounded in size for charts. Small applications may be
/// collapsed into a trailing [OTHER_LABEL] entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub entries: Vec<DistributionEntry>,
    pub has_other: bool,
}

impl Distribution {
    pub fn total(&self) -> Duration {
        self.entries.iter().map(|v| v.duration).sum()
    }
}

fn as_seconds<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Sorts applications by time spent, descending. Ties keep the order of `app_times`, which is
/// the order applications were first seen in.
///
/// When there are more than `elements_threshold` applications, every application below
/// `threshold_percentage` of `total_time` is merged into a single "Other" entry at the end.
/// `total_time` is the session total, time without an active window included. "Other" is only
/// added if it holds any time. The sum of all entries always equals the sum of the input.
pub fn build_distribution(
    app_times: &[AppTime],
    total_time: Duration,
    threshold_percentage: u8,
    elements_threshold: usize,
) -> Distribution {
    let mut entries = app_times
        .iter()
        .map(|v| DistributionEntry {
            label: v.title.clone(),
            duration: v.duration,
        })
        .collect::<Vec<_>>();
    // Stable sort, so equal durations stay in first seen order.
    entries.sort_by(|a, b| b.duration.cmp(&a.duration));

    if entries.len() <= elements_threshold {
        return Distribution {
            entries,
            has_other: false,
        };
    }

    let cutoff = total_time * threshold_percentage as u32 / 100;

    let (mut kept, collapsed): (Vec<_>, Vec<_>) =
        entries.into_iter().partition(|v| v.duration >= cutoff);
    let other: Duration = collapsed.iter().map(|v| v.duration).sum();

    let has_other = !other.is_zero();
    if has_other {
        kept.push(DistributionEntry {
            label: OTHER_LABEL.into(),
            duration: other,
        });
    }

    Distribution {
        entries: kept,
        has_other,
    }
}
