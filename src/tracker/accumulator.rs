use std::{collections::HashMap, sync::Arc, time::Duration};

/// Time spent in a single application during the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTime {
    pub title: Arc<str>,
    pub duration: Duration,
}

/// Running totals of the session. Purely additive: nothing is ever subtracted and applications
/// are never forgotten. Applications keep the order in which they were first seen, which is what
/// reports use to break ties.
#[derive(Debug, Default)]
pub struct Accumulator {
    total_time: Duration,
    apps: Vec<AppTime>,
    index: HashMap<Arc<str>, usize>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a slice of tracked time. Without an active window only the total grows.
    pub fn add(&mut self, elapsed: Duration, title: Option<&Arc<str>>) {
        self.total_time += elapsed;

        let Some(title) = title else {
            return;
        };
        let position = match self.index.get(title) {
            Some(position) => *position,
            None => {
                self.apps.push(AppTime {
                    title: title.clone(),
                    duration: Duration::ZERO,
                });
                self.index.insert(title.clone(), self.apps.len() - 1);
                self.apps.len() - 1
            }
        };
        self.apps[position].duration += elapsed;
    }

    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    /// Applications in first seen order.
    pub fn app_times(&self) -> &[AppTime] {
        &self.apps
    }

    pub fn app_time(&self, title: &str) -> Option<Duration> {
        self.index.get(title).map(|position| self.apps[*position].duration)
    }
}
