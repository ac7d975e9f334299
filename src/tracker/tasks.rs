use std::{sync::Arc, time::Duration};

use tracing::{debug, info};

use crate::error::TrackerError;

/// A unit of intent the user wants to spend `planned_time` on. Window titles are matched
/// against the words of the task name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: Arc<str>,
    pub planned_time: Duration,
    pub real_time: Duration,
    /// Set once `real_time` reached `planned_time`. Guards the one-shot goal alert.
    pub goal_reached: bool,
    tokens: Vec<String>,
}

impl Task {
    fn new(name: Arc<str>, planned_time: Duration) -> Self {
        let tokens = name.split_whitespace().map(str::to_owned).collect();
        Self {
            name,
            planned_time,
            real_time: Duration::ZERO,
            goal_reached: false,
            tokens,
        }
    }

    /// A title matches when any word of the task name occurs in it. Matching is case
    /// sensitive.
    pub fn matches(&self, title: &str) -> bool {
        self.tokens.iter().any(|token| title.contains(token.as_str()))
    }

    /// Adds matched time. Returns true exactly once: on the slice that reaches the goal.
    fn record(&mut self, elapsed: Duration) -> bool {
        self.real_time = (self.real_time + elapsed).min(self.planned_time);
        if self.real_time == self.planned_time && !self.goal_reached {
            self.goal_reached = true;
            return true;
        }
        false
    }

    pub fn is_completed(&self) -> bool {
        self.real_time >= self.planned_time
    }
}

/// Raised the first time a task accumulates its planned time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalReached {
    pub task: Arc<str>,
    pub planned_time: Duration,
}

#[derive(Debug, Default)]
pub struct TaskMatcher {
    tasks: Vec<Task>,
}

impl TaskMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_task(&mut self, name: &str, planned_time: Duration) -> Result<(), TrackerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::InvalidTask("task name can't be empty".into()));
        }
        if planned_time.is_zero() {
            return Err(TrackerError::InvalidTask(format!(
                "planned time of {name:?} must be positive"
            )));
        }
        if self.tasks.iter().any(|task| &*task.name == name) {
            return Err(TrackerError::InvalidTask(format!(
                "task {name:?} is already registered"
            )));
        }

        info!("Registered task {name:?} planned for {planned_time:?}");
        self.tasks.push(Task::new(name.into(), planned_time));
        Ok(())
    }

    /// Credits `elapsed` to every task matching `title`. Several tasks may match the same
    /// title.
    pub fn record(&mut self, elapsed: Duration, title: Option<&str>) -> Vec<GoalReached> {
        let Some(title) = title else {
            return vec![];
        };

        let mut reached = vec![];
        for task in self.tasks.iter_mut().filter(|task| task.matches(title)) {
            debug!("Task {:?} matched {title:?}", task.name);
            if task.record(elapsed) {
                reached.push(GoalReached {
                    task: task.name.clone(),
                    planned_time: task.planned_time,
                });
            }
        }
        reached
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn clear_tasks(&mut self) {
        self.tasks.clear();
    }
}
