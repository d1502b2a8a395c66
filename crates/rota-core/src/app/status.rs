//! Status - 1 回の pass の結果報告

use serde::Serialize;

use crate::domain::{Rotation, RotationError, TaskId, WorkerId};

/// What happened to one task during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TaskOutcome {
    Assigned { worker_id: WorkerId },
    Parked,
    Completed,
    Failed { error: String },
}

impl From<&Rotation> for TaskOutcome {
    fn from(rotation: &Rotation) -> Self {
        match rotation {
            Rotation::Assigned { record, .. } => TaskOutcome::Assigned {
                worker_id: record.worker_id,
            },
            Rotation::Parked { .. } => TaskOutcome::Parked,
            Rotation::Completed { .. } => TaskOutcome::Completed,
        }
    }
}

/// Per-task results of one `process_pool` pass.
///
/// Failures are kept per task; the pass itself carried on.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassReport {
    pub pool_size: usize,
    pub outcomes: Vec<(TaskId, TaskOutcome)>,
}

/// Counts by outcome, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassCounts {
    pub assigned: usize,
    pub parked: usize,
    pub completed: usize,
    pub failed: usize,
}

impl PassReport {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, task_id: TaskId, result: &Result<Rotation, RotationError>) {
        let outcome = match result {
            Ok(rotation) => TaskOutcome::from(rotation),
            Err(err) => TaskOutcome::Failed {
                error: err.to_string(),
            },
        };
        self.outcomes.push((task_id, outcome));
    }

    pub fn outcome(&self, task_id: TaskId) -> Option<&TaskOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| *id == task_id)
            .map(|(_, outcome)| outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = (TaskId, &str)> {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            TaskOutcome::Failed { error } => Some((*id, error.as_str())),
            _ => None,
        })
    }

    pub fn counts(&self) -> PassCounts {
        let mut counts = PassCounts::default();
        for (_, outcome) in &self.outcomes {
            match outcome {
                TaskOutcome::Assigned { .. } => counts.assigned += 1,
                TaskOutcome::Parked => counts.parked += 1,
                TaskOutcome::Completed => counts.completed += 1,
                TaskOutcome::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }
}
