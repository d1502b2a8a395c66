//! Task snapshot: lifecycle state + current/previous worker + assignment history.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::assignment::AssignmentRecord;
use super::ids::{TaskId, WorkerId};
use super::state::TaskState;

/// A task as seen by the rotation engine.
///
/// Design:
/// - This is a value snapshot. The engine never mutates the caller's copy;
///   transitions below consume `self` and return the next snapshot.
/// - `history` is ordered and append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub state: TaskState,
    pub current_worker: Option<WorkerId>,
    /// The worker displaced by the most recent rotation.
    pub previous_worker: Option<WorkerId>,
    pub history: Vec<AssignmentRecord>,
}

impl Task {
    /// A freshly created task: Waiting, nobody assigned, empty history.
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            state: TaskState::Waiting,
            current_worker: None,
            previous_worker: None,
            history: Vec::new(),
        }
    }

    /// Distinct workers that have served this task so far.
    pub fn served_workers(&self) -> HashSet<WorkerId> {
        self.history.iter().map(|r| r.worker_id).collect()
    }

    /// Check the state/worker invariants.
    ///
    /// - `InProgress` ⇔ `current_worker` is set
    /// - `Completed` ⇒ neither current nor previous worker is set
    pub fn check_invariants(&self) -> Result<(), String> {
        match (self.state, self.current_worker.is_some()) {
            (TaskState::InProgress, false) => {
                return Err("in_progress task has no current worker".to_string());
            }
            (TaskState::Waiting | TaskState::Completed, true) => {
                return Err(format!("{} task has a current worker", self.state));
            }
            _ => {}
        }
        if self.state == TaskState::Completed && self.previous_worker.is_some() {
            return Err("completed task still has a previous worker".to_string());
        }
        Ok(())
    }

    /// Hand the task to `record.worker_id`, shifting the current worker into
    /// `previous_worker` and appending the record to the history.
    pub fn assigned(mut self, record: AssignmentRecord) -> Self {
        self.previous_worker = self.current_worker;
        self.current_worker = Some(record.worker_id);
        self.state = TaskState::InProgress;
        self.history.push(record);
        self
    }

    /// Park the task: nobody holds it. `previous_worker` is left untouched
    /// so it stays excluded once the pool recovers.
    pub fn parked(mut self) -> Self {
        self.state = TaskState::Waiting;
        self.current_worker = None;
        self
    }

    /// Terminal transition.
    pub fn completed(mut self) -> Self {
        self.state = TaskState::Completed;
        self.current_worker = None;
        self.previous_worker = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use ulid::Ulid;

    use crate::domain::ids::AssignmentId;

    fn worker(n: u128) -> WorkerId {
        WorkerId::from_ulid(Ulid::from_parts(0, n))
    }

    fn record(task: &Task, w: WorkerId) -> AssignmentRecord {
        AssignmentRecord::new(AssignmentId::from_ulid(Ulid::new()), task.id, w, Utc::now())
    }

    #[test]
    fn new_task_starts_waiting_with_empty_history() {
        let task = Task::new(TaskId::from_ulid(Ulid::new()), "write docs");
        assert_eq!(task.state, TaskState::Waiting);
        assert_eq!(task.current_worker, None);
        assert_eq!(task.previous_worker, None);
        assert!(task.history.is_empty());
        assert!(task.check_invariants().is_ok());
    }

    #[test]
    fn assigned_shifts_current_into_previous() {
        let task = Task::new(TaskId::from_ulid(Ulid::new()), "t");
        let r1 = record(&task, worker(1));
        let task = task.assigned(r1);
        let r2 = record(&task, worker(2));
        let task = task.assigned(r2);

        assert_eq!(task.state, TaskState::InProgress);
        assert_eq!(task.current_worker, Some(worker(2)));
        assert_eq!(task.previous_worker, Some(worker(1)));
        assert_eq!(task.history.len(), 2);
        assert_eq!(task.served_workers().len(), 2);
    }

    #[test]
    fn parked_keeps_previous_worker() {
        let mut task = Task::new(TaskId::from_ulid(Ulid::new()), "t");
        task.state = TaskState::InProgress;
        task.current_worker = Some(worker(2));
        task.previous_worker = Some(worker(1));

        let task = task.parked();
        assert_eq!(task.state, TaskState::Waiting);
        assert_eq!(task.current_worker, None);
        assert_eq!(task.previous_worker, Some(worker(1)));
    }

    #[test]
    fn completed_clears_both_workers() {
        let mut task = Task::new(TaskId::from_ulid(Ulid::new()), "t");
        task.state = TaskState::InProgress;
        task.current_worker = Some(worker(2));
        task.previous_worker = Some(worker(1));

        let task = task.completed();
        assert_eq!(task.state, TaskState::Completed);
        assert_eq!(task.current_worker, None);
        assert_eq!(task.previous_worker, None);
        assert!(task.check_invariants().is_ok());
    }

    #[rstest]
    #[case::in_progress_without_worker(TaskState::InProgress, None, None)]
    #[case::waiting_with_worker(TaskState::Waiting, Some(1), None)]
    #[case::completed_with_worker(TaskState::Completed, Some(1), None)]
    #[case::completed_with_previous(TaskState::Completed, None, Some(1))]
    fn invariant_violations_are_detected(
        #[case] state: TaskState,
        #[case] current: Option<u128>,
        #[case] previous: Option<u128>,
    ) {
        let mut task = Task::new(TaskId::from_ulid(Ulid::new()), "t");
        task.state = state;
        task.current_worker = current.map(worker);
        task.previous_worker = previous.map(worker);

        assert!(task.check_invariants().is_err());
    }
}
