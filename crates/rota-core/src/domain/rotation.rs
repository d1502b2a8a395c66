//! Rotation - エンジンの判定結果
//!
//! エンジンは副作用を持たず、「次の状態」を Rotation として返します。
//! 永続化（履歴の追記 → タスクの保存）は AssignmentService が行います。

use super::assignment::AssignmentRecord;
use super::task::Task;

/// The next desired state of one task.
#[derive(Debug, Clone, PartialEq)]
pub enum Rotation {
    /// A worker was chosen. `record` must be appended before `task` is saved.
    Assigned { task: Task, record: AssignmentRecord },

    /// Nobody can take the task right now.
    Parked { task: Task },

    /// Every worker in the pool has served the task.
    Completed { task: Task },
}

impl Rotation {
    pub fn task(&self) -> &Task {
        match self {
            Rotation::Assigned { task, .. } => task,
            Rotation::Parked { task } => task,
            Rotation::Completed { task } => task,
        }
    }

    pub fn into_task(self) -> Task {
        match self {
            Rotation::Assigned { task, .. } => task,
            Rotation::Parked { task } => task,
            Rotation::Completed { task } => task,
        }
    }

    pub fn record(&self) -> Option<&AssignmentRecord> {
        match self {
            Rotation::Assigned { record, .. } => Some(record),
            _ => None,
        }
    }
}
