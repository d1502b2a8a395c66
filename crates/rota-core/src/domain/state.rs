//! State - タスクの状態

use serde::{Deserialize, Serialize};
use std::fmt;

/// TaskState はローテーション上のタスクの状態
///
/// # 状態遷移
/// - waiting: 担当者なし（作成直後、または担当可能な worker がいない）
/// - in_progress: 担当者あり
/// - completed: 全 worker を一巡した（終端）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Waiting,
    InProgress,
    Completed,
}

impl TaskState {
    /// Completed 以外はローテーション対象
    pub fn is_active(self) -> bool {
        !matches!(self, TaskState::Completed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Waiting => "waiting",
            TaskState::InProgress => "in_progress",
            TaskState::Completed => "completed",
        };
        f.write_str(s)
    }
}
