//! Errors - エラー型と分類

use thiserror::Error;

use super::ids::{TaskId, WorkerId};

/// ErrorKind は運用上の分類
///
/// - Transient: 一時的なエラー（次の tick で自然に再試行される）
/// - Permanent: 契約違反（再試行しても無意味）
/// - Infrastructure: ストアの障害
/// - Cancelled: 停止要求による中断（障害ではない）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
    Cancelled,
}

/// StoreError は ports（WorkerPoolSource / TaskStore / AssignmentHistoryStore）の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// `(task_id, worker_id)` の一意制約違反
    #[error("assignment of {task_id} to {worker_id} already recorded")]
    DuplicateAssignment { task_id: TaskId, worker_id: WorkerId },

    #[error("task title '{0}' is already taken")]
    DuplicateTitle(String),

    #[error("{0} not found")]
    NotFound(TaskId),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// RotationError はエンジンとアプリケーション層のエラー
#[derive(Debug, Error)]
pub enum RotationError {
    /// 呼び出し側の契約違反（Completed のタスクを Reassign した、など）
    #[error("precondition violated for {task_id}: {reason}")]
    Precondition { task_id: TaskId, reason: String },

    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("operation cancelled")]
    Cancelled,
}

impl RotationError {
    pub fn precondition(task_id: TaskId, reason: impl Into<String>) -> Self {
        Self::Precondition {
            task_id,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RotationError::Precondition { .. } => ErrorKind::Permanent,
            RotationError::Persistence(StoreError::DuplicateAssignment { .. }) => {
                ErrorKind::Transient
            }
            RotationError::Persistence(_) => ErrorKind::Infrastructure,
            RotationError::Cancelled => ErrorKind::Cancelled,
        }
    }
}
