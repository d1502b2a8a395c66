//! AssignmentHistoryStore port - 割り当て履歴（追記専用）

use async_trait::async_trait;

use crate::domain::{AssignmentRecord, StoreError};

/// AssignmentHistoryStore は AssignmentRecord を追記するだけ
///
/// # 契約
/// - 更新・削除 API はない
/// - `(task_id, worker_id)` が既にあれば `StoreError::DuplicateAssignment`
#[async_trait]
pub trait AssignmentHistoryStore: Send + Sync {
    async fn append(&self, record: &AssignmentRecord) -> Result<(), StoreError>;
}
