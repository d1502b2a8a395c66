//! TaskStore port - タスクの正本（source of truth）
//!
//! # 設計原則
//! - 同じ task_id への変更は同時に 1 つまで（楽観ロック or タスク単位の直列化）
//! - エンジン側はロックを持たず、この保証に依存する

use async_trait::async_trait;

use crate::domain::{StoreError, Task, TaskId};

/// TaskStore は Completed 以外のタスクの読み出しと upsert を提供
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Completed 以外のタスク。`history` は埋めた状態で返すこと。
    async fn list_active_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// id で 1 件取得（Completed も含む）。`history` は埋めた状態で返すこと。
    async fn find_task(&self, task_id: TaskId) -> Result<Option<Task>, StoreError>;

    /// id をキーに upsert
    async fn save_task(&self, task: &Task) -> Result<(), StoreError>;
}
