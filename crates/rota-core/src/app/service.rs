//! AssignmentService - エンジンの判定をストアに反映する
//!
//! # フロー
//! 1. WorkerPoolSource / TaskStore からスナップショットを取得
//! 2. RotationEngine で次の状態を判定
//! 3. 履歴を追記 → タスクを保存（この順序を崩さない）
//!
//! 履歴の追記とタスクの保存の間で落ちた場合、残るのは「孤立した履歴」であり、
//! 「割り当て済みなのに履歴がないタスク」にはなりません。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::cancel::guard;
use super::status::PassReport;
use crate::domain::{DomainEvent, Rotation, RotationError, StoreError, Task, TaskState};
use crate::engine::RotationEngine;
use crate::ports::{AssignmentHistoryStore, TaskStore, WorkerPoolSource};

/// Applies [`RotationEngine`] decisions through the store ports.
pub struct AssignmentService {
    engine: RotationEngine,
    workers: Arc<dyn WorkerPoolSource>,
    tasks: Arc<dyn TaskStore>,
    history: Arc<dyn AssignmentHistoryStore>,
}

impl AssignmentService {
    pub fn new(
        engine: RotationEngine,
        workers: Arc<dyn WorkerPoolSource>,
        tasks: Arc<dyn TaskStore>,
        history: Arc<dyn AssignmentHistoryStore>,
    ) -> Self {
        Self {
            engine,
            workers,
            tasks,
            history,
        }
    }

    pub fn engine(&self) -> &RotationEngine {
        &self.engine
    }

    /// Entry point for domain events.
    pub async fn handle(
        &self,
        event: DomainEvent,
        cancel: &CancellationToken,
    ) -> Result<Task, RotationError> {
        match event {
            DomainEvent::TaskCreated { task } => self.assign_initial(&task, cancel).await,
        }
    }

    /// Assign a freshly created task to a random worker, or leave it waiting
    /// when the pool is empty. Returns the persisted snapshot.
    ///
    /// The task is re-read from the store first. When a pass has already
    /// assigned or parked it, the stored snapshot is returned untouched.
    pub async fn assign_initial(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<Task, RotationError> {
        info!(task_id = %task.id, "starting initial assignment");

        // a pass may already have picked the task up; decide on the stored row
        let stored = guard(cancel, self.tasks.find_task(task.id))
            .await?
            .ok_or(StoreError::NotFound(task.id))?;
        if stored.state != TaskState::Waiting || !stored.history.is_empty() {
            info!(
                task_id = %task.id,
                state = %stored.state,
                "task already rotating, skipping initial assignment"
            );
            return Ok(stored);
        }

        let pool = guard(cancel, self.workers.list_workers()).await?;
        debug!(task_id = %task.id, workers = pool.len(), "fetched worker pool");

        let rotation = self.engine.assign_initial(&stored, &pool)?;
        self.apply(&rotation, cancel).await?;

        match &rotation {
            Rotation::Assigned { record, .. } => {
                info!(task_id = %task.id, worker_id = %record.worker_id, "task assigned");
            }
            _ => warn!(task_id = %task.id, "no workers available, task left waiting"),
        }
        Ok(rotation.into_task())
    }

    /// One full reassignment pass over every active task.
    ///
    /// Fetch failures abort the pass (there is nothing to iterate). A failure
    /// while persisting one task is recorded in the report and the pass moves
    /// on; that task's state was not advanced, so the next tick retries it.
    /// Cancellation aborts the pass immediately.
    pub async fn process_pool(&self, cancel: &CancellationToken) -> Result<PassReport, RotationError> {
        info!("starting reassignment pass");

        let pool = guard(cancel, self.workers.list_workers()).await?;
        let tasks = guard(cancel, self.tasks.list_active_tasks()).await?;
        info!(workers = pool.len(), tasks = tasks.len(), "fetched pass snapshot");

        if pool.is_empty() && !tasks.is_empty() {
            warn!("no workers available, parking every active task");
        }

        let mut report = PassReport::new(pool.len());
        for (task_id, decision) in self.engine.plan_pass(&pool, &tasks) {
            if cancel.is_cancelled() {
                return Err(RotationError::Cancelled);
            }

            let result = match decision {
                Ok(rotation) => self.apply(&rotation, cancel).await.map(|()| rotation),
                Err(err) => Err(err),
            };

            match &result {
                Err(RotationError::Cancelled) => return Err(RotationError::Cancelled),
                Err(err) => {
                    error!(task_id = %task_id, kind = ?err.kind(), error = %err, "reassignment failed");
                }
                Ok(Rotation::Assigned { task, record }) => {
                    debug!(
                        task_id = %task_id,
                        worker_id = %record.worker_id,
                        previous = ?task.previous_worker.map(|w| w.to_string()),
                        "task rotated"
                    );
                }
                Ok(Rotation::Parked { .. }) => debug!(task_id = %task_id, "task parked"),
                Ok(Rotation::Completed { .. }) => info!(task_id = %task_id, "task completed"),
            }
            report.record(task_id, &result);
        }

        let counts = report.counts();
        info!(
            assigned = counts.assigned,
            parked = counts.parked,
            completed = counts.completed,
            failed = counts.failed,
            "completed reassignment pass"
        );
        Ok(report)
    }

    /// Has `task` been served by everyone currently in the pool?
    ///
    /// Read-only; fetches the pool and applies the engine's completion rule.
    pub async fn has_been_assigned_to_all(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<bool, RotationError> {
        let pool = guard(cancel, self.workers.list_workers()).await?;
        Ok(self.engine.is_assigned_to_all(task, &pool))
    }

    async fn apply(&self, rotation: &Rotation, cancel: &CancellationToken) -> Result<(), RotationError> {
        if let Some(record) = rotation.record() {
            guard(cancel, self.history.append(record)).await?;
        }
        guard(cancel, self.tasks.save_task(rotation.task())).await
    }
}
