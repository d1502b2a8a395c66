//! InMemoryStore - 開発用・テスト用のストア
//!
//! WorkerPoolSource / TaskStore / AssignmentHistoryStore の 3 つを 1 つで実装します。
//!
//! # 実装詳細
//! - タスクは履歴なしで保存し、読み出し時に履歴を join する
//! - `(task_id, worker_id)` の一意制約を持つ
//! - 障害注入（保存失敗・追記失敗・遅延・停止）をサポート

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{AssignmentRecord, StoreError, Task, TaskId, TaskState, Worker, WorkerId};
use crate::ports::{AssignmentHistoryStore, TaskStore, WorkerPoolSource};

/// One mutation observed by the store, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Append { task_id: TaskId, worker_id: WorkerId },
    Save { task_id: TaskId, state: TaskState },
}

#[derive(Default)]
struct StoreState {
    workers: Vec<Worker>,
    /// insertion order of tasks
    order: Vec<TaskId>,
    tasks: HashMap<TaskId, Task>,
    history: Vec<AssignmentRecord>,
    ops: Vec<StoreOp>,
}

impl StoreState {
    fn joined(&self, task: &Task) -> Task {
        let mut task = task.clone();
        task.history = self
            .history
            .iter()
            .filter(|r| r.task_id == task.id)
            .cloned()
            .collect();
        task
    }
}

#[derive(Default)]
struct Faults {
    failing_saves: HashSet<TaskId>,
    failing_appends: HashSet<TaskId>,
    unavailable: bool,
    latency: Option<Duration>,
}

/// In-memory implementation of every store port.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    faults: Arc<Mutex<Faults>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(workers: impl IntoIterator<Item = Worker>) -> Self {
        let state = StoreState {
            workers: workers.into_iter().collect(),
            ..StoreState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            faults: Arc::default(),
        }
    }

    /// Add a worker to the pool. Returns false when the id is already present.
    pub async fn add_worker(&self, worker: Worker) -> bool {
        let mut state = self.state.lock().await;
        if state.workers.iter().any(|w| w.id == worker.id) {
            return false;
        }
        state.workers.push(worker);
        true
    }

    pub async fn remove_worker(&self, worker_id: WorkerId) -> Option<Worker> {
        let mut state = self.state.lock().await;
        let index = state.workers.iter().position(|w| w.id == worker_id)?;
        Some(state.workers.remove(index))
    }

    /// A task with its history joined, completed or not.
    pub async fn task(&self, task_id: TaskId) -> Option<Task> {
        let state = self.state.lock().await;
        state.tasks.get(&task_id).map(|t| state.joined(t))
    }

    pub async fn all_tasks(&self) -> Vec<Task> {
        let state = self.state.lock().await;
        state
            .order
            .iter()
            .filter_map(|id| state.tasks.get(id))
            .map(|t| state.joined(t))
            .collect()
    }

    pub async fn history(&self) -> Vec<AssignmentRecord> {
        self.state.lock().await.history.clone()
    }

    pub async fn ops(&self) -> Vec<StoreOp> {
        self.state.lock().await.ops.clone()
    }

    pub async fn fail_saves_for(&self, task_id: TaskId) {
        self.faults.lock().await.failing_saves.insert(task_id);
    }

    pub async fn fail_appends_for(&self, task_id: TaskId) {
        self.faults.lock().await.failing_appends.insert(task_id);
    }

    pub async fn clear_faults(&self) {
        let mut faults = self.faults.lock().await;
        faults.failing_saves.clear();
        faults.failing_appends.clear();
        faults.unavailable = false;
    }

    pub async fn set_unavailable(&self, unavailable: bool) {
        self.faults.lock().await.unavailable = unavailable;
    }

    /// Delay every read by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.faults.lock().await.latency = latency;
    }

    async fn before_read(&self) -> Result<(), StoreError> {
        let (unavailable, latency) = {
            let faults = self.faults.lock().await;
            (faults.unavailable, faults.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if unavailable {
            return Err(StoreError::Unavailable("in-memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkerPoolSource for InMemoryStore {
    async fn list_workers(&self) -> Result<Vec<Worker>, StoreError> {
        self.before_read().await?;
        Ok(self.state.lock().await.workers.clone())
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn list_active_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.before_read().await?;
        let state = self.state.lock().await;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.tasks.get(id))
            .filter(|t| t.state.is_active())
            .map(|t| state.joined(t))
            .collect())
    }

    async fn find_task(&self, task_id: TaskId) -> Result<Option<Task>, StoreError> {
        self.before_read().await?;
        Ok(self.task(task_id).await)
    }

    async fn save_task(&self, task: &Task) -> Result<(), StoreError> {
        if self.faults.lock().await.failing_saves.contains(&task.id) {
            return Err(StoreError::Unavailable(format!("save of {} rejected", task.id)));
        }

        let mut state = self.state.lock().await;
        if state
            .tasks
            .values()
            .any(|t| t.id != task.id && t.title == task.title)
        {
            return Err(StoreError::DuplicateTitle(task.title.clone()));
        }

        let mut row = task.clone();
        row.history.clear();
        if state.tasks.insert(task.id, row).is_none() {
            state.order.push(task.id);
        }
        state.ops.push(StoreOp::Save {
            task_id: task.id,
            state: task.state,
        });
        Ok(())
    }
}

#[async_trait]
impl AssignmentHistoryStore for InMemoryStore {
    async fn append(&self, record: &AssignmentRecord) -> Result<(), StoreError> {
        if self
            .faults
            .lock()
            .await
            .failing_appends
            .contains(&record.task_id)
        {
            return Err(StoreError::Unavailable(format!(
                "append for {} rejected",
                record.task_id
            )));
        }

        let mut state = self.state.lock().await;
        if state
            .history
            .iter()
            .any(|r| r.task_id == record.task_id && r.worker_id == record.worker_id)
        {
            return Err(StoreError::DuplicateAssignment {
                task_id: record.task_id,
                worker_id: record.worker_id,
            });
        }
        state.history.push(record.clone());
        state.ops.push(StoreOp::Append {
            task_id: record.task_id,
            worker_id: record.worker_id,
        });
        Ok(())
    }
}
