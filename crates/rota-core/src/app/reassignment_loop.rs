//! ReassignmentLoop - 定期的なローテーション
//!
//! 一定間隔で `AssignmentService::process_pool` を呼び出します。
//!
//! # 状態遷移
//! Idle → Running → Idle → … → Stopped
//!
//! # 重複実行の防止
//! - 単一スロット（`Mutex<()>::try_lock`）を取れなかった pass は Skipped
//! - スロットと Running 状態は guard が保持し、pass の future が途中で drop されても解放される
//! - tick の取りこぼしは溜めずに捨てる（MissedTickBehavior::Skip）

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::service::AssignmentService;
use super::status::PassReport;
use crate::domain::RotationError;

/// Observable state of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Result of one attempt to run a pass.
#[derive(Debug)]
pub enum PassOutcome {
    Finished(PassReport),
    /// Another pass was still running, or the loop has stopped.
    Skipped,
    Failed(RotationError),
}

/// Drives [`AssignmentService::process_pool`] on a fixed interval.
pub struct ReassignmentLoop {
    service: Arc<AssignmentService>,
    interval: Duration,
    slot: Mutex<()>,
    state_tx: watch::Sender<LoopState>,
}

/// Holds the pass slot. Dropping it puts a `Running` loop back to `Idle`.
struct RunningPass<'a> {
    _slot: MutexGuard<'a, ()>,
    state_tx: &'a watch::Sender<LoopState>,
}

impl Drop for RunningPass<'_> {
    fn drop(&mut self) {
        self.state_tx.send_if_modified(|state| {
            if *state == LoopState::Running {
                *state = LoopState::Idle;
                true
            } else {
                false
            }
        });
    }
}

impl ReassignmentLoop {
    pub fn new(service: Arc<AssignmentService>, interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(LoopState::Idle);
        Self {
            service,
            interval,
            slot: Mutex::new(()),
            state_tx,
        }
    }

    pub fn state(&self) -> LoopState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoopState> {
        self.state_tx.subscribe()
    }

    fn begin_pass(&self) -> Option<RunningPass<'_>> {
        let slot = self.slot.try_lock().ok()?;
        if self.state() == LoopState::Stopped {
            return None;
        }
        self.state_tx.send_replace(LoopState::Running);
        Some(RunningPass {
            _slot: slot,
            state_tx: &self.state_tx,
        })
    }

    /// Run one pass unless another one holds the slot.
    pub async fn run_once(&self, cancel: &CancellationToken) -> PassOutcome {
        let Some(pass) = self.begin_pass() else {
            warn!(state = ?self.state(), "reassignment pass not started, skipping");
            return PassOutcome::Skipped;
        };

        let result = self.service.process_pool(cancel).await;
        drop(pass);

        match result {
            Ok(report) => PassOutcome::Finished(report),
            Err(RotationError::Cancelled) => {
                info!("reassignment pass cancelled");
                PassOutcome::Failed(RotationError::Cancelled)
            }
            Err(err) => {
                error!(kind = ?err.kind(), error = %err, "reassignment pass failed");
                PassOutcome::Failed(err)
            }
        }
    }

    /// Tick until `cancel` fires. The first pass runs immediately.
    ///
    /// An in-flight pass observes the same token and is abandoned at its next
    /// store call. No pass starts after cancellation.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(interval = ?self.interval, "reassignment loop started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.run_once(&cancel).await;
        }

        self.state_tx.send_replace(LoopState::Stopped);
        info!("reassignment loop stopped");
    }

    /// Spawn [`ReassignmentLoop::run`] on the tokio runtime.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    use crate::domain::{RotationPolicy, Task, TaskId, TaskState, Worker, WorkerId};
    use crate::engine::RotationEngine;
    use crate::impls::InMemoryStore;
    use crate::ports::{SequenceChooser, SystemClock, TaskStore, UlidGenerator};

    fn worker(n: u128) -> Worker {
        Worker::new(WorkerId::from_ulid(Ulid::from_parts(0, n)), format!("W{n}"))
    }

    fn service(store: &InMemoryStore) -> Arc<AssignmentService> {
        let engine = RotationEngine::new(
            RotationPolicy::default(),
            Arc::new(SequenceChooser::first()),
            Arc::new(SystemClock),
            Arc::new(UlidGenerator::new(SystemClock)),
        );
        let store = Arc::new(store.clone());
        Arc::new(AssignmentService::new(
            engine,
            store.clone(),
            store.clone(),
            store,
        ))
    }

    #[tokio::test]
    async fn overlapping_pass_is_skipped() {
        let store = InMemoryStore::with_workers([worker(1)]);
        store.set_latency(Some(Duration::from_millis(200))).await;
        let rotation = Arc::new(ReassignmentLoop::new(service(&store), Duration::from_secs(60)));
        let never = CancellationToken::new();

        let first = tokio::spawn({
            let rotation = rotation.clone();
            let never = never.clone();
            async move { rotation.run_once(&never).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rotation.state(), LoopState::Running);

        let second = rotation.run_once(&never).await;
        assert!(matches!(second, PassOutcome::Skipped));

        let first = first.await.unwrap();
        assert!(matches!(first, PassOutcome::Finished(_)));
        assert_eq!(rotation.state(), LoopState::Idle);
    }

    #[tokio::test]
    async fn loop_runs_passes_and_stops_on_cancel() {
        let store = InMemoryStore::with_workers([worker(1), worker(2), worker(3)]);
        let svc = service(&store);
        let task = Task::new(TaskId::from_ulid(Ulid::new()), "a");
        store.save_task(&task).await.unwrap();
        svc.assign_initial(&task, &CancellationToken::new())
            .await
            .unwrap();

        let rotation = Arc::new(ReassignmentLoop::new(svc, Duration::from_millis(20)));
        let mut states = rotation.subscribe();
        let token = CancellationToken::new();
        let join = rotation.clone().spawn(token.clone());

        let done = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if store.task(task.id).await.map(|t| t.state) == Some(TaskState::Completed) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(done.is_ok());

        token.cancel();
        join.await.unwrap();
        assert_eq!(rotation.state(), LoopState::Stopped);
        assert!(states.has_changed().unwrap());

        // no pass runs once stopped
        let ops = store.ops().await.len();
        assert!(matches!(
            rotation.run_once(&CancellationToken::new()).await,
            PassOutcome::Skipped
        ));
        assert_eq!(store.ops().await.len(), ops);
    }

    #[tokio::test]
    async fn cancel_abandons_in_flight_pass() {
        let store = InMemoryStore::with_workers([worker(1)]);
        store.set_latency(Some(Duration::from_secs(5))).await;
        let rotation = Arc::new(ReassignmentLoop::new(service(&store), Duration::from_secs(60)));
        let token = CancellationToken::new();
        let join = rotation.clone().spawn(token.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rotation.state(), LoopState::Running);
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), join)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rotation.state(), LoopState::Stopped);
    }

    #[tokio::test]
    async fn failed_pass_returns_to_idle() {
        let store = InMemoryStore::with_workers([worker(1)]);
        store.set_unavailable(true).await;
        let rotation = ReassignmentLoop::new(service(&store), Duration::from_secs(60));

        let outcome = rotation.run_once(&CancellationToken::new()).await;
        assert!(matches!(
            outcome,
            PassOutcome::Failed(RotationError::Persistence(_))
        ));
        assert_eq!(rotation.state(), LoopState::Idle);
    }

    #[tokio::test]
    async fn dropped_pass_releases_the_slot() {
        let store = InMemoryStore::with_workers([worker(1)]);
        store.set_latency(Some(Duration::from_millis(200))).await;
        let rotation = ReassignmentLoop::new(service(&store), Duration::from_secs(60));
        let never = CancellationToken::new();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), rotation.run_once(&never)).await;
        assert!(abandoned.is_err());
        assert_eq!(rotation.state(), LoopState::Idle);

        store.set_latency(None).await;
        assert!(matches!(
            rotation.run_once(&never).await,
            PassOutcome::Finished(_)
        ));
        assert_eq!(rotation.state(), LoopState::Idle);
    }
}
