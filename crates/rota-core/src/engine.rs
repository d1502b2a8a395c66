//! RotationEngine - 割り当てとローテーションの判定
//!
//! エンジンは純粋な判定ロジックです。プールとタスクのスナップショットを受け取り、
//! 次の状態（`Rotation`）を返します。ストアには触れません。
//!
//! # 判定の流れ（Reassign）
//! 1. 履歴がプール全体を覆っていれば Completed
//! 2. 現担当・前担当を除いた eligible を求める
//! 3. eligible が空なら Parked（Waiting）
//! 4. そうでなければ eligible から 1 人選んで Assigned

use std::sync::Arc;

use crate::domain::{
    AssignmentRecord, Rotation, RotationError, RotationPolicy, Task, TaskId, TaskState, Worker,
};
use crate::ports::{Chooser, Clock, IdGenerator, SystemClock, UlidGenerator, UniformChooser, pick};

/// The rotation decision engine.
///
/// Stateless between calls apart from the injected chooser.
#[derive(Clone)]
pub struct RotationEngine {
    policy: RotationPolicy,
    chooser: Arc<dyn Chooser>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl RotationEngine {
    pub fn new(
        policy: RotationPolicy,
        chooser: Arc<dyn Chooser>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            policy,
            chooser,
            clock,
            ids,
        }
    }

    /// Production wiring: uniform chooser, system clock, ULID ids.
    pub fn with_policy(policy: RotationPolicy) -> Self {
        Self::new(
            policy,
            Arc::new(UniformChooser::new()),
            Arc::new(SystemClock),
            Arc::new(UlidGenerator::new(SystemClock)),
        )
    }

    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    /// First assignment of a freshly created task.
    ///
    /// Requires `Waiting` with an empty history. An empty pool leaves the
    /// task parked without a record.
    pub fn assign_initial(&self, task: &Task, pool: &[Worker]) -> Result<Rotation, RotationError> {
        self.check_snapshot(task)?;
        if task.state != TaskState::Waiting {
            return Err(RotationError::precondition(
                task.id,
                format!("initial assignment needs a waiting task, got {}", task.state),
            ));
        }
        if !task.history.is_empty() {
            return Err(RotationError::precondition(
                task.id,
                "initial assignment needs an empty history",
            ));
        }

        Ok(match pick(self.chooser.as_ref(), pool) {
            Some(worker) => self.assign(task, worker),
            None => Rotation::Parked {
                task: task.clone().parked(),
            },
        })
    }

    /// One rotation step for an active task.
    pub fn reassign(&self, task: &Task, pool: &[Worker]) -> Result<Rotation, RotationError> {
        self.check_active(task)?;

        if self.policy.is_complete(task, pool) {
            return Ok(Rotation::Completed {
                task: task.clone().completed(),
            });
        }

        let eligible = self.policy.eligible(task, pool);
        Ok(match pick(self.chooser.as_ref(), &eligible) {
            Some(worker) => self.assign(task, worker),
            None => Rotation::Parked {
                task: task.clone().parked(),
            },
        })
    }

    /// The "no eligible worker" branch on its own, used when the pool is empty.
    pub fn park(&self, task: &Task) -> Result<Rotation, RotationError> {
        self.check_active(task)?;
        Ok(Rotation::Parked {
            task: task.clone().parked(),
        })
    }

    /// Decisions for one whole pass.
    ///
    /// Every task is judged against the same pool snapshot, so the outcome
    /// for one task never depends on the order of the others.
    pub fn plan_pass(
        &self,
        pool: &[Worker],
        tasks: &[Task],
    ) -> Vec<(TaskId, Result<Rotation, RotationError>)> {
        tasks
            .iter()
            .map(|task| {
                let decision = if pool.is_empty() {
                    self.park(task)
                } else {
                    self.reassign(task, pool)
                };
                (task.id, decision)
            })
            .collect()
    }

    /// Has the task already been served by everyone in `pool`?
    ///
    /// Same rule as the completion check of [`RotationEngine::reassign`].
    pub fn is_assigned_to_all(&self, task: &Task, pool: &[Worker]) -> bool {
        self.policy.is_complete(task, pool)
    }

    fn assign(&self, task: &Task, worker: &Worker) -> Rotation {
        let record = AssignmentRecord::new(
            self.ids.generate_assignment_id(),
            task.id,
            worker.id,
            self.clock.now(),
        );
        Rotation::Assigned {
            task: task.clone().assigned(record.clone()),
            record,
        }
    }

    fn check_active(&self, task: &Task) -> Result<(), RotationError> {
        self.check_snapshot(task)?;
        if !task.state.is_active() {
            return Err(RotationError::precondition(
                task.id,
                "completed tasks are never rotated",
            ));
        }
        Ok(())
    }

    fn check_snapshot(&self, task: &Task) -> Result<(), RotationError> {
        task.check_invariants()
            .map_err(|reason| RotationError::precondition(task.id, reason))
    }
}
