//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::{AssignmentId, TaskId, WorkerId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は分散環境でも衝突しない ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（エンジンは複数タスクから共有される）
pub trait IdGenerator: Send + Sync {
    fn generate_worker_id(&self) -> WorkerId;

    fn generate_task_id(&self) -> TaskId;

    fn generate_assignment_id(&self) -> AssignmentId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// timestamp 部分は Clock から取るため、FixedClock を使うと
/// 時刻部分だけが決定的になります。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_worker_id(&self) -> WorkerId {
        WorkerId::from(self.next_ulid())
    }

    fn generate_task_id(&self) -> TaskId {
        TaskId::from(self.next_ulid())
    }

    fn generate_assignment_id(&self) -> AssignmentId {
        AssignmentId::from(self.next_ulid())
    }
}
