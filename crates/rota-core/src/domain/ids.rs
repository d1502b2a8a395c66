//! Domain identifiers (strongly-typed IDs).
//!
//! ULID ベースの ID を Phantom type で型ごとに区別します。
//! `WorkerId` と `TaskId` は同じ 128-bit 表現ですが、コンパイル時に混同できません。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"worker-", "task-", "assignment-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData なので実行時のサイズは Ulid と同じです。
#[repr(transparent)]
#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// ULID から Id を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

// derive だと `T: Clone` などの境界が付いてしまうため手で実装する
impl<T: IdMarker> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: IdMarker> Copy for Id<T> {}

impl<T: IdMarker> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ulid == other.ulid
    }
}

impl<T: IdMarker> Eq for Id<T> {}

impl<T: IdMarker> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ulid.hash(state);
    }
}

impl<T: IdMarker> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: IdMarker> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ulid.cmp(&other.ulid)
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Worker のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Worker {}

impl IdMarker for Worker {
    fn prefix() -> &'static str {
        "worker-"
    }
}

/// Task のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Assignment のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Assignment {}

impl IdMarker for Assignment {
    fn prefix() -> &'static str {
        "assignment-"
    }
}

/// Identifier of a Worker (a member of the rotation pool).
pub type WorkerId = Id<Worker>;

/// Identifier of a Task (the unit that rotates through the pool).
pub type TaskId = Id<Task>;

/// Identifier of an AssignmentRecord.
pub type AssignmentId = Id<Assignment>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let ulid1 = Ulid::new();
        let ulid2 = Ulid::new();

        let worker = WorkerId::from_ulid(ulid1);
        let task = TaskId::from_ulid(ulid2);

        assert_eq!(worker.as_ulid(), ulid1);
        assert_eq!(task.as_ulid(), ulid2);

        assert!(worker.to_string().starts_with("worker-"));
        assert!(task.to_string().starts_with("task-"));
        assert!(
            AssignmentId::from_ulid(Ulid::new())
                .to_string()
                .starts_with("assignment-")
        );

        // let _: WorkerId = task; // <- does not compile
    }

    #[test]
    fn ids_serialize_as_plain_ulid() {
        let ulid = Ulid::new();
        let worker_id = WorkerId::from_ulid(ulid);

        let serialized = serde_json::to_string(&worker_id).unwrap();
        assert_eq!(serialized, format!("\"{ulid}\""));

        let deserialized: WorkerId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(worker_id, deserialized);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<WorkerId>(), size_of::<Ulid>());
        assert_eq!(size_of::<TaskId>(), size_of::<Ulid>());
    }
}
