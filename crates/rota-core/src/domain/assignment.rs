//! Assignment history: the immutable "worker W served task T at time t" facts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AssignmentId, TaskId, WorkerId};

/// A single assignment event.
///
/// Created only by the rotation engine. Stores append these and never
/// mutate or delete them; `Task` holds copies for the completion check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: AssignmentId,
    pub task_id: TaskId,
    pub worker_id: WorkerId,
    pub assigned_at: DateTime<Utc>,
}

impl AssignmentRecord {
    pub fn new(
        id: AssignmentId,
        task_id: TaskId,
        worker_id: WorkerId,
        assigned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_id,
            worker_id,
            assigned_at,
        }
    }
}
