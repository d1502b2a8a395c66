//! Domain model (ids, workers, tasks, assignment history, policy, errors, events).

pub mod assignment;
pub mod errors;
pub mod events;
pub mod ids;
pub mod policy;
pub mod rotation;
pub mod state;
pub mod task;
pub mod worker;

pub use self::assignment::AssignmentRecord;
pub use self::errors::{ErrorKind, RotationError, StoreError};
pub use self::events::DomainEvent;
pub use self::ids::{AssignmentId, TaskId, WorkerId};
pub use self::policy::{CompletionRule, EligibilityRule, ParsePolicyError, RotationPolicy};
pub use self::rotation::Rotation;
pub use self::state::TaskState;
pub use self::task::Task;
pub use self::worker::Worker;
