//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! ストア系の trait（WorkerPoolSource, TaskStore, AssignmentHistoryStore）は
//! 外部の永続化層への入口で、エンジンはこれらの実装を知りません。
//! Clock / IdGenerator / Chooser はテストで差し替えるための seam です。

pub mod assignment_history;
pub mod chooser;
pub mod clock;
pub mod id_generator;
pub mod task_store;
pub mod worker_pool;

pub use self::assignment_history::AssignmentHistoryStore;
pub use self::chooser::{Chooser, SequenceChooser, UniformChooser, pick};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::task_store::TaskStore;
pub use self::worker_pool::WorkerPoolSource;
