//! App - アプリケーション層
//!
//! ports とエンジンを組み合わせて、外部から呼ばれる操作を提供します。
//!
//! # 主要コンポーネント
//! - **ServiceBuilder**: 構築とワイヤリング
//! - **AssignmentService**: 初回割り当て・pass・完了判定クエリ
//! - **ReassignmentLoop**: 一定間隔で pass を回すループ
//! - **guard**: ストア呼び出しと CancellationToken の競合

pub mod builder;
pub mod cancel;
pub mod reassignment_loop;
pub mod service;
pub mod status;

pub use self::builder::{BuildError, ServiceBuilder};
pub use self::cancel::guard;
pub use self::reassignment_loop::{LoopState, PassOutcome, ReassignmentLoop};
pub use self::service::AssignmentService;
pub use self::status::{PassCounts, PassReport, TaskOutcome};
