//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryStore**: WorkerPoolSource / TaskStore / AssignmentHistoryStore
//!
//! 本番用のストア（RDB など）はこのクレートの外で ports を実装します。

pub mod inmem_store;

pub use self::inmem_store::{InMemoryStore, StoreOp};
