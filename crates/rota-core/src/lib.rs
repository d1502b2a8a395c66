//! rota-core
//!
//! Rotating task assignment: every task is held by exactly one worker at a
//! time and rotates through the whole pool before it is completed.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, worker, task, assignment, policy, rotation, errors, events）
//! - **ports**: 抽象化レイヤー（WorkerPoolSource, TaskStore, AssignmentHistoryStore, Chooser, Clock, IdGenerator）
//! - **engine**: ローテーションの判定（純粋関数）
//! - **app**: アプリケーション層（AssignmentService, ReassignmentLoop, ServiceBuilder）
//! - **impls**: 実装（InMemoryStore など開発用）
//! - **config**: 環境変数からの設定

pub mod app;
pub mod config;
pub mod domain;
pub mod engine;
pub mod impls;
pub mod ports;

pub use self::engine::RotationEngine;
