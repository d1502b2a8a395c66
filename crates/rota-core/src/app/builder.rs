//! ServiceBuilder - AssignmentService の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - 3 つのストア（worker pool / task / history）はすべて必須
//! - build() 時に不足していれば BuildError を返す
//! - chooser / clock / id generator は省略すると本番用の実装になる

use std::sync::Arc;

use crate::config::RotaConfig;
use crate::domain::RotationPolicy;
use crate::engine::RotationEngine;
use crate::ports::{
    AssignmentHistoryStore, Chooser, Clock, IdGenerator, SystemClock, TaskStore, UlidGenerator,
    UniformChooser, WorkerPoolSource,
};

use super::service::AssignmentService;

/// ServiceBuilder は AssignmentService を構築
///
/// # 使用例
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// let service = ServiceBuilder::new()
///     .worker_pool(store.clone())
///     .task_store(store.clone())
///     .history_store(store)
///     .build()?;
/// ```
#[derive(Default)]
pub struct ServiceBuilder {
    policy: RotationPolicy,
    workers: Option<Arc<dyn WorkerPoolSource>>,
    tasks: Option<Arc<dyn TaskStore>>,
    history: Option<Arc<dyn AssignmentHistoryStore>>,
    chooser: Option<Arc<dyn Chooser>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

/// BuildError は構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing port: {0}. Every store port must be provided before build().")]
    MissingPort(&'static str),
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy and chooser seed taken from the configuration.
    pub fn from_config(config: &RotaConfig) -> Self {
        let builder = Self::new().policy(config.policy);
        match config.seed {
            Some(seed) => builder.chooser(Arc::new(UniformChooser::seeded(seed))),
            None => builder,
        }
    }

    pub fn policy(mut self, policy: RotationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn worker_pool(mut self, workers: Arc<dyn WorkerPoolSource>) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn task_store(mut self, tasks: Arc<dyn TaskStore>) -> Self {
        self.tasks = Some(tasks);
        self
    }

    pub fn history_store(mut self, history: Arc<dyn AssignmentHistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn chooser(mut self, chooser: Arc<dyn Chooser>) -> Self {
        self.chooser = Some(chooser);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn build(self) -> Result<AssignmentService, BuildError> {
        let workers = self.workers.ok_or(BuildError::MissingPort("worker_pool"))?;
        let tasks = self.tasks.ok_or(BuildError::MissingPort("task_store"))?;
        let history = self
            .history
            .ok_or(BuildError::MissingPort("history_store"))?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));
        let chooser = self
            .chooser
            .unwrap_or_else(|| Arc::new(UniformChooser::new()));

        let engine = RotationEngine::new(self.policy, chooser, clock, ids);
        Ok(AssignmentService::new(engine, workers, tasks, history))
    }
}
