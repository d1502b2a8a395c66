//! Events - ドメインイベント
//!
//! 外部（API 層など）から発火され、AssignmentService::handle が受け取ります。
//! 配送は at-most-once を前提とします。

use super::task::Task;

/// DomainEvent はローテーションの契機となるイベント
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// 新しいタスクが作成された（タスクごとに 1 回だけ）
    TaskCreated { task: Task },
}
