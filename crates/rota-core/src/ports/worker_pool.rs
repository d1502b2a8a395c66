//! WorkerPoolSource port - ローテーション対象の worker 一覧
//!
//! 本体（ユーザーテーブルなど）は外部ストアが所有します。

use async_trait::async_trait;

use crate::domain::{StoreError, Worker};

/// WorkerPoolSource は現在のプールを返す
///
/// # 契約
/// - 重複なし、順序は意味を持たない
/// - 呼び出しは有限時間で返る（キャンセルは呼び出し側で行う）
#[async_trait]
pub trait WorkerPoolSource: Send + Sync {
    async fn list_workers(&self) -> Result<Vec<Worker>, StoreError>;
}
