//! Cancel - ストア呼び出しとキャンセルの競合
//!
//! キャンセル信号は `tokio_util::sync::CancellationToken` をそのまま使います。
//! ここにあるのは、ストア呼び出しを token と競合させる `guard` だけです。

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::domain::{RotationError, StoreError};

/// Race a store call against cancellation. Cancellation wins ties.
pub async fn guard<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, RotationError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RotationError::Cancelled),
        result = fut => result.map_err(RotationError::from),
    }
}
