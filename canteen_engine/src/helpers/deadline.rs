use std::{future::Future, time::Duration};

use log::warn;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} did not complete within {limit:?}")]
pub struct DeadlineExceeded {
    pub operation: String,
    pub limit: Duration,
}

/// Runs `fut` to completion, or gives up after `limit`.
///
/// Timeouts are not retried here. The caller decides what to do with them.
pub async fn with_deadline<T, E, F>(limit: Duration, operation: &str, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<DeadlineExceeded>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("⏱️ {operation} timed out after {limit:?}");
            Err(DeadlineExceeded { operation: operation.to_string(), limit }.into())
        },
    }
}
