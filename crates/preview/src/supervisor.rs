//! Isolation and timeout supervision for extraction workers.
//!
//! The worker runs in its own spawned task with a single-slot result channel
//! and a hard wall-clock budget. Overruns are aborted, which drops the
//! worker future, tears down the CDP connection, and kills the Chromium
//! child. A panic inside the task surfaces as a dropped sender, never as a
//! crash of the caller.

use std::future::Future;

use {
    tokio::{
        sync::oneshot,
        time::{Duration, timeout},
    },
    tracing::{debug, warn},
};

use crate::{
    error::ExtractError,
    types::{ExtractOptions, PreviewRequest, PreviewResult},
    worker,
};

/// Run one extraction in an isolated failure domain.
///
/// Returns exactly one [`PreviewResult`] within `budget` plus scheduling
/// slack, whatever the worker does.
pub async fn run_isolated(
    request: &PreviewRequest,
    options: ExtractOptions,
    budget: Duration,
) -> PreviewResult {
    let url = request.url.clone();
    supervise(async move { worker::extract(&url, &options).await }, budget).await
}

/// Supervise any extraction future: outcome, crash, or forced timeout.
pub async fn supervise<F>(work: F, budget: Duration) -> PreviewResult
where
    F: Future<Output = Result<String, ExtractError>> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let task = tokio::spawn(async move {
        let _ = tx.send(work.await);
    });

    match timeout(budget, rx).await {
        Ok(Ok(Ok(text))) => PreviewResult::Success { text },
        Ok(Ok(Err(error))) => {
            warn!(%error, "extraction failed");
            PreviewResult::Failed {
                reason: error.to_string(),
            }
        },
        // Sender dropped without a result: the worker task panicked.
        Ok(Err(_)) => {
            warn!("extraction worker crashed before reporting");
            PreviewResult::Failed {
                reason: "extraction worker crashed".to_string(),
            }
        },
        Err(_) => {
            debug!("extraction budget exhausted, aborting worker");
            task.abort();
            PreviewResult::TimedOut
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_passes_through() {
        let result = supervise(
            async { Ok("[ hello ]".to_string()) },
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(result, PreviewResult::Success {
            text: "[ hello ]".to_string()
        });
    }

    #[tokio::test]
    async fn worker_error_becomes_failed() {
        let result = supervise(
            async { Err(ExtractError::navigation("https://a.example", "boom")) },
            Duration::from_secs(1),
        )
        .await;
        match result {
            PreviewResult::Failed { reason } => assert!(reason.contains("boom")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn overrun_is_forcibly_timed_out() {
        let started = std::time::Instant::now();
        let result = supervise(
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok("never delivered".to_string())
            },
            Duration::from_millis(50),
        )
        .await;

        assert_eq!(result, PreviewResult::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    async fn exploding_worker() -> Result<String, ExtractError> {
        panic!("worker exploded");
    }

    #[tokio::test]
    async fn worker_panic_is_contained() {
        let result = supervise(exploding_worker(), Duration::from_secs(1)).await;
        match result {
            PreviewResult::Failed { reason } => assert!(reason.contains("crashed")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
