//! Public API surface (spec.md §4.1, §6): four non-blocking operations that
//! delegate to the compiled-in platform backend. The dispatcher never
//! interprets OS errors itself — that's the backends' and the Drive Health
//! Checker's job.

use std::future::IntoFuture;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::model::{HiddenStrategy, VolumeMetadata, VolumeMountPoint};
use crate::options::Options;
use crate::worker_pool;

/// A thin handle around a background job's eventual result.
///
/// Matches spec.md §6's `future<T>` contract: `.await` resolves it with no
/// timeout of its own (for callers — e.g. the out-of-scope binding layer —
/// that want to supply their own bound), and `await_timeout` gives the
/// bounded `wait_for(timeout_ms)` spec.md §5 requires at this boundary.
pub struct PendingResult<T> {
    rx: tokio::sync::oneshot::Receiver<EngineResult<T>>,
}

impl<T> PendingResult<T> {
    fn new(rx: tokio::sync::oneshot::Receiver<EngineResult<T>>) -> Self {
        Self { rx }
    }

    /// Awaits the result with a bounded wait. On elapse, the receiver is
    /// dropped and the worker's eventual result (if any) is discarded —
    /// orphaned-future semantics, never cancellation.
    pub async fn await_timeout(self, timeout: Duration) -> EngineResult<T> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(EngineError::PlatformError {
                operation: "pending_result".to_string(),
                code: -1,
                text: "worker dropped its result sender".to_string(),
            }),
            Err(_) => Err(EngineError::Timeout {
                operation: "pending_result".to_string(),
            }),
        }
    }
}

impl<T> IntoFuture for PendingResult<T>
where
    T: Send + 'static,
{
    type Output = EngineResult<T>;
    type IntoFuture = std::pin::Pin<Box<dyn std::future::Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            match self.rx.await {
                Ok(result) => result,
                Err(_) => Err(EngineError::PlatformError {
                    operation: "pending_result".to_string(),
                    code: -1,
                    text: "worker dropped its result sender".to_string(),
                }),
            }
        })
    }
}

/// Spawns `fut` as a background task and wraps its outcome in a
/// [`PendingResult`]. The orchestration glue runs as a lightweight async
/// task; every actual blocking syscall it performs is routed through the
/// shared [`WorkerPool`] via [`WorkerPool::run_blocking`] or
/// [`crate::health::check_health`], which is the "single source of
/// background execution" spec.md §5 describes. Requires the caller to be
/// running inside a Tokio runtime, same as the teacher's async command
/// handlers.
fn submit<T, Fut>(fut: Fut) -> PendingResult<T>
where
    T: Send + 'static,
    Fut: std::future::Future<Output = EngineResult<T>> + Send + 'static,
{
    let (tx, rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let _ = tx.send(fut.await);
    });
    PendingResult::new(rx)
}

/// Enumerates every mount point visible to the compiled-in backend,
/// applying `opts`' exclusion rules.
pub fn enumerate_mount_points(opts: &Options) -> PendingResult<Vec<VolumeMountPoint>> {
    let opts = opts.clone();
    submit(async move { crate::platform::enumerate_mount_points(&opts, worker_pool::shared()).await })
}

/// Fills identity and capacity metadata for one mount point.
pub fn get_volume_metadata(mount_point: &str, opts: &Options) -> PendingResult<VolumeMetadata> {
    let mount_point = mount_point.to_string();
    let opts = opts.clone();
    submit(async move { crate::platform::get_volume_metadata(&mount_point, &opts, worker_pool::shared()).await })
}

/// Reports whether `path` is currently hidden.
pub fn is_hidden(path: &str) -> PendingResult<bool> {
    let path = path.to_string();
    submit(async move { crate::platform::is_hidden(&path, worker_pool::shared()).await })
}

/// Sets `path`'s hidden state, returning the effective path after the
/// operation (may differ from `path` on POSIX dot-prefix strategies).
pub fn set_hidden(path: &str, hidden: bool, strategy: HiddenStrategy) -> PendingResult<String> {
    let path = path.to_string();
    submit(async move { crate::platform::set_hidden(&path, hidden, strategy, worker_pool::shared()).await })
}

#[cfg(test)]
mod dispatcher_test {
    use super::*;

    #[tokio::test]
    async fn is_hidden_false_for_nonexistent_path() {
        let result = is_hidden("/definitely/not/a/real/path/hopefully").await_timeout(Duration::from_secs(2)).await;
        assert_eq!(result.unwrap(), false);
    }

    #[tokio::test]
    async fn enumerate_mount_points_completes_within_timeout() {
        let opts = Options::default();
        let result = enumerate_mount_points(&opts).await_timeout(Duration::from_secs(5)).await;
        assert!(result.is_ok());
    }
}
