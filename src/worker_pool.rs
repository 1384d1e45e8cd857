//! Shared background execution (spec.md §4.8), modeled directly on the
//! teacher's `indexing::writer::IndexWriter`: a fixed set of
//! `std::thread::Builder`-spawned workers, a `std::sync::mpsc` job queue,
//! and a graceful, bounded, non-forcible shutdown.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::EngineError;

type Job = Box<dyn FnOnce() + Send + 'static>;

static SHARED: OnceLock<WorkerPool> = OnceLock::new();

/// The process-wide pool every dispatcher operation and platform backend
/// submits blocking work to. Lazily sized to host concurrency on first use.
pub fn shared() -> &'static WorkerPool {
    SHARED.get_or_init(|| WorkerPool::new(0))
}

/// A fixed-size pool of worker threads pulling from one shared FIFO queue.
///
/// Every public dispatcher operation submits its blocking platform work
/// here instead of running it on the caller's thread, exactly the way
/// `IndexWriter` offloads every write onto its single background thread.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawns `size` worker threads (default: `std::thread::available_parallelism()`
    /// when `size == 0`).
    pub fn new(size: usize) -> Self {
        let size = if size == 0 {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
        } else {
            size
        };

        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut handles = Vec::with_capacity(size);
        for idx in 0..size {
            let receiver = Arc::clone(&receiver);
            let handle = std::thread::Builder::new()
                .name(format!("fs-volumes-worker-{idx}"))
                .spawn(move || worker_loop(idx, &receiver))
                .expect("failed to spawn worker thread");
            handles.push(handle);
        }

        Self {
            sender: Some(sender),
            handles: Mutex::new(handles),
        }
    }

    /// Queues `job` for execution on a worker thread. Non-blocking: the
    /// `mpsc::Sender` never waits for a consumer.
    ///
    /// Returns `Err` only if the pool has already been shut down.
    pub fn submit(&self, job: Job) -> Result<(), EngineError> {
        match &self.sender {
            Some(sender) => sender.send(job).map_err(|_| EngineError::PlatformError {
                operation: "worker_pool_submit".to_string(),
                code: -1,
                text: "worker pool is shut down".to_string(),
            }),
            None => Err(EngineError::PlatformError {
                operation: "worker_pool_submit".to_string(),
                code: -1,
                text: "worker pool is shut down".to_string(),
            }),
        }
    }

    /// Runs a blocking `job` on a worker thread and awaits its result with a
    /// bounded `tokio::time::timeout`, grounded on
    /// `network::smb_connection`'s timeout-around-an-async-attempt pattern.
    /// On timeout the receiver is dropped; the worker keeps running and its
    /// eventual result, if any, is discarded (orphaned-future semantics —
    /// see [`crate::health::check_health`] for the same shape applied to
    /// health probes specifically).
    pub async fn run_blocking<T, F>(&self, timeout: Duration, job: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, EngineError> + Send + 'static,
    {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.submit(Box::new(move || {
            let _ = tx.send(job());
        }))?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(EngineError::PlatformError {
                operation: "run_blocking".to_string(),
                code: -1,
                text: "worker dropped its result sender".to_string(),
            }),
            Err(_) => Err(EngineError::Timeout {
                operation: "run_blocking".to_string(),
            }),
        }
    }

    /// Closes the job queue and joins every worker with a bounded wait.
    /// Workers that don't return within `deadline` are abandoned with a
    /// logged warning — never forcibly terminated, per spec.md §4.8's
    /// explicit prohibition.
    pub fn shutdown(&mut self, deadline: Duration) {
        // Dropping the sender makes every worker's blocking `recv()` return
        // `Err`, ending its loop.
        self.sender = None;

        let handles = {
            let mut guard = self.handles.lock().unwrap_or_else(|p| p.into_inner());
            std::mem::take(&mut *guard)
        };

        let (done_tx, done_rx) = mpsc::channel::<()>();
        let watchdog = std::thread::Builder::new()
            .name("fs-volumes-worker-pool-shutdown-watchdog".to_string())
            .spawn(move || {
                for handle in handles {
                    let name = handle.thread().name().unwrap_or("worker").to_string();
                    if handle.join().is_err() {
                        log::warn!("worker thread {name} panicked during shutdown");
                    }
                }
                let _ = done_tx.send(());
            });

        let watchdog = match watchdog {
            Ok(handle) => handle,
            Err(err) => {
                log::warn!("failed to spawn shutdown watchdog thread: {err}");
                return;
            }
        };

        if done_rx.recv_timeout(deadline).is_err() {
            log::warn!(
                "worker pool shutdown did not complete within {:?}; abandoning remaining workers",
                deadline
            );
            // Not joined: the watchdog thread and any still-running workers
            // are left to finish on their own. No forcible termination.
        }
        drop(watchdog);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.sender.is_some() {
            self.shutdown(Duration::from_secs(5));
        }
    }
}

fn worker_loop(idx: usize, receiver: &Arc<Mutex<Receiver<Job>>>) {
    loop {
        let job = {
            let guard = match receiver.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.recv()
        };
        match job {
            Ok(job) => job(),
            Err(_) => {
                log::debug!("worker {idx} exiting: job queue closed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod worker_pool_test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn submitted_jobs_all_run() {
        let pool = WorkerPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..20 {
            let counter = Arc::clone(&counter);
            pool.submit(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        }
        // Give the workers a moment to drain; this is a coarse but reliable
        // wait for a handful of near-instant closures.
        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn submit_after_shutdown_fails() {
        let mut pool = WorkerPool::new(1);
        pool.shutdown(Duration::from_secs(1));
        let result = pool.submit(Box::new(|| {}));
        assert!(result.is_err());
    }

    #[test]
    fn shutdown_is_idempotent_via_drop() {
        let mut pool = WorkerPool::new(1);
        pool.shutdown(Duration::from_secs(1));
        drop(pool);
    }

    #[tokio::test]
    async fn run_blocking_returns_job_result() {
        let pool = WorkerPool::new(2);
        let result = pool.run_blocking(Duration::from_secs(1), || Ok(42)).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn run_blocking_times_out_on_slow_job() {
        let pool = WorkerPool::new(2);
        let result = pool
            .run_blocking(Duration::from_millis(50), || {
                std::thread::sleep(Duration::from_secs(2));
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(EngineError::Timeout { .. })));
    }
}
