//! Drive Health Checker (spec.md §4.7): submits a probe job to the worker
//! pool and awaits it with a bounded `tokio::time::timeout`, grounded on
//! `network::smb_connection`'s `tokio::time::timeout(..)` pattern around an
//! async connection attempt.

use std::time::Duration;

use crate::model::HealthStatus;
use crate::worker_pool::WorkerPool;

/// The raw outcome of opening a mount point, before classification.
pub enum ProbeOutcome {
    Success,
    OsError(Option<i32>),
}

/// Maps a directory-open outcome to the unified health status, via the
/// fixed table in spec.md §4.7.
pub fn classify(outcome: &ProbeOutcome) -> HealthStatus {
    match outcome {
        ProbeOutcome::Success => HealthStatus::Healthy,
        ProbeOutcome::OsError(code) => classify_os_error(*code),
    }
}

#[cfg(unix)]
fn classify_os_error(code: Option<i32>) -> HealthStatus {
    match code {
        Some(libc::ENOENT) | Some(libc::EACCES) | Some(libc::EPERM) => HealthStatus::Inaccessible,
        Some(libc::ENETUNREACH) | Some(libc::ENOTCONN) | Some(libc::EHOSTUNREACH) | Some(libc::ETIMEDOUT) => {
            HealthStatus::Disconnected
        }
        Some(libc::ENOMEDIUM) | Some(libc::ENXIO) => HealthStatus::NoMedia,
        _ => HealthStatus::Unknown,
    }
}

#[cfg(windows)]
fn classify_os_error(code: Option<i32>) -> HealthStatus {
    use windows::Win32::Foundation::{
        ERROR_ACCESS_DENIED, ERROR_BAD_NETPATH, ERROR_BAD_NET_NAME, ERROR_FILE_NOT_FOUND, ERROR_NOT_CONNECTED,
        ERROR_NOT_READY, ERROR_PATH_NOT_FOUND, ERROR_SHARING_VIOLATION,
    };
    let Some(code) = code else {
        return HealthStatus::Unknown;
    };
    let code = code as u32;
    if code == ERROR_FILE_NOT_FOUND.0
        || code == ERROR_PATH_NOT_FOUND.0
        || code == ERROR_ACCESS_DENIED.0
        || code == ERROR_SHARING_VIOLATION.0
    {
        HealthStatus::Inaccessible
    } else if code == ERROR_BAD_NET_NAME.0 || code == ERROR_NOT_CONNECTED.0 || code == ERROR_BAD_NETPATH.0 {
        HealthStatus::Disconnected
    } else if code == ERROR_NOT_READY.0 {
        HealthStatus::NoMedia
    } else {
        HealthStatus::Unknown
    }
}

/// Submits `probe` (a blocking closure that opens `mount_point` and returns
/// its outcome) to `pool`, and awaits the result with a bounded timeout.
///
/// On timeout, the `oneshot::Receiver` is simply dropped: the worker thread
/// keeps running and, if it later completes, nobody is listening — the
/// "orphaned-future semantics" spec.md calls for instead of cancellation.
pub async fn check_health<F>(pool: &WorkerPool, timeout: Duration, probe: F) -> HealthStatus
where
    F: FnOnce() -> ProbeOutcome + Send + 'static,
{
    let (tx, rx) = tokio::sync::oneshot::channel();

    let submitted = pool.submit(Box::new(move || {
        let outcome = probe();
        let _ = tx.send(outcome);
    }));

    if submitted.is_err() {
        return HealthStatus::Unknown;
    }

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(outcome)) => classify(&outcome),
        Ok(Err(_)) => HealthStatus::Unknown,
        Err(_) => HealthStatus::Timeout,
    }
}

#[cfg(test)]
mod health_test {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn classifies_not_found_as_inaccessible() {
        assert_eq!(classify(&ProbeOutcome::OsError(Some(libc::ENOENT))), HealthStatus::Inaccessible);
    }

    #[cfg(unix)]
    #[test]
    fn classifies_success_as_healthy() {
        assert_eq!(classify(&ProbeOutcome::Success), HealthStatus::Healthy);
    }

    #[cfg(unix)]
    #[test]
    fn classifies_unreachable_network_as_disconnected() {
        assert_eq!(
            classify(&ProbeOutcome::OsError(Some(libc::ENETUNREACH))),
            HealthStatus::Disconnected
        );
    }

    #[cfg(unix)]
    #[test]
    fn classifies_unknown_code_as_unknown() {
        assert_eq!(classify(&ProbeOutcome::OsError(Some(99999))), HealthStatus::Unknown);
    }

    #[tokio::test]
    async fn completed_probe_within_timeout_reports_healthy() {
        let pool = WorkerPool::new(2);
        let status = check_health(&pool, Duration::from_secs(1), || ProbeOutcome::Success).await;
        assert_eq!(status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn slow_probe_reports_timeout() {
        let pool = WorkerPool::new(2);
        let status = check_health(&pool, Duration::from_millis(50), || {
            std::thread::sleep(Duration::from_secs(2));
            ProbeOutcome::Success
        })
        .await;
        assert_eq!(status, HealthStatus::Timeout);
    }
}
