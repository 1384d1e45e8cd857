//! macOS backend. Mount enumeration uses the reentrant `getmntinfo`
//! buffer with access probes batched to at most 4 concurrent, each bounded
//! by `timeout_ms` (spec.md §4.4.2); metadata adds fd-based `fstatfs` plus
//! DiskArbitration identity lookup under the process-wide mutex; hidden
//! state supports both the dot-prefix convention and the `UF_HIDDEN` BSD
//! flag via fd-based `fchflags`.

mod diskarbitration;
mod mount_info;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::{EngineError, EngineResult};
use crate::health::{self, ProbeOutcome};
use crate::model::{HealthStatus, HiddenStrategy, VolumeMetadata, VolumeMountPoint};
use crate::options::Options;
use crate::path_validator;
use crate::platform::posix_common;
use crate::raii::FdGuard;
use crate::worker_pool::WorkerPool;

const MAX_CONCURRENT_PROBES: usize = 4;

pub async fn enumerate_mount_points(opts: &Options, pool: &'static WorkerPool) -> EngineResult<Vec<VolumeMountPoint>> {
    let raw_mounts = pool.run_blocking(opts.timeout(), mount_info::read_mount_table).await?;

    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_PROBES));
    let mut tasks = Vec::with_capacity(raw_mounts.len());

    for raw in raw_mounts {
        if opts.should_exclude(&raw.mount_point, Some(&raw.fstype), false) {
            continue;
        }
        let semaphore = Arc::clone(&semaphore);
        let timeout = opts.timeout();
        let fstype = raw.fstype.clone();
        let mount_point = raw.mount_point.clone();

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let mount_point_for_probe = mount_point.clone();
            let status = health::check_health(pool, timeout, move || probe_mount(&mount_point_for_probe)).await;
            let mut record = VolumeMountPoint::new(mount_point, status);
            record.fstype = Some(fstype);
            record
        }));
    }

    let mut records = Vec::with_capacity(tasks.len());
    for task in tasks {
        if let Ok(record) = task.await {
            records.push(record);
        }
    }
    Ok(records)
}

pub async fn get_volume_metadata(mount_point: &str, opts: &Options, pool: &'static WorkerPool) -> EngineResult<VolumeMetadata> {
    let canonical = path_validator::validate(mount_point)?;

    let probe_path = canonical.clone();
    let status = health::check_health(pool, opts.timeout(), move || probe_mount(&probe_path)).await;
    if status != HealthStatus::Healthy {
        return Ok(VolumeMetadata::empty(canonical, status));
    }

    let path_for_job = canonical.clone();
    pool.run_blocking(opts.timeout(), move || probe_metadata(&path_for_job)).await
}

fn probe_mount(mount_point: &str) -> ProbeOutcome {
    match FdGuard::open_dir(mount_point) {
        Ok(_guard) => ProbeOutcome::Success,
        Err(EngineError::NotFound { .. }) => ProbeOutcome::OsError(Some(libc::ENOENT)),
        Err(EngineError::PermissionDenied { .. }) => ProbeOutcome::OsError(Some(libc::EACCES)),
        Err(EngineError::PlatformError { code, .. }) => ProbeOutcome::OsError(Some(code as i32)),
        Err(_) => ProbeOutcome::OsError(None),
    }
}

fn probe_metadata(mount_point: &str) -> EngineResult<VolumeMetadata> {
    let guard = FdGuard::open_dir(mount_point)?;

    // SAFETY: `guard` owns a valid, open directory fd for the duration of
    // this fstatfs call; using the fd rather than the path avoids the
    // TOCTOU window spec.md §4.5.2 calls out.
    let mut statfs: libc::statfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::fstatfs(guard.as_raw_fd(), &mut statfs) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        return Ok(VolumeMetadata::empty(mount_point, HealthStatus::Error)
            .with_error(format!("fstatfs failed: {err}")));
    }

    let fstype = c_array_to_string(&statfs.f_fstypename);
    let mount_from = c_array_to_string(&statfs.f_mntfromname);

    let (size, used, available) = posix_common::capacity_from_blocks(
        statfs.f_bsize as u64,
        statfs.f_blocks,
        statfs.f_bfree,
        statfs.f_bavail,
    )?;

    let mut record = VolumeMetadata::empty(mount_point, HealthStatus::Healthy);
    record.fstype = Some(fstype.clone());
    record.mount_from = Some(mount_from.clone());
    record.size = size;
    record.used = used;
    record.available = available;

    if posix_common::is_known_network_fstype(&fstype) {
        record.remote = true;
        return Ok(record);
    }

    match diskarbitration::describe_volume(&mount_from) {
        Some(description) => {
            record.label = description.label;
            record.uuid = description.uuid;
            record.remote = description.remote;
            record.uri = description.uri;
        }
        None => {
            record.status = HealthStatus::Partial;
        }
    }

    Ok(record)
}

fn c_array_to_string(bytes: &[i8]) -> String {
    let as_u8: Vec<u8> = bytes.iter().take_while(|b| **b != 0).map(|b| *b as u8).collect();
    String::from_utf8_lossy(&as_u8).into_owned()
}

pub async fn is_hidden(path: &str, pool: &'static WorkerPool) -> EngineResult<bool> {
    let path = path.to_string();
    pool.run_blocking(Duration::from_secs(5), move || {
        let canonical = match path_validator::validate(&path) {
            Ok(canonical) => canonical,
            Err(EngineError::NotFound { .. }) => return Ok(false),
            Err(err) => return Err(err),
        };
        if posix_common::is_dot_hidden(&canonical) {
            return Ok(true);
        }
        Ok(has_uf_hidden_flag(&canonical).unwrap_or(false))
    })
    .await
}

fn has_uf_hidden_flag(path: &str) -> EngineResult<bool> {
    let guard = FdGuard::open_dir_or_file(path)?;
    // SAFETY: `guard` owns a valid fd for the duration of this fstat call.
    let mut stat: libc::stat = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::fstat(guard.as_raw_fd(), &mut stat) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(stat.st_flags & libc::UF_HIDDEN as u32 != 0)
}

pub async fn set_hidden(path: &str, hidden: bool, strategy: HiddenStrategy, pool: &'static WorkerPool) -> EngineResult<String> {
    let path = path.to_string();
    pool.run_blocking(Duration::from_secs(5), move || {
        let canonical = path_validator::validate(&path)?;
        match strategy {
            HiddenStrategy::DotPrefix => posix_common::set_dot_prefix(&canonical, hidden),
            HiddenStrategy::SystemFlag => set_uf_hidden_flag(&canonical, hidden).map(|()| canonical),
            HiddenStrategy::Both => match set_uf_hidden_flag(&canonical, hidden) {
                Ok(()) => Ok(canonical),
                Err(_) => posix_common::set_dot_prefix(&canonical, hidden),
            },
        }
    })
    .await
}

fn set_uf_hidden_flag(path: &str, hidden: bool) -> EngineResult<()> {
    if path_validator::is_root(path) {
        return Err(EngineError::InvalidArgument {
            message: "cannot hide a filesystem root".to_string(),
        });
    }
    let guard = FdGuard::open_dir_or_file(path)?;

    // SAFETY: `guard` owns a valid fd for the duration of these calls;
    // fd-based fstat+fchflags avoids re-resolving `path` between the two.
    let mut stat: libc::stat = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::fstat(guard.as_raw_fd(), &mut stat) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    if (stat.st_flags & libc::UF_HIDDEN as u32 != 0) == hidden {
        return Ok(());
    }

    let new_flags = if hidden {
        stat.st_flags | libc::UF_HIDDEN as u32
    } else {
        stat.st_flags & !(libc::UF_HIDDEN as u32)
    };

    // SAFETY: same fd as above.
    let rc = unsafe { libc::fchflags(guard.as_raw_fd(), new_flags) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}
