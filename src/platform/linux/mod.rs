//! Linux backend. Primary mount enumeration is `/proc/mounts` parsing
//! (`mount_table`); capacity/identity comes from fd-based `statvfs` plus
//! `libblkid` tag lookups under the blkid cache guard; hidden-attribute
//! handling is the dot-prefix convention only, matching spec.md §4.6's
//! "for Linux, the dot-prefix rule is the only signal".

mod mount_table;

#[cfg(feature = "gio-enrichment")]
mod gio_enrichment;

use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::health::{self, ProbeOutcome};
use crate::model::{HealthStatus, HiddenStrategy, VolumeMetadata, VolumeMountPoint};
use crate::options::Options;
use crate::path_validator;
use crate::platform::posix_common;
use crate::raii::{BlkidCacheGuard, FdGuard};
use crate::worker_pool::WorkerPool;

pub async fn enumerate_mount_points(opts: &Options, pool: &'static WorkerPool) -> EngineResult<Vec<VolumeMountPoint>> {
    let override_paths = opts.linux_mount_table_paths.clone();
    let raw_mounts = pool
        .run_blocking(opts.timeout(), move || mount_table::read_mount_table(&override_paths))
        .await?;

    let mut records = Vec::with_capacity(raw_mounts.len());
    for raw in raw_mounts {
        if opts.should_exclude(&raw.mount_point, Some(&raw.fstype), false) {
            continue;
        }

        let mount_point_for_probe = raw.mount_point.clone();
        let status = health::check_health(pool, opts.timeout(), move || probe_mount(&mount_point_for_probe)).await;

        let mut record = VolumeMountPoint::new(raw.mount_point.clone(), status);
        record.fstype = Some(raw.fstype.clone());
        records.push(record);
    }

    #[cfg(feature = "gio-enrichment")]
    gio_enrichment::enrich_labels(&mut records);

    Ok(records)
}

pub async fn get_volume_metadata(mount_point: &str, opts: &Options, pool: &'static WorkerPool) -> EngineResult<VolumeMetadata> {
    let canonical = path_validator::validate(mount_point)?;

    let probe_path = canonical.clone();
    let status = health::check_health(pool, opts.timeout(), move || probe_mount(&probe_path)).await;
    if status != HealthStatus::Healthy {
        return Ok(VolumeMetadata::empty(canonical, status));
    }

    let override_paths = opts.linux_mount_table_paths.clone();
    let path_for_job = canonical.clone();
    pool.run_blocking(opts.timeout(), move || probe_metadata(&path_for_job, &override_paths))
        .await
}

fn probe_mount(mount_point: &str) -> ProbeOutcome {
    match FdGuard::open_dir(mount_point) {
        Ok(_guard) => ProbeOutcome::Success,
        Err(EngineError::PlatformError { code, .. }) => ProbeOutcome::OsError(Some(code as i32)),
        Err(EngineError::NotFound { .. }) => ProbeOutcome::OsError(Some(libc::ENOENT)),
        Err(EngineError::PermissionDenied { .. }) => ProbeOutcome::OsError(Some(libc::EACCES)),
        Err(_) => ProbeOutcome::OsError(None),
    }
}

fn probe_metadata(mount_point: &str, override_paths: &[String]) -> EngineResult<VolumeMetadata> {
    let guard = FdGuard::open_dir(mount_point)?;

    // SAFETY: `guard` owns a valid, open directory fd for the duration of
    // this fstatvfs call.
    let mut statvfs: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::fstatvfs(guard.as_raw_fd(), &mut statvfs) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        return Ok(VolumeMetadata::empty(mount_point, HealthStatus::Error)
            .with_error(format!("fstatvfs failed: {err}")));
    }

    let (size, used, available) = posix_common::capacity_from_blocks(
        statvfs.f_frsize as u64,
        statvfs.f_blocks as u64,
        statvfs.f_bfree as u64,
        statvfs.f_bavail as u64,
    )?;

    let mounts = mount_table::read_mount_table(override_paths).unwrap_or_default();
    let matching = mounts.iter().find(|m| m.mount_point == mount_point);
    let mount_from = matching.map(|m| m.mount_from.clone());
    let fstype = matching.map(|m| m.fstype.clone());
    let remote = fstype.as_deref().is_some_and(posix_common::is_known_network_fstype);

    let mut record = VolumeMetadata::empty(mount_point, HealthStatus::Healthy);
    record.fstype = fstype;
    record.mount_from = mount_from.clone();
    record.size = size;
    record.used = used;
    record.available = available;
    record.remote = remote;

    if !remote {
        if let Some(device) = mount_from.as_deref() {
            if let Some(cache) = BlkidCacheGuard::acquire() {
                record.uuid = cache.get_tag_value("UUID", device);
                record.label = cache.get_tag_value("LABEL", device);
            } else {
                record.status = HealthStatus::Partial;
            }
        }
    }

    Ok(record)
}

pub async fn is_hidden(path: &str, pool: &'static WorkerPool) -> EngineResult<bool> {
    let path = path.to_string();
    pool.run_blocking(Duration::from_secs(5), move || {
        let canonical = match path_validator::validate(&path) {
            Ok(canonical) => canonical,
            Err(EngineError::NotFound { .. }) => return Ok(false),
            Err(err) => return Err(err),
        };
        Ok(posix_common::is_dot_hidden(&canonical))
    })
    .await
}

pub async fn set_hidden(path: &str, hidden: bool, strategy: HiddenStrategy, pool: &'static WorkerPool) -> EngineResult<String> {
    let path = path.to_string();
    pool.run_blocking(Duration::from_secs(5), move || {
        let canonical = path_validator::validate(&path)?;
        match strategy {
            HiddenStrategy::DotPrefix | HiddenStrategy::Both => posix_common::set_dot_prefix(&canonical, hidden),
            HiddenStrategy::SystemFlag => Err(EngineError::NotSupported {
                operation: "system hidden flag on Linux".to_string(),
            }),
        }
    })
    .await
}
