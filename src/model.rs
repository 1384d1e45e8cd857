//! Wire-facing data model: the records every public operation returns.
//!
//! Shape and derive stack follow the teacher's wire structs (`FileEntry`,
//! `SpaceInfo`, `ScanConflict`): plain structs, `serde` with
//! `rename_all = "camelCase"`, no business logic beyond simple accessors.

use serde::{Deserialize, Serialize};

/// Unified health status, projected over three platforms' heterogeneous
/// error codes.
///
/// `Ready` is part of the wire vocabulary but this engine never constructs
/// it — see DESIGN.md's resolution of the macOS `ready`-vs-`healthy` open
/// question. It stays in the enum so a caller deserializing a record from
/// another implementation of this contract doesn't choke on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unavailable,
    Inaccessible,
    Disconnected,
    Timeout,
    NoMedia,
    Error,
    Unknown,
    Partial,
    Ready,
}

impl HealthStatus {
    /// Whether capacity/identity fields can be trusted for this status.
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Healthy | Self::Partial)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Healthy => "healthy",
            Self::Unavailable => "unavailable",
            Self::Inaccessible => "inaccessible",
            Self::Disconnected => "disconnected",
            Self::Timeout => "timeout",
            Self::NoMedia => "no_media",
            Self::Error => "error",
            Self::Unknown => "unknown",
            Self::Partial => "partial",
            Self::Ready => "ready",
        };
        f.write_str(s)
    }
}

/// A mounted filesystem as reported by the enumerator, before metadata
/// enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMountPoint {
    /// Absolute, canonical path; drive-letter root (`C:\`) on Windows.
    pub mount_point: String,
    /// Filesystem-type tag (`apfs`, `ntfs`, `ext4`, `smbfs`, ...), when known.
    pub fstype: Option<String>,
    pub status: HealthStatus,
    /// Advisory only — see spec's "silent conversion of system-volume
    /// heuristics" redesign note; never used to drop a mount on its own.
    pub is_system_volume: bool,
    pub error: Option<String>,
    /// Volume label, when a backend's enumeration pass (or an enrichment
    /// pass layered on top of it, e.g. Linux's GIO enrichment) can supply
    /// one without a full metadata probe.
    pub label: Option<String>,
}

impl VolumeMountPoint {
    pub fn new(mount_point: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            mount_point: mount_point.into(),
            fstype: None,
            status,
            is_system_volume: false,
            error: None,
            label: None,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

/// Full metadata for one mount point: identity + capacity, extending
/// `VolumeMountPoint`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMetadata {
    pub mount_point: String,
    pub fstype: Option<String>,
    pub status: HealthStatus,
    pub is_system_volume: bool,
    pub error: Option<String>,

    /// Device/source identifier (`/dev/sda1`, `\\server\share`, BSD name).
    pub mount_from: Option<String>,
    pub size: u64,
    pub used: u64,
    pub available: u64,
    pub label: Option<String>,
    pub uuid: Option<String>,
    pub remote: bool,
    pub uri: Option<String>,
}

impl VolumeMetadata {
    /// A record carrying only status/error, with all identity and capacity
    /// fields at their empty defaults — used whenever a backend has to bail
    /// before any capacity call succeeds (§4.5 "Common error semantics").
    pub fn empty(mount_point: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            mount_point: mount_point.into(),
            fstype: None,
            status,
            is_system_volume: false,
            error: None,
            mount_from: None,
            size: 0,
            used: 0,
            available: 0,
            label: None,
            uuid: None,
            remote: false,
            uri: None,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Invariant check used by tests and by `log::warn!` assertions at
    /// probe boundaries: size >= used and size >= available, with the
    /// small reserved-blocks slack spec.md §8 allows.
    pub fn capacity_is_consistent(&self, reserved_blocks_bound: u64) -> bool {
        if self.status != HealthStatus::Healthy {
            return true;
        }
        self.size >= self.used
            && self.size >= self.available
            && self.used.saturating_add(self.available) <= self.size.saturating_add(reserved_blocks_bound)
    }
}

/// Strategy used by `set_hidden` to flip a path's hidden state on POSIX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenStrategy {
    /// Rename to add/remove a leading dot on the basename.
    DotPrefix,
    /// Flip a platform attribute bit/flag (Windows `FILE_ATTRIBUTE_HIDDEN`,
    /// macOS `UF_HIDDEN`). Not supported on Linux.
    SystemFlag,
    /// Try `SystemFlag` first, fall back to `DotPrefix` if the filesystem
    /// rejects it.
    Both,
}

impl Default for HiddenStrategy {
    fn default() -> Self {
        Self::Both
    }
}

#[cfg(test)]
mod model_test {
    use super::*;

    #[test]
    fn health_status_round_trips_through_json() {
        for status in [
            HealthStatus::Healthy,
            HealthStatus::NoMedia,
            HealthStatus::Partial,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            let back: HealthStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(status, back);
        }
        assert_eq!(serde_json::to_string(&HealthStatus::NoMedia).unwrap(), "\"no_media\"");
    }

    #[test]
    fn capacity_consistency_skips_non_healthy() {
        let mut record = VolumeMetadata::empty("/mnt/x", HealthStatus::Error);
        record.size = 0;
        record.used = 999;
        assert!(record.capacity_is_consistent(0));
    }

    #[test]
    fn capacity_consistency_flags_impossible_healthy_record() {
        let mut record = VolumeMetadata::empty("/", HealthStatus::Healthy);
        record.size = 100;
        record.used = 80;
        record.available = 80;
        assert!(!record.capacity_is_consistent(0));

        record.available = 10;
        assert!(record.capacity_is_consistent(0));
    }

    #[test]
    fn hidden_strategy_defaults_to_both() {
        assert_eq!(HiddenStrategy::default(), HiddenStrategy::Both);
    }

    #[test]
    fn mount_point_builder_sets_error() {
        let mp = VolumeMountPoint::new("/mnt/nas", HealthStatus::Timeout).with_error("timed out");
        assert_eq!(mp.error.as_deref(), Some("timed out"));
    }

    #[test]
    fn mount_point_label_defaults_to_none_and_is_settable() {
        let mut mp = VolumeMountPoint::new("/mnt/nas", HealthStatus::Healthy);
        assert_eq!(mp.label, None);
        mp.label = Some("Archive".to_string());
        assert_eq!(mp.label.as_deref(), Some("Archive"));
    }
}
