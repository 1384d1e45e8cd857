//! Call-boundary configuration, modeled on `McpConfig::from_env`'s tolerant
//! construction: a typed value with sane defaults, built once, passed by
//! reference into every worker job.

use std::collections::HashSet;

use globset::{Glob, GlobSet, GlobSetBuilder};

const DEFAULT_TIMEOUT_MS: u64 = 7000;

/// Immutable options shared by every dispatcher operation.
///
/// Built via [`Options::from_partial`], never mutated after construction —
/// the same "configuration value, not configuration object" shape the
/// teacher uses for `McpConfig`.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout_ms: u64,
    pub include_system_volumes: bool,
    pub excluded_file_system_types: HashSet<String>,
    excluded_mount_point_globs: GlobSet,
    raw_globs: Vec<String>,
    pub linux_mount_table_paths: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self::from_partial(PartialOptions::default())
    }
}

/// The caller-facing shape before tolerant validation. Every field is
/// optional; unknown keys upstream of this struct (e.g. in a deserialized
/// JSON blob) are simply never read, matching spec.md §4.1's "unknown keys
/// are ignored".
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialOptions {
    pub timeout_ms: Option<u64>,
    pub include_system_volumes: Option<bool>,
    pub excluded_file_system_types: Option<Vec<String>>,
    pub excluded_mount_point_globs: Option<Vec<String>>,
    pub linux_mount_table_paths: Option<Vec<String>>,
}

impl Options {
    /// Builds an `Options` value from a partial, tolerant of malformed
    /// fields: anything outside its valid domain is logged at `warn` and
    /// replaced with the documented default, never rejected.
    pub fn from_partial(partial: PartialOptions) -> Self {
        let timeout_ms = match partial.timeout_ms {
            Some(0) => {
                log::warn!("timeout_ms must be >= 1, falling back to default {DEFAULT_TIMEOUT_MS}");
                DEFAULT_TIMEOUT_MS
            }
            Some(ms) => ms,
            None => DEFAULT_TIMEOUT_MS,
        };

        let raw_globs = partial.excluded_mount_point_globs.unwrap_or_default();
        let mut builder = GlobSetBuilder::new();
        let mut accepted_globs = Vec::with_capacity(raw_globs.len());
        for pattern in &raw_globs {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                    accepted_globs.push(pattern.clone());
                }
                Err(err) => {
                    log::warn!("ignoring malformed excluded_mount_point_globs entry {pattern:?}: {err}");
                }
            }
        }
        let excluded_mount_point_globs = builder.build().unwrap_or_else(|err| {
            log::warn!("failed to build glob set, excluding nothing: {err}");
            GlobSetBuilder::new().build().expect("empty glob set always builds")
        });

        Self {
            timeout_ms,
            include_system_volumes: partial.include_system_volumes.unwrap_or(false),
            excluded_file_system_types: partial
                .excluded_file_system_types
                .unwrap_or_default()
                .into_iter()
                .collect(),
            excluded_mount_point_globs,
            raw_globs: accepted_globs,
            linux_mount_table_paths: partial.linux_mount_table_paths.unwrap_or_default(),
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    pub fn is_fstype_excluded(&self, fstype: Option<&str>) -> bool {
        fstype.is_some_and(|f| self.excluded_file_system_types.contains(f))
    }

    pub fn is_mount_point_excluded(&self, mount_point: &str) -> bool {
        self.excluded_mount_point_globs.is_match(mount_point)
    }

    /// Whether a mount should be dropped from an enumeration, applying both
    /// the glob/fstype exclusions and the system-volume heuristic. Per the
    /// "silent conversion of system-volume heuristics" redesign note,
    /// `is_system_volume` alone never drops a mount; only the combination
    /// with `include_system_volumes == false` does.
    pub fn should_exclude(&self, mount_point: &str, fstype: Option<&str>, is_system_volume: bool) -> bool {
        if self.is_mount_point_excluded(mount_point) {
            return true;
        }
        if self.is_fstype_excluded(fstype) {
            return true;
        }
        if is_system_volume && !self.include_system_volumes {
            return true;
        }
        false
    }
}

impl std::fmt::Display for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Options {{ timeout_ms: {}, include_system_volumes: {}, excluded_file_system_types: {:?}, excluded_mount_point_globs: {:?}, linux_mount_table_paths: {:?} }}",
            self.timeout_ms,
            self.include_system_volumes,
            self.excluded_file_system_types,
            self.raw_globs,
            self.linux_mount_table_paths,
        )
    }
}

#[cfg(test)]
mod options_test {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let opts = Options::default();
        assert_eq!(opts.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(!opts.include_system_volumes);
        assert!(opts.excluded_file_system_types.is_empty());
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let opts = Options::from_partial(PartialOptions {
            timeout_ms: Some(0),
            ..Default::default()
        });
        assert_eq!(opts.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn malformed_glob_is_dropped_not_rejected() {
        let opts = Options::from_partial(PartialOptions {
            excluded_mount_point_globs: Some(vec!["/mnt/*".to_string(), "[".to_string()]),
            ..Default::default()
        });
        assert!(opts.is_mount_point_excluded("/mnt/nas"));
        assert!(!opts.is_mount_point_excluded("/home"));
    }

    #[test]
    fn excluded_fstype_applies() {
        let opts = Options::from_partial(PartialOptions {
            excluded_file_system_types: Some(vec!["proc".to_string(), "sysfs".to_string()]),
            ..Default::default()
        });
        assert!(opts.is_fstype_excluded(Some("proc")));
        assert!(!opts.is_fstype_excluded(Some("ext4")));
        assert!(!opts.is_fstype_excluded(None));
    }

    #[test]
    fn system_volume_only_excluded_without_opt_in() {
        let opts = Options::default();
        assert!(opts.should_exclude("/System", None, true));

        let opts_in = Options::from_partial(PartialOptions {
            include_system_volumes: Some(true),
            ..Default::default()
        });
        assert!(!opts_in.should_exclude("/System", None, true));
    }
}
