//! Path canonicalization and injection rejection (spec.md §4.2).
//!
//! One shared entry point, `validate`, with OS-specific detail functions
//! behind `cfg(target_os = ..)` living in this same file — the shape the
//! teacher uses for macOS-only enrichment inside an otherwise common
//! function (`file_system/listing/reading.rs`'s directory listing).

use crate::error::{EngineError, EngineResult};

#[cfg(windows)]
const MAX_PATH_LEN: usize = 32_768;
#[cfg(not(windows))]
const MAX_PATH_LEN: usize = libc::PATH_MAX as usize;

#[cfg(windows)]
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Canonicalizes `raw` into a form safe to pass to subsequent syscalls, or
/// fails with `EngineError::InvalidPath`/`NotFound`/`PermissionDenied`.
///
/// Order of checks matches spec.md §4.2 exactly: emptiness and length first
/// (cheapest), then NUL bytes, then platform-specific structural rejection,
/// then live-filesystem canonicalization.
pub fn validate(raw: &str) -> EngineResult<String> {
    if raw.is_empty() {
        return Err(EngineError::InvalidPath {
            message: "path is empty".to_string(),
        });
    }
    if raw.len() > MAX_PATH_LEN {
        return Err(EngineError::InvalidPath {
            message: format!("path exceeds {MAX_PATH_LEN} bytes"),
        });
    }
    if raw.contains('\0') {
        return Err(EngineError::InvalidPath {
            message: "path contains a NUL byte".to_string(),
        });
    }

    #[cfg(windows)]
    {
        reject_windows_structural_issues(raw)?;
        canonicalize_windows(raw)
    }
    #[cfg(not(windows))]
    {
        canonicalize_posix(raw)
    }
}

#[cfg(windows)]
fn reject_windows_structural_issues(raw: &str) -> EngineResult<()> {
    if raw.starts_with(r"\\?\") || raw.starts_with(r"\\.\") {
        return Err(EngineError::InvalidPath {
            message: "device-namespace prefixes are not accepted as input".to_string(),
        });
    }

    for component in raw.split(['\\', '/']) {
        if component == ".." {
            return Err(EngineError::InvalidPath {
                message: "literal .. components are rejected".to_string(),
            });
        }
        let base = component.split('.').next().unwrap_or(component);
        if RESERVED_NAMES.iter().any(|name| name.eq_ignore_ascii_case(base)) {
            return Err(EngineError::InvalidPath {
                message: format!("{component:?} is a reserved device name"),
            });
        }
    }

    // A colon is only legal once, at offset 1, for a drive letter (`C:`).
    // Any other colon signals an alternate-data-stream reference.
    let chars: Vec<char> = raw.chars().collect();
    for (idx, ch) in chars.iter().enumerate() {
        if *ch == ':' && idx != 1 {
            return Err(EngineError::InvalidPath {
                message: "alternate-data-stream colons are rejected".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(windows)]
fn canonicalize_windows(raw: &str) -> EngineResult<String> {
    let path = std::path::Path::new(raw);
    let canonical = std::fs::canonicalize(path).map_err(map_canonicalize_io_error)?;
    Ok(canonical.to_string_lossy().into_owned())
}

/// POSIX canonicalization: resolve symlinks and `.`/`..` against the live
/// filesystem. If the path itself doesn't exist, canonicalize its parent
/// and reattach the final component, so a not-yet-created file under a
/// valid directory still validates.
#[cfg(not(windows))]
fn canonicalize_posix(raw: &str) -> EngineResult<String> {
    let path = std::path::Path::new(raw);
    match std::fs::canonicalize(path) {
        Ok(canonical) => Ok(canonical.to_string_lossy().into_owned()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let parent = path.parent().ok_or_else(|| EngineError::InvalidPath {
                message: "path has no parent to canonicalize".to_string(),
            })?;
            let file_name = path.file_name().ok_or_else(|| EngineError::InvalidPath {
                message: "path has no final component".to_string(),
            })?;
            let canonical_parent = std::fs::canonicalize(parent).map_err(map_canonicalize_io_error)?;
            Ok(canonical_parent.join(file_name).to_string_lossy().into_owned())
        }
        Err(err) => Err(map_canonicalize_io_error(err)),
    }
}

fn map_canonicalize_io_error(err: std::io::Error) -> EngineError {
    match err.kind() {
        std::io::ErrorKind::NotFound => EngineError::NotFound {
            path: err.to_string(),
        },
        std::io::ErrorKind::PermissionDenied => EngineError::PermissionDenied {
            path: err.to_string(),
        },
        _ => {
            #[cfg(unix)]
            if err.raw_os_error() == Some(libc::ELOOP) {
                return EngineError::InvalidPath {
                    message: "symlink loop".to_string(),
                };
            }
            EngineError::PlatformError {
                operation: "canonicalize".to_string(),
                code: err.raw_os_error().unwrap_or(-1) as i64,
                text: err.to_string(),
            }
        }
    }
}

/// True for a path that is a filesystem root: `/` on POSIX, a drive root
/// (`C:\`) on Windows. Used by the hidden-attribute layer to reject
/// `set_hidden` on a root, and by `is_hidden` to short-circuit to `false`.
pub fn is_root(path: &str) -> bool {
    #[cfg(windows)]
    {
        // `validate` canonicalizes through the `\\?\`-prefixed verbatim
        // form; strip it so a canonicalized root still matches the plain
        // 3-byte pattern below.
        let stripped = path.strip_prefix(r"\\?\").unwrap_or(path);
        let bytes = stripped.as_bytes();
        bytes.len() == 3 && bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/')
    }
    #[cfg(not(windows))]
    {
        path == "/"
    }
}

#[cfg(test)]
mod path_validator_test {
    use super::*;

    #[test]
    fn rejects_empty_path() {
        assert!(matches!(validate(""), Err(EngineError::InvalidPath { .. })));
    }

    #[test]
    fn rejects_nul_byte() {
        assert!(matches!(
            validate("/tmp/\0evil"),
            Err(EngineError::InvalidPath { .. })
        ));
    }

    #[test]
    fn rejects_overlong_path() {
        let long = "a".repeat(MAX_PATH_LEN + 1);
        assert!(matches!(validate(&long), Err(EngineError::InvalidPath { .. })));
    }

    #[cfg(not(windows))]
    #[test]
    fn canonicalizes_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(
            std::path::Path::new(&result),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[cfg(not(windows))]
    #[test]
    fn canonicalizes_nonexistent_leaf_under_existing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let candidate = dir.path().join("not-yet-created.txt");
        let result = validate(candidate.to_str().unwrap()).unwrap();
        assert!(result.ends_with("not-yet-created.txt"));
    }

    #[cfg(not(windows))]
    #[test]
    fn root_is_root() {
        assert!(is_root("/"));
        assert!(!is_root("/tmp"));
    }

    #[cfg(not(windows))]
    #[test]
    fn canonicalization_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let once = validate(dir.path().to_str().unwrap()).unwrap();
        let twice = validate(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[cfg(windows)]
    #[test]
    fn rejects_device_namespace_prefix() {
        assert!(matches!(
            validate(r"\\?\C:\Windows"),
            Err(EngineError::InvalidPath { .. })
        ));
    }

    #[cfg(windows)]
    #[test]
    fn rejects_reserved_device_name_component() {
        assert!(matches!(
            validate(r"C:\foo\CON\bar.txt"),
            Err(EngineError::InvalidPath { .. })
        ));
    }

    #[cfg(windows)]
    #[test]
    fn rejects_alternate_data_stream_colon() {
        assert!(matches!(
            validate(r"C:\foo\bar.txt:stream"),
            Err(EngineError::InvalidPath { .. })
        ));
    }

    #[cfg(windows)]
    #[test]
    fn rejects_dotdot_component() {
        assert!(matches!(
            validate(r"C:\foo\..\bar"),
            Err(EngineError::InvalidPath { .. })
        ));
    }

    #[cfg(windows)]
    #[test]
    fn drive_root_is_root() {
        assert!(is_root(r"C:\"));
        assert!(!is_root(r"C:\Windows"));
    }
}
