//! Shared POSIX helpers used by both the macOS and Linux backends: the
//! dot-prefix hidden convention (generalized from the teacher's read-only
//! `name.starts_with('.')` display filter in
//! `file_system/operations.rs::get_total_count`/`find_file_index`) and
//! overflow-guarded capacity arithmetic from a `statvfs` result.

use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::path_validator;

/// True if `path`'s basename begins with `.` and is neither `.` nor `..`.
/// This is the sole hidden signal on Linux, and one of two signals on
/// macOS (the other being `UF_HIDDEN`).
pub fn is_dot_hidden(path: &str) -> bool {
    if path_validator::is_root(path) {
        return false;
    }
    match Path::new(path).file_name().and_then(|n| n.to_str()) {
        Some(name) => name.starts_with('.') && name != "." && name != "..",
        None => false,
    }
}

/// Renames `path`'s basename to add or remove a leading dot, returning the
/// new path. Rejects an attempt that would rename a filesystem root.
pub fn set_dot_prefix(path: &str, hidden: bool) -> EngineResult<String> {
    if path_validator::is_root(path) {
        return Err(EngineError::InvalidArgument {
            message: "cannot hide a filesystem root".to_string(),
        });
    }

    let p = Path::new(path);
    let parent = p.parent().ok_or_else(|| EngineError::InvalidArgument {
        message: "path has no parent directory".to_string(),
    })?;
    let name = p
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EngineError::InvalidArgument {
            message: "path has no final component".to_string(),
        })?;

    let currently_hidden = name.starts_with('.') && name != "." && name != "..";
    if currently_hidden == hidden {
        return Ok(path.to_string());
    }

    let new_name = if hidden {
        format!(".{name}")
    } else {
        name.trim_start_matches('.').to_string()
    };
    if new_name.is_empty() || new_name == "." || new_name == ".." {
        return Err(EngineError::InvalidArgument {
            message: "resulting name would be empty or a relative marker".to_string(),
        });
    }

    let new_path = parent.join(&new_name);
    std::fs::rename(p, &new_path)?;
    Ok(new_path.to_string_lossy().into_owned())
}

/// `(size, used, available)` in bytes, derived from block counts with
/// explicit 64-bit overflow guards (spec.md §4.5's "block_size ×
/// total_blocks must not overflow").
pub fn capacity_from_blocks(block_size: u64, total_blocks: u64, free_blocks: u64, avail_blocks: u64) -> EngineResult<(u64, u64, u64)> {
    let size = block_size.checked_mul(total_blocks).ok_or_else(|| EngineError::Overflow {
        detail: "block_size * total_blocks overflows u64".to_string(),
    })?;
    let available = block_size.checked_mul(avail_blocks).ok_or_else(|| EngineError::Overflow {
        detail: "block_size * available_blocks overflows u64".to_string(),
    })?;
    let free = block_size.checked_mul(free_blocks).ok_or_else(|| EngineError::Overflow {
        detail: "block_size * free_blocks overflows u64".to_string(),
    })?;
    let used = size.saturating_sub(free);
    Ok((size, used, available))
}

/// Known network filesystem type tags across macOS and Linux, used to set
/// `remote=true` without a DiskArbitration/blkid round trip.
pub fn is_known_network_fstype(fstype: &str) -> bool {
    matches!(
        fstype,
        "smbfs" | "nfs" | "nfs4" | "afpfs" | "webdav" | "cifs" | "fuse.sshfs" | "9p"
    )
}

#[cfg(test)]
mod posix_common_test {
    use super::*;

    #[test]
    fn dot_hidden_detects_leading_dot() {
        assert!(is_dot_hidden("/home/user/.config"));
        assert!(!is_dot_hidden("/home/user/config"));
        assert!(!is_dot_hidden("/"));
    }

    #[test]
    fn dot_hidden_excludes_dot_and_dotdot() {
        assert!(!is_dot_hidden("."));
        assert!(!is_dot_hidden(".."));
    }

    #[test]
    fn set_dot_prefix_hides_and_unhides() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("note.txt");
        std::fs::write(&original, b"hi").unwrap();

        let hidden_path = set_dot_prefix(original.to_str().unwrap(), true).unwrap();
        assert!(hidden_path.ends_with(".note.txt"));
        assert!(is_dot_hidden(&hidden_path));

        let restored_path = set_dot_prefix(&hidden_path, false).unwrap();
        assert!(restored_path.ends_with("note.txt"));
        assert!(!is_dot_hidden(&restored_path));
        assert_eq!(restored_path, original.to_string_lossy());
    }

    #[test]
    fn set_dot_prefix_is_noop_when_already_matching() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("note.txt");
        std::fs::write(&original, b"hi").unwrap();
        let path = original.to_str().unwrap();

        let result = set_dot_prefix(path, false).unwrap();
        assert_eq!(result, path);
        // no rename should have happened
        assert!(original.exists());
    }

    #[test]
    fn set_dot_prefix_rejects_root() {
        assert!(matches!(
            set_dot_prefix("/", true),
            Err(EngineError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn capacity_from_blocks_computes_used() {
        let (size, used, available) = capacity_from_blocks(4096, 1000, 400, 380).unwrap();
        assert_eq!(size, 4096 * 1000);
        assert_eq!(used, 4096 * 600);
        assert_eq!(available, 4096 * 380);
    }

    #[test]
    fn capacity_from_blocks_reports_overflow() {
        let result = capacity_from_blocks(u64::MAX, 2, 0, 0);
        assert!(matches!(result, Err(EngineError::Overflow { .. })));
    }

    #[test]
    fn network_fstype_table_matches_known_tags() {
        assert!(is_known_network_fstype("nfs"));
        assert!(is_known_network_fstype("smbfs"));
        assert!(!is_known_network_fstype("ext4"));
    }
}
