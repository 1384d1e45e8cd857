//! Linux mount-table reading. Parses `/proc/mounts` (or the caller's
//! `linux_mount_table_paths` override list) with plain `std::fs::read_to_string`
//! — reading a `/proc` file has no shared mutable state to race on, which is
//! what spec.md §4.4.3 means by "thread-safe Unix-mounts enumerator" on
//! Linux: this *is* the reentrant read, no `getmntent()` global buffer
//! involved.

use crate::error::{EngineError, EngineResult};

/// One raw `/proc/mounts` line, before health probing or metadata fill-in.
#[derive(Debug, Clone)]
pub struct RawMount {
    pub mount_from: String,
    pub mount_point: String,
    pub fstype: String,
}

const DEFAULT_PATHS: &[&str] = &["/proc/mounts", "/etc/mtab"];

/// Reads the first readable path in `override_paths` (falling back to the
/// built-in default list when empty), and parses it into raw mount
/// records. `/proc/mounts` fields are whitespace-separated with octal
/// escapes (`\040` for space, etc.) for embedded special characters in the
/// first two fields.
pub fn read_mount_table(override_paths: &[String]) -> EngineResult<Vec<RawMount>> {
    let candidates: Vec<&str> = if override_paths.is_empty() {
        DEFAULT_PATHS.to_vec()
    } else {
        override_paths.iter().map(String::as_str).collect()
    };

    let mut last_err = None;
    for path in candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => return Ok(parse_mount_table(&contents)),
            Err(err) => last_err = Some(err),
        }
    }

    Err(last_err
        .map(EngineError::from)
        .unwrap_or(EngineError::NotFound {
            path: "no mount table source was readable".to_string(),
        }))
}

fn parse_mount_table(contents: &str) -> Vec<RawMount> {
    contents
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let mount_from = fields.next()?;
            let mount_point = fields.next()?;
            let fstype = fields.next()?;
            Some(RawMount {
                mount_from: unescape_octal(mount_from),
                mount_point: unescape_octal(mount_point),
                fstype: fstype.to_string(),
            })
        })
        .collect()
}

/// Reverses the `\NNN` octal escaping `/proc/mounts` applies to spaces,
/// tabs, newlines, and backslashes in path fields.
fn unescape_octal(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = String::with_capacity(field.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let octal = &field[i + 1..i + 4];
            if let Ok(value) = u8::from_str_radix(octal, 8) {
                out.push(value as char);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

#[cfg(test)]
mod mount_table_test {
    use super::*;

    #[test]
    fn parses_well_formed_lines() {
        let sample = "/dev/sda1 / ext4 rw,relatime 0 0\n\
                       proc /proc proc rw,nosuid 0 0\n\
                       tmpfs /tmp tmpfs rw 0 0\n";
        let parsed = parse_mount_table(sample);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].mount_point, "/");
        assert_eq!(parsed[0].fstype, "ext4");
        assert_eq!(parsed[1].mount_point, "/proc");
    }

    #[test]
    fn unescapes_octal_space_in_mount_point() {
        let sample = "/dev/sdb1 /mnt/my\\040drive ext4 rw 0 0\n";
        let parsed = parse_mount_table(sample);
        assert_eq!(parsed[0].mount_point, "/mnt/my drive");
    }

    #[test]
    fn ignores_malformed_lines() {
        let sample = "short line\ngood /mnt/good ext4 rw 0 0\n";
        let parsed = parse_mount_table(sample);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].mount_point, "/mnt/good");
    }
}
