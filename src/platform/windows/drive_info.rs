//! Logical-drive enumeration and drive-type classification, grounded on
//! `ntfs-watcher`'s `GetLogicalDrives` bitmask walk (`discover_volumes`),
//! generalized from "NTFS only" to every drive type spec.md §4.4.1 tables.

use windows::Win32::Storage::FileSystem::{
    GetDriveTypeW, GetLogicalDrives, DRIVE_CDROM, DRIVE_FIXED, DRIVE_NO_ROOT_DIR, DRIVE_RAMDISK, DRIVE_REMOTE,
    DRIVE_REMOVABLE, DRIVE_UNKNOWN,
};

use crate::platform::windows::wide::to_wide_null;

/// The classification spec.md §4.4.1's table keys off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveType {
    Fixed,
    Removable,
    Remote,
    CdRom,
    RamDisk,
    Unknown,
    NoRootDir,
}

impl DriveType {
    /// Whether this drive type gets a health probe at all. `NoRootDir` is
    /// skipped entirely and `Unknown` is reported as-is without probing,
    /// per the table.
    pub fn is_probed(self) -> bool {
        !matches!(self, Self::NoRootDir | Self::Unknown)
    }
}

/// Every lettered root (`A:\` .. `Z:\`) currently present, from the
/// `GetLogicalDrives` bitmask.
pub fn logical_drive_roots() -> Vec<String> {
    // SAFETY: no arguments, returns a plain bitmask.
    let mask = unsafe { GetLogicalDrives() };
    (0..26)
        .filter(|i| mask & (1 << i) != 0)
        .map(|i| format!("{}:\\", (b'A' + i as u8) as char))
        .collect()
}

/// Classifies `drive_root` (e.g. `"C:\\"`) via `GetDriveTypeW`.
pub fn classify(drive_root: &str) -> DriveType {
    let wide = to_wide_null(drive_root);
    // SAFETY: `wide` is a NUL-terminated wide string alive for the call.
    let raw = unsafe { GetDriveTypeW(windows::core::PCWSTR(wide.as_ptr())) };
    match raw {
        DRIVE_FIXED => DriveType::Fixed,
        DRIVE_REMOVABLE => DriveType::Removable,
        DRIVE_REMOTE => DriveType::Remote,
        DRIVE_CDROM => DriveType::CdRom,
        DRIVE_RAMDISK => DriveType::RamDisk,
        DRIVE_NO_ROOT_DIR => DriveType::NoRootDir,
        DRIVE_UNKNOWN => DriveType::Unknown,
        _ => DriveType::Unknown,
    }
}

#[cfg(test)]
mod drive_info_test {
    use super::*;

    #[test]
    fn probed_flags_match_table() {
        assert!(DriveType::Fixed.is_probed());
        assert!(DriveType::Removable.is_probed());
        assert!(DriveType::Remote.is_probed());
        assert!(DriveType::CdRom.is_probed());
        assert!(DriveType::RamDisk.is_probed());
        assert!(!DriveType::Unknown.is_probed());
        assert!(!DriveType::NoRootDir.is_probed());
    }
}
