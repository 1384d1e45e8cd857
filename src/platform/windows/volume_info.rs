//! Volume-information, free-space, and UNC-resolution queries, grounded on
//! `ntfs-watcher`'s `GetVolumeInformationW`/`GetVolumeNameForVolumeMountPointW`
//! call shapes (`discover_volumes`), extended with the disk-free-space and
//! UNC-resolution probes spec.md §4.5.1 also requires.

use windows::Win32::Foundation::{ERROR_MORE_DATA, HLOCAL, NO_ERROR};
use windows::Win32::NetworkManagement_WNet::{WNetGetUniversalNameW, UNIVERSAL_NAME_INFOW, UNIVERSAL_NAME_INFO_LEVEL};
use windows::Win32::Storage::FileSystem::{
    FindFirstVolumeW, FindNextVolumeW, GetDiskFreeSpaceExW, GetVolumeInformationW, GetVolumeNameForVolumeMountPointW,
};
use windows::Win32::System::Diagnostics::Debug::{
    FormatMessageW, FORMAT_MESSAGE_ALLOCATE_BUFFER, FORMAT_MESSAGE_FROM_SYSTEM, FORMAT_MESSAGE_IGNORE_INSERTS,
};
use windows::Win32::System::SystemInformation::GetWindowsDirectoryW;
use windows::core::{PCWSTR, PWSTR};

use crate::error::{EngineError, EngineResult};
use crate::raii::{WinFindHandleGuard, WinHeapBuffer};

use super::wide::{from_wide_buf, to_wide_null};

/// Label, filesystem name, and serial number from `GetVolumeInformationW`.
pub struct VolumeInfo {
    pub label: Option<String>,
    pub fstype: Option<String>,
    pub serial: u32,
    pub supports_usn_journal: bool,
}

pub fn query_volume_information(drive_root: &str) -> EngineResult<VolumeInfo> {
    let wide_root = to_wide_null(drive_root);
    let mut label_buf = [0u16; 256];
    let mut fstype_buf = [0u16; 64];
    let mut serial = 0u32;
    let mut max_component = 0u32;
    let mut flags = 0u32;

    // SAFETY: every buffer is sized to the documented maximum and lives for
    // the duration of the call.
    let result = unsafe {
        GetVolumeInformationW(
            PCWSTR(wide_root.as_ptr()),
            Some(&mut label_buf),
            Some(&mut serial),
            Some(&mut max_component),
            Some(&mut flags),
            Some(&mut fstype_buf),
        )
    };
    result.map_err(|err| platform_error("GetVolumeInformationW", &err))?;

    const FILE_SUPPORTS_USN_JOURNAL: u32 = 0x0200_0000;

    let label = from_wide_buf(&label_buf);
    let fstype = from_wide_buf(&fstype_buf);
    Ok(VolumeInfo {
        label: if label.is_empty() { None } else { Some(label) },
        fstype: if fstype.is_empty() { None } else { Some(fstype) },
        serial,
        supports_usn_journal: flags & FILE_SUPPORTS_USN_JOURNAL != 0,
    })
}

/// The volume GUID path (`\\?\Volume{...}\`) for a drive root, if the mount
/// point resolves to one.
pub fn guid_path_for_mount_point(drive_root: &str) -> Option<String> {
    let wide_root = to_wide_null(drive_root);
    let mut guid_buf = [0u16; 64];
    // SAFETY: `guid_buf` is sized to the documented maximum GUID-path length.
    let result = unsafe { GetVolumeNameForVolumeMountPointW(PCWSTR(wide_root.as_ptr()), &mut guid_buf) };
    result.ok()?;
    Some(from_wide_buf(&guid_buf))
}

/// Falls back to scanning every volume on the machine via
/// `FindFirstVolumeW`/`FindNextVolumeW` and matching by serial number, for
/// mount points `GetVolumeNameForVolumeMountPointW` can't resolve directly
/// (e.g. a drive letter mapped to a volume mount point several hops deep).
pub fn find_volume_guid_by_serial(serial: u32) -> Option<String> {
    let mut name_buf = [0u16; 64];
    // SAFETY: `name_buf` is sized to the documented maximum GUID-path length.
    let handle = unsafe { FindFirstVolumeW(&mut name_buf) }.ok()?;
    // SAFETY: `handle` was just returned by `FindFirstVolumeW`.
    let guard = unsafe { WinFindHandleGuard::from_raw(handle) };

    loop {
        let guid = from_wide_buf(&name_buf);
        if let Ok(info) = query_volume_information(&guid) {
            if info.serial == serial {
                return Some(guid);
            }
        }
        // SAFETY: `guard` owns a live `FindFirstVolumeW` handle.
        if unsafe { FindNextVolumeW(guard.as_raw(), &mut name_buf) }.is_err() {
            return None;
        }
    }
}

/// Total/used/available bytes from `GetDiskFreeSpaceExW`.
pub fn query_disk_free_space(drive_root: &str) -> EngineResult<(u64, u64, u64)> {
    let wide_root = to_wide_null(drive_root);
    let mut free_to_caller = 0u64;
    let mut total = 0u64;
    let mut total_free = 0u64;

    // SAFETY: all three out-pointers are valid for the duration of the call.
    let result = unsafe {
        GetDiskFreeSpaceExW(
            PCWSTR(wide_root.as_ptr()),
            Some(&mut free_to_caller),
            Some(&mut total),
            Some(&mut total_free),
        )
    };
    result.map_err(|err| platform_error("GetDiskFreeSpaceExW", &err))?;

    let used = total.saturating_sub(total_free);
    Ok((total, used, free_to_caller))
}

/// Resolves the UNC path behind a mapped drive letter via
/// `WNetGetUniversalNameW`, retrying once with a larger buffer on
/// `ERROR_MORE_DATA` (the same "probe the required size, then fetch" shape
/// `GetVolumeInformationW`'s caller already uses for fixed buffers).
///
/// Returns the raw Win32 error code on failure so the caller can render it
/// with [`format_message`] instead of just recording a bare status.
pub fn resolve_unc_path(drive_root: &str) -> Result<String, u32> {
    let wide_root = to_wide_null(drive_root);
    let mut buffer = vec![0u8; 1024];
    let mut last_rc = 0u32;

    for _ in 0..2 {
        let mut size = buffer.len() as u32;
        // SAFETY: `buffer` is valid for `size` bytes for the duration of the call.
        let rc = unsafe {
            WNetGetUniversalNameW(
                PCWSTR(wide_root.as_ptr()),
                UNIVERSAL_NAME_INFO_LEVEL,
                buffer.as_mut_ptr().cast(),
                &mut size,
            )
        };
        if rc == NO_ERROR {
            // SAFETY: a successful call filled `buffer` with a
            // `UNIVERSAL_NAME_INFOW` followed by its string payload.
            let info = unsafe { &*(buffer.as_ptr() as *const UNIVERSAL_NAME_INFOW) };
            // SAFETY: `lpUniversalName` points into `buffer`, which outlives this read.
            return unsafe { info.lpUniversalName.to_string() }.map_err(|_| rc.0);
        }
        if rc == ERROR_MORE_DATA {
            buffer.resize(size as usize, 0);
            last_rc = rc.0;
            continue;
        }
        return Err(rc.0);
    }
    Err(last_rc)
}

/// Renders a raw Win32 error code as a human-readable message via
/// `FormatMessageW`'s allocate-buffer mode, releasing the allocation through
/// `WinHeapBuffer` (`LocalFree`, its paired deallocator).
pub fn format_message(code: u32) -> String {
    let mut buffer_ptr: *mut u16 = std::ptr::null_mut();
    // SAFETY: `FORMAT_MESSAGE_ALLOCATE_BUFFER` tells the API to allocate the
    // output buffer itself and write its address into `buffer_ptr`.
    let len = unsafe {
        FormatMessageW(
            FORMAT_MESSAGE_ALLOCATE_BUFFER | FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_IGNORE_INSERTS,
            None,
            code,
            0,
            PWSTR(&mut buffer_ptr as *mut _ as *mut u16),
            0,
            None,
        )
    };

    if len == 0 || buffer_ptr.is_null() {
        return format!("Windows error {code}");
    }

    // SAFETY: `buffer_ptr` was just allocated by `FormatMessageW` above and
    // not yet freed; the guard releases it via `LocalFree` when dropped.
    let guard = unsafe { WinHeapBuffer::from_raw(HLOCAL(buffer_ptr as *mut _)) };
    // SAFETY: `buffer_ptr` is valid for `len` UTF-16 code units, per the
    // documented return value, for as long as `guard` keeps it alive.
    let text = unsafe { String::from_utf16_lossy(std::slice::from_raw_parts(buffer_ptr, len as usize)) };
    drop(guard);
    text.trim_end().to_string()
}

/// The drive letter hosting the Windows directory, used as the primary
/// system-volume signal.
pub fn windows_directory_drive_letter() -> Option<char> {
    let mut buf = [0u16; 260];
    // SAFETY: `buf` is sized to `MAX_PATH`.
    let len = unsafe { GetWindowsDirectoryW(Some(&mut buf)) };
    if len == 0 || len as usize > buf.len() {
        return None;
    }
    from_wide_buf(&buf[..len as usize]).chars().next().map(|c| c.to_ascii_uppercase())
}

pub(crate) fn platform_error(operation: &str, err: &windows::core::Error) -> EngineError {
    EngineError::PlatformError {
        operation: operation.to_string(),
        code: win32_code(err) as i64,
        text: err.message(),
    }
}

/// Extracts the plain Win32 error code from a `windows::core::Error`'s HRESULT
/// (`0x8007xxxx`), the form `health::classify_os_error`'s table compares
/// against.
pub fn win32_code(err: &windows::core::Error) -> u32 {
    (err.code().0 as u32) & 0xFFFF
}

#[cfg(test)]
mod volume_info_test {
    use super::*;

    #[test]
    #[ignore = "requires a real filesystem; exercised in CI on Windows runners only"]
    fn queries_system_drive() {
        let letter = windows_directory_drive_letter().expect("windows directory resolves");
        let root = format!("{letter}:\\");
        let info = query_volume_information(&root).unwrap();
        assert!(info.fstype.is_some());
        let (total, used, available) = query_disk_free_space(&root).unwrap();
        assert!(total >= used + available || total == 0);
    }
}
