//! Wraps the reentrant `getmntinfo(3)` mount-info enumerator: a single
//! call yields a buffer of `statfs` records owned by the kernel (no `free`
//! needed, unlike the DiskArbitration/blkid allocations elsewhere in this
//! backend).

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone)]
pub struct RawMount {
    pub mount_from: String,
    pub mount_point: String,
    pub fstype: String,
}

/// Calls `getmntinfo(MNT_NOWAIT)`, the thread-safe reentrant mount-table
/// read spec.md §4.4.2 names — it doesn't block on unreachable network
/// mounts the way `MNT_WAIT` would, which matters since this runs as part
/// of the enumeration's blocking step.
pub fn read_mount_table() -> EngineResult<Vec<RawMount>> {
    let mut buf: *mut libc::statfs = std::ptr::null_mut();
    // SAFETY: `getmntinfo` writes a kernel-owned buffer pointer into `buf`
    // and returns the record count; the buffer is valid until the next call
    // on this thread and must not be freed by the caller.
    let count = unsafe { libc::getmntinfo(&mut buf, libc::MNT_NOWAIT) };
    if count <= 0 || buf.is_null() {
        let err = std::io::Error::last_os_error();
        return Err(EngineError::PlatformError {
            operation: "getmntinfo".to_string(),
            code: err.raw_os_error().unwrap_or(-1) as i64,
            text: err.to_string(),
        });
    }

    let mut out = Vec::with_capacity(count as usize);
    for i in 0..count as isize {
        // SAFETY: `buf` points to `count` contiguous, kernel-initialized
        // `statfs` records; `i` stays within `[0, count)`.
        let record = unsafe { &*buf.offset(i) };
        out.push(RawMount {
            mount_from: c_array_to_string(&record.f_mntfromname),
            mount_point: c_array_to_string(&record.f_mntonname),
            fstype: c_array_to_string(&record.f_fstypename),
        });
    }
    Ok(out)
}

fn c_array_to_string(bytes: &[i8]) -> String {
    let as_u8: Vec<u8> = bytes.iter().take_while(|b| **b != 0).map(|b| *b as u8).collect();
    String::from_utf8_lossy(&as_u8).into_owned()
}
