//! Linux blkid cache guard. `libblkid` has no safe Rust wrapper in the
//! retrieval pack, so the minimal `extern "C"` surface this engine needs is
//! declared here, mirroring the DiskArbitration approach taken for macOS.

use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::sync::Mutex;

use crate::raii::CAllocatedString;

#[repr(C)]
struct OpaqueCache {
    _private: [u8; 0],
}
pub type BlkidCache = *mut OpaqueCache;

#[link(name = "blkid")]
extern "C" {
    fn blkid_get_cache(cache: *mut BlkidCache, filename: *const c_char) -> c_int;
    fn blkid_put_cache(cache: BlkidCache);
    fn blkid_get_tag_value(cache: BlkidCache, tagname: *const c_char, devname: *const c_char) -> *mut c_char;
}

/// Process-wide mutex serializing every blkid cache acquisition, matching
/// spec.md §5's "one process-wide mutex around cache creation and tag
/// lookups".
static BLKID_MUTEX: Mutex<()> = Mutex::new(());

/// Owns a `blkid_cache` acquired under the process-wide mutex. `Drop`
/// releases it via `blkid_put_cache` while still holding that guarantee —
/// acquisition and release both happen with no other thread inside libblkid.
pub struct BlkidCacheGuard {
    cache: BlkidCache,
    _lock: std::sync::MutexGuard<'static, ()>,
}

impl BlkidCacheGuard {
    /// Acquires the default blkid cache (`/etc/blkid.tab` or the in-kernel
    /// probe fallback, as libblkid decides).
    pub fn acquire() -> Option<Self> {
        let lock = BLKID_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut cache: BlkidCache = std::ptr::null_mut();
        // SAFETY: `cache` is a valid out-pointer; `filename = null` asks
        // libblkid for its default cache file.
        let rc = unsafe { blkid_get_cache(&mut cache, std::ptr::null()) };
        if rc != 0 || cache.is_null() {
            return None;
        }
        Some(Self { cache, _lock: lock })
    }

    /// Looks up `tag` (e.g. `"UUID"`, `"LABEL"`) for `devname` (e.g.
    /// `/dev/sda1`). The returned string was allocated by libblkid's C
    /// allocator and is wrapped in `CAllocatedString` so it is released
    /// through the matching deallocator, never any other.
    pub fn get_tag_value(&self, tag: &str, devname: &str) -> Option<String> {
        let tag_c = CString::new(tag).ok()?;
        let dev_c = CString::new(devname).ok()?;
        // SAFETY: `self.cache` is valid for the guard's lifetime; both C
        // strings are valid for the duration of this call.
        let raw = unsafe { blkid_get_tag_value(self.cache, tag_c.as_ptr(), dev_c.as_ptr()) };
        // SAFETY: `blkid_get_tag_value` documents its return as a
        // malloc-family allocation the caller must free.
        let guard = unsafe { CAllocatedString::from_raw(raw) };
        guard.to_string_lossy()
    }
}

impl Drop for BlkidCacheGuard {
    fn drop(&mut self) {
        if !self.cache.is_null() {
            // SAFETY: still holding `_lock`; ownership of `self.cache` is
            // this guard's invariant.
            unsafe { blkid_put_cache(self.cache) };
        }
    }
}

unsafe impl Send for BlkidCacheGuard {}

#[cfg(test)]
mod blkid_guard_test {
    use super::*;

    #[test]
    fn acquire_does_not_panic() {
        // libblkid may be entirely absent from a minimal CI container; this
        // only asserts the call sequence doesn't panic either way.
        let _ = BlkidCacheGuard::acquire();
    }
}
