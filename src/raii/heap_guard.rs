//! Guard for strings allocated by a C library and owned by its allocator.
//! Never cross allocators: this type only ever calls `libc::free`, and only
//! exists to wrap pointers documented as `malloc`-family allocations (e.g.
//! `blkid_get_tag_value`'s return value).

use std::ffi::{c_char, CStr};

/// Owns a `*mut c_char` returned by a C API that expects the caller to
/// `free()` it. Not `Clone`; `Drop` calls `libc::free` exactly once.
pub struct CAllocatedString {
    ptr: *mut c_char,
}

impl CAllocatedString {
    /// # Safety
    /// `ptr` must either be null or a valid pointer returned by a function
    /// documented to allocate via the C library allocator (`malloc`,
    /// `strdup`, or equivalent), not yet freed.
    pub unsafe fn from_raw(ptr: *mut c_char) -> Self {
        Self { ptr }
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Copies the contents into an owned `String`, lossily. Returns `None`
    /// if the pointer is null.
    pub fn to_string_lossy(&self) -> Option<String> {
        if self.ptr.is_null() {
            return None;
        }
        // SAFETY: pointer validity is the constructor's invariant; it is not
        // freed until `Drop`, which runs after this borrow ends.
        let cstr = unsafe { CStr::from_ptr(self.ptr) };
        Some(cstr.to_string_lossy().into_owned())
    }
}

impl Drop for CAllocatedString {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            // SAFETY: `ptr` was allocated by the C library allocator per the
            // constructor's contract, and is dropped exactly once.
            unsafe { libc::free(self.ptr.cast()) };
            self.ptr = std::ptr::null_mut();
        }
    }
}

// Not Send/Sync by default is fine: these are short-lived, thread-local
// handles created and dropped within one probe call.

#[cfg(test)]
mod heap_guard_test {
    use super::*;

    #[test]
    fn null_pointer_is_null_and_has_no_string() {
        let guard = unsafe { CAllocatedString::from_raw(std::ptr::null_mut()) };
        assert!(guard.is_null());
        assert_eq!(guard.to_string_lossy(), None);
    }

    #[test]
    fn wraps_and_reads_a_strdup_allocation() {
        let c_str = std::ffi::CString::new("ext4-uuid-1234").unwrap();
        // SAFETY: strdup allocates with the C library allocator, matching
        // this guard's deallocator.
        let dup = unsafe { libc::strdup(c_str.as_ptr()) };
        let guard = unsafe { CAllocatedString::from_raw(dup) };
        assert_eq!(guard.to_string_lossy().as_deref(), Some("ext4-uuid-1234"));
    }
}
