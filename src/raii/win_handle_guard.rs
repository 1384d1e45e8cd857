//! Windows handle guards. Two distinct types for generic handles versus
//! `FindFirstVolumeW`-family enumeration handles, so the compiler — not
//! convention — prevents closing one with the other's API (spec.md §4.3:
//! "mismatching these is undefined behavior").

use windows::Win32::Foundation::{CloseHandle, HANDLE, HLOCAL};
use windows::Win32::Storage::FileSystem::FindVolumeClose;
use windows::Win32::System::Memory::LocalFree;

/// Owns a generic Win32 `HANDLE` (e.g. a volume opened with
/// `CreateFileW`/`FILE_FLAG_BACKUP_SEMANTICS`). `Drop` calls `CloseHandle`.
pub struct WinHandleGuard {
    handle: HANDLE,
}

impl WinHandleGuard {
    /// # Safety
    /// `handle` must be a valid handle obtained from an API documented to be
    /// closed via `CloseHandle`, not yet closed.
    pub unsafe fn from_raw(handle: HANDLE) -> Self {
        Self { handle }
    }

    pub fn as_raw(&self) -> HANDLE {
        self.handle
    }

    pub fn is_invalid(&self) -> bool {
        self.handle.is_invalid()
    }
}

impl Drop for WinHandleGuard {
    fn drop(&mut self) {
        if !self.handle.is_invalid() {
            // SAFETY: handle ownership is this guard's invariant; closed
            // exactly once, here.
            let _ = unsafe { CloseHandle(self.handle) };
        }
    }
}

/// Owns a `FindFirstVolumeW`/`FindNextVolumeW` enumeration handle. `Drop`
/// calls `FindVolumeClose`, never `CloseHandle`.
pub struct WinFindHandleGuard {
    handle: HANDLE,
}

impl WinFindHandleGuard {
    /// # Safety
    /// `handle` must come from `FindFirstVolumeW` and not yet be closed.
    pub unsafe fn from_raw(handle: HANDLE) -> Self {
        Self { handle }
    }

    pub fn as_raw(&self) -> HANDLE {
        self.handle
    }

    pub fn is_invalid(&self) -> bool {
        self.handle.is_invalid()
    }
}

impl Drop for WinFindHandleGuard {
    fn drop(&mut self) {
        if !self.handle.is_invalid() {
            // SAFETY: handle ownership is this guard's invariant.
            let _ = unsafe { FindVolumeClose(self.handle) };
        }
    }
}

/// Owns a buffer returned by `FormatMessageW`'s implicit-allocate mode
/// (`FORMAT_MESSAGE_ALLOCATE_BUFFER`). `Drop` calls `LocalFree` — the
/// paired deallocator for that allocation mode, never `free`/`CloseHandle`.
pub struct WinHeapBuffer {
    ptr: HLOCAL,
}

impl WinHeapBuffer {
    /// # Safety
    /// `ptr` must be a buffer allocated by `FormatMessageW` in
    /// allocate-buffer mode, not yet freed.
    pub unsafe fn from_raw(ptr: HLOCAL) -> Self {
        Self { ptr }
    }

    pub fn is_null(&self) -> bool {
        self.ptr.0.is_null()
    }
}

impl Drop for WinHeapBuffer {
    fn drop(&mut self) {
        if !self.ptr.0.is_null() {
            // SAFETY: pointer ownership is this guard's invariant.
            unsafe { LocalFree(Some(self.ptr)) };
        }
    }
}
