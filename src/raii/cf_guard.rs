//! macOS reference-counted object and DiskArbitration session guards.
//!
//! No crate in the retrieval pack wraps DiskArbitration, so the `extern "C"`
//! items it needs are declared here, against the existing `core-foundation`
//! dependency's `CFTypeRef`/`CFAllocatorRef` types — the standard approach a
//! systems crate takes for an Apple framework without a published safe
//! wrapper.

use core_foundation::base::{CFAllocatorRef, CFRelease, CFTypeRef};

#[repr(C)]
struct OpaqueRunLoop {
    _private: [u8; 0],
}
pub type CFRunLoopRef = *mut OpaqueRunLoop;
pub type CFRunLoopMode = CFTypeRef;
pub type DASessionRef = CFTypeRef;
pub type DADiskRef = CFTypeRef;

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFRunLoopGetCurrent() -> CFRunLoopRef;
    static kCFRunLoopDefaultMode: CFRunLoopMode;
}

#[link(name = "DiskArbitration", kind = "framework")]
extern "C" {
    fn DASessionCreate(allocator: CFAllocatorRef) -> DASessionRef;
    fn DASessionScheduleWithRunLoop(session: DASessionRef, run_loop: CFRunLoopRef, run_loop_mode: CFRunLoopMode);
    fn DASessionUnscheduleFromRunLoop(session: DASessionRef, run_loop: CFRunLoopRef, run_loop_mode: CFRunLoopMode);
    fn DADiskCreateFromBSDName(allocator: CFAllocatorRef, session: DASessionRef, bsd_name: *const i8) -> DADiskRef;
    fn DADiskCopyDescription(disk: DADiskRef) -> CFTypeRef;
}

/// Owns a retained CoreFoundation/DiskArbitration reference (a `DADiskRef`
/// or the dictionary returned by `DADiskCopyDescription`). Not `Clone`;
/// `Drop` calls `CFRelease` exactly once.
pub struct DaObjectGuard {
    raw: CFTypeRef,
}

impl DaObjectGuard {
    /// # Safety
    /// `raw` must be a CoreFoundation reference this guard now owns one
    /// retain count of (the "create" or "copy" naming convention), not yet
    /// released elsewhere.
    pub unsafe fn from_raw(raw: CFTypeRef) -> Self {
        Self { raw }
    }

    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    pub fn as_raw(&self) -> CFTypeRef {
        self.raw
    }
}

impl Drop for DaObjectGuard {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            // SAFETY: ownership of exactly one retain count is this guard's
            // invariant.
            unsafe { CFRelease(self.raw) };
        }
    }
}

/// Owns a `DASessionRef`. Remembers whether it was scheduled on a run loop
/// and unschedules before release — the destructor enforces the ordering
/// unconditionally rather than relying on callers to remember it.
pub struct DaSessionGuard {
    session: DASessionRef,
    scheduled: bool,
}

impl DaSessionGuard {
    /// Creates a new DiskArbitration session under `kCFAllocatorDefault`.
    /// Returns `None` if the framework call fails to allocate one.
    pub fn create() -> Option<Self> {
        // SAFETY: FFI call with no preconditions beyond framework linkage.
        let session = unsafe { DASessionCreate(std::ptr::null()) };
        if session.is_null() {
            return None;
        }
        Some(Self {
            session,
            scheduled: false,
        })
    }

    pub fn as_raw(&self) -> DASessionRef {
        self.session
    }

    /// Schedules the session with the current thread's run loop, required
    /// before any disk-description call can complete asynchronously.
    pub fn schedule_with_current_run_loop(&mut self) {
        // SAFETY: `self.session` is valid for the guard's lifetime.
        unsafe {
            let run_loop = CFRunLoopGetCurrent();
            DASessionScheduleWithRunLoop(self.session, run_loop, kCFRunLoopDefaultMode);
        }
        self.scheduled = true;
    }

    pub fn create_disk_from_bsd_name(&self, bsd_name: &std::ffi::CStr) -> Option<DaObjectGuard> {
        // SAFETY: `self.session` outlives this call; `bsd_name` is a valid
        // NUL-terminated C string for its duration.
        let raw = unsafe { DADiskCreateFromBSDName(std::ptr::null(), self.session, bsd_name.as_ptr()) };
        if raw.is_null() {
            None
        } else {
            // SAFETY: "Create" naming convention returns one retain count we
            // now own.
            Some(unsafe { DaObjectGuard::from_raw(raw) })
        }
    }

    pub fn copy_disk_description(disk: &DaObjectGuard) -> Option<DaObjectGuard> {
        // SAFETY: `disk` holds a valid, non-null `DADiskRef` for this call.
        let raw = unsafe { DADiskCopyDescription(disk.as_raw()) };
        if raw.is_null() {
            None
        } else {
            // SAFETY: "Copy" naming convention returns one retain count we
            // now own.
            Some(unsafe { DaObjectGuard::from_raw(raw) })
        }
    }
}

impl Drop for DaSessionGuard {
    fn drop(&mut self) {
        if self.session.is_null() {
            return;
        }
        if self.scheduled {
            // SAFETY: matches the run loop/mode used to schedule.
            unsafe {
                let run_loop = CFRunLoopGetCurrent();
                DASessionUnscheduleFromRunLoop(self.session, run_loop, kCFRunLoopDefaultMode);
            }
        }
        // SAFETY: ownership of exactly one retain count is this guard's
        // invariant.
        unsafe { CFRelease(self.session) };
    }
}

// A `c_void`-backed opaque reference has no inherent thread affinity; the
// process-wide DA mutex (see `platform::macos::diskarbitration`) is what
// actually enforces DiskArbitration's single-sequence-at-a-time contract.
unsafe impl Send for DaSessionGuard {}
