//! Native-Handle RAII Kit (spec.md §4.3): scoped wrappers guaranteeing
//! release on every exit path. Every wrapper here forbids `Clone`, supports
//! ordinary Rust move semantics for ownership transfer, and calls its
//! deallocator exactly once — the same discipline the teacher applies to
//! `IndexWriter`'s `JoinHandle` ownership-transfer-on-shutdown, generalized
//! to OS handles, allocated C strings, and CoreFoundation references.
//!
//! This is the lowest layer of the crate — nothing else in `fs_volumes`
//! depends on anything above it.

mod fd_guard;
pub use fd_guard::FdGuard;

#[cfg(unix)]
mod heap_guard;
#[cfg(unix)]
pub use heap_guard::CAllocatedString;

#[cfg(target_os = "windows")]
mod win_handle_guard;
#[cfg(target_os = "windows")]
pub use win_handle_guard::{WinFindHandleGuard, WinHandleGuard, WinHeapBuffer};

#[cfg(target_os = "macos")]
mod cf_guard;
#[cfg(target_os = "macos")]
pub use cf_guard::{DaObjectGuard, DaSessionGuard};

#[cfg(target_os = "linux")]
mod blkid_guard;
#[cfg(target_os = "linux")]
pub use blkid_guard::BlkidCacheGuard;
