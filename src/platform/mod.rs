//! Backend selection (spec.md §4.1's Dispatcher): the compiled-in platform
//! module is the only one that exists in the final binary, selected purely
//! by `cfg(target_os = ..)`. Every backend exposes the same four async
//! functions; the dispatcher never branches on platform itself.

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
pub use self::windows::{enumerate_mount_points, get_volume_metadata, is_hidden, set_hidden};

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
pub use self::macos::{enumerate_mount_points, get_volume_metadata, is_hidden, set_hidden};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use self::linux::{enumerate_mount_points, get_volume_metadata, is_hidden, set_hidden};

#[cfg(all(unix, any(target_os = "linux", target_os = "macos")))]
pub(crate) mod posix_common;
