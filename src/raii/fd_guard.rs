//! File descriptor guard shared by every POSIX backend.

use crate::error::{EngineError, EngineResult};

/// Owns a directory file descriptor opened with `O_CLOEXEC`, used to make
/// capacity/identity/hidden-attribute calls TOCTOU-safe by operating on the
/// fd rather than re-resolving the path.
///
/// Not `Clone`; ordinary move transfers ownership. `Drop` closes the fd via
/// `OwnedFd`'s own `close(2)` call, which the kernel guarantees succeeds or
/// is idempotent-safe to ignore.
#[cfg(unix)]
pub struct FdGuard {
    fd: std::os::fd::OwnedFd,
}

#[cfg(unix)]
impl FdGuard {
    /// Opens `path` as a directory with `O_CLOEXEC`, rejecting anything that
    /// isn't a directory (the caller only ever wants this for mount points).
    pub fn open_dir(path: &str) -> EngineResult<Self> {
        Self::open_raw(path, libc::O_DIRECTORY)
    }

    /// Opens `path` with `O_CLOEXEC`, accepting either a directory or a
    /// regular file — used by the hidden-attribute layer, which needs an
    /// fd-based `fstat`/`fchflags` on ordinary files too.
    pub fn open_dir_or_file(path: &str) -> EngineResult<Self> {
        Self::open_raw(path, 0)
    }

    fn open_raw(path: &str, extra_flags: libc::c_int) -> EngineResult<Self> {
        use std::os::fd::FromRawFd;

        let c_path = std::ffi::CString::new(path).map_err(|_| EngineError::InvalidPath {
            message: "path contains a NUL byte".to_string(),
        })?;

        let raw = unsafe { libc::open(c_path.as_ptr(), libc::O_RDONLY | libc::O_CLOEXEC | extra_flags) };
        if raw < 0 {
            let err = std::io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::ENOENT) => EngineError::NotFound { path: path.to_string() },
                Some(libc::EACCES) => EngineError::PermissionDenied { path: path.to_string() },
                Some(code) => EngineError::PlatformError {
                    operation: "open".to_string(),
                    code: code as i64,
                    text: err.to_string(),
                },
                None => EngineError::PlatformError {
                    operation: "open".to_string(),
                    code: -1,
                    text: err.to_string(),
                },
            });
        }

        // SAFETY: `raw` is a just-opened, valid, owned fd; no other code
        // holds a reference to it yet.
        let fd = unsafe { std::os::fd::OwnedFd::from_raw_fd(raw) };
        Ok(Self { fd })
    }

    pub fn as_raw_fd(&self) -> std::os::unix::io::RawFd {
        std::os::fd::AsRawFd::as_raw_fd(&self.fd)
    }
}

#[cfg(test)]
#[cfg(unix)]
mod fd_guard_test {
    use super::*;

    #[test]
    fn opens_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let guard = FdGuard::open_dir(dir.path().to_str().unwrap()).unwrap();
        assert!(guard.as_raw_fd() >= 0);
    }

    #[test]
    fn rejects_nonexistent_path() {
        let result = FdGuard::open_dir("/no/such/path/hopefully");
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn rejects_path_with_nul_byte() {
        let result = FdGuard::open_dir("/tmp/\0bad");
        assert!(matches!(result, Err(EngineError::InvalidPath { .. })));
    }

    #[test]
    fn rejects_non_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = FdGuard::open_dir(file.path().to_str().unwrap());
        assert!(matches!(result, Err(EngineError::PlatformError { .. })));
    }

    #[test]
    fn open_dir_or_file_accepts_a_regular_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let guard = FdGuard::open_dir_or_file(file.path().to_str().unwrap()).unwrap();
        assert!(guard.as_raw_fd() >= 0);
    }
}
