//! Error taxonomy for the volume engine.
//!
//! Modeled on the teacher's hand-rolled error enums (`VolumeError`,
//! `MtpConnectionError`): a plain enum, a manual `Display` impl, and a
//! `std::error::Error` impl. No `thiserror` — the teacher never reaches for
//! it either.

use std::fmt;

/// The kinds of failure a public operation can resolve with.
///
/// These are the "fatal" conditions of spec.md §7: path validation failures,
/// capacity overflow, and platform calls that have no meaningful partial
/// answer. Non-fatal sub-probe failures are folded into a successful record
/// with `status = partial`/`error` instead of failing the whole operation —
/// see `model::HealthStatus`.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EngineError {
    /// A caller-supplied path failed validation (§4.2).
    InvalidPath { message: String },
    /// The path does not exist.
    NotFound { path: String },
    /// The caller lacks permission for the requested operation.
    PermissionDenied { path: String },
    /// The filesystem or platform does not support the requested operation.
    NotSupported { operation: String },
    /// A capacity computation would overflow a 64-bit quantity.
    Overflow { detail: String },
    /// The bounded wait for a background job elapsed before it completed.
    Timeout { operation: String },
    /// The mount point is a known mount but is currently disconnected.
    Disconnected { mount_point: String },
    /// A caller-supplied argument is invalid independent of path validation
    /// (e.g. a root directory or `..` passed to `set_hidden`).
    InvalidArgument { message: String },
    /// A wrapped platform API failure.
    PlatformError {
        operation: String,
        code: i64,
        text: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPath { message } => write!(f, "invalid path: {message}"),
            Self::NotFound { path } => write!(f, "not found: {path}"),
            Self::PermissionDenied { path } => write!(f, "permission denied: {path}"),
            Self::NotSupported { operation } => write!(f, "not supported: {operation}"),
            Self::Overflow { detail } => write!(f, "overflow: {detail}"),
            Self::Timeout { operation } => write!(f, "timed out: {operation}"),
            Self::Disconnected { mount_point } => write!(f, "disconnected: {mount_point}"),
            Self::InvalidArgument { message } => write!(f, "invalid argument: {message}"),
            Self::PlatformError { operation, code, text } => {
                write!(f, "platform error in {operation} (code {code}): {text}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path: err.to_string() },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: err.to_string() },
            _ => Self::PlatformError {
                operation: "io".to_string(),
                code: err.raw_os_error().unwrap_or(-1) as i64,
                text: err.to_string(),
            },
        }
    }
}

/// Result alias used throughout the engine's internal, synchronous API.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod error_test {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = EngineError::NotFound {
            path: "/mnt/nas".to_string(),
        };
        assert_eq!(err.to_string(), "not found: /mnt/nas");

        let err = EngineError::PlatformError {
            operation: "statvfs".to_string(),
            code: 13,
            text: "Permission denied".to_string(),
        };
        assert!(err.to_string().contains("statvfs"));
        assert!(err.to_string().contains("13"));
    }

    #[test]
    fn io_error_not_found_maps_to_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EngineError = io_err.into();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn io_error_permission_denied_maps_through() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: EngineError = io_err.into();
        assert!(matches!(err, EngineError::PermissionDenied { .. }));
    }

    #[test]
    fn serializes_with_tag() {
        let err = EngineError::Timeout {
            operation: "enumerate".to_string(),
        };
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"kind\":\"timeout\""));
    }
}
