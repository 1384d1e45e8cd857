//! Cross-platform native engine for volume enumeration, per-volume
//! metadata, and the filesystem "hidden" attribute — one API over Windows,
//! macOS, and Linux backends.
//!
//! Callers go through four operations (`enumerate_mount_points`,
//! `get_volume_metadata`, `is_hidden`, `set_hidden`); everything else in
//! this crate exists to support those four safely: path validation, a
//! native-handle RAII kit, a shared worker pool, and a drive health
//! checker that turns OS-specific error codes into one status vocabulary.

#![deny(clippy::print_stdout, clippy::print_stderr)]

mod dispatcher;
mod error;
mod health;
mod model;
mod options;
mod path_validator;
mod platform;
mod raii;
mod worker_pool;

pub use dispatcher::{enumerate_mount_points, get_volume_metadata, is_hidden, set_hidden, PendingResult};
pub use error::{EngineError, EngineResult};
pub use model::{HealthStatus, HiddenStrategy, VolumeMetadata, VolumeMountPoint};
pub use options::{Options, PartialOptions};
