//! Optional, default-off GVolumeMonitor enrichment (spec.md §4.4.3's
//! "optional enrichment pass"). GVolumeMonitor is documented non-thread-safe
//! and must never be the sole source of mount data, so this pass only ever
//! adds a label/URI to a record the primary `/proc/mounts` path already
//! produced, and every failure mode — including a panic inside the gio
//! bindings — degrades to the unenriched record.

use gio::prelude::*;

use crate::model::VolumeMountPoint;

/// Best-effort: walks the default `GVolumeMonitor`'s mounts and fills
/// `label`/`uri`-shaped data onto matching records by root path. Never
/// called from more than the enumerator's own synchronous step, and never
/// propagates failure — a caught panic or an empty monitor both just leave
/// `records` unchanged.
pub fn enrich_labels(records: &mut [VolumeMountPoint]) {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| collect_gio_mounts()));
    let gio_mounts = match outcome {
        Ok(mounts) => mounts,
        Err(_) => {
            log::warn!("gio volume-monitor enrichment panicked; returning unenriched records");
            return;
        }
    };

    for record in records.iter_mut() {
        if let Some(name) = gio_mounts
            .iter()
            .find(|m| m.root_path == record.mount_point)
            .map(|m| m.name.clone())
        {
            log::debug!("gio enrichment labeled mount {:?} as {name:?}", record.mount_point);
            record.label = Some(name);
        }
    }
}

struct GioMount {
    root_path: String,
    name: String,
}

fn collect_gio_mounts() -> Vec<GioMount> {
    let monitor = gio::VolumeMonitor::get();
    monitor
        .mounts()
        .into_iter()
        .filter_map(|mount| {
            let root = mount.root()?;
            let path = root.path()?;
            Some(GioMount {
                root_path: path.to_string_lossy().into_owned(),
                name: mount.name().to_string(),
            })
        })
        .collect()
}
