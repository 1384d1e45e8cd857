//! DiskArbitration identity lookup (spec.md §4.5.2). Every operation here
//! runs inside the process-wide mutex, matching spec.md §5's "one
//! process-wide mutex serializes every DA call sequence (session create ->
//! disk create -> description copy -> release)" — sessions never outlive
//! the critical section.

use std::ffi::CString;
use std::sync::Mutex;

use core_foundation::base::{CFTypeRef, TCFType};
use core_foundation::string::{CFString, CFStringRef};

use crate::raii::{DaObjectGuard, DaSessionGuard};

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFDictionaryGetValue(dict: CFTypeRef, key: CFTypeRef) -> CFTypeRef;
    fn CFURLGetString(url: CFTypeRef) -> CFStringRef;
    fn CFUUIDCreateString(allocator: CFTypeRef, uuid: CFTypeRef) -> CFStringRef;
    static kCFBooleanTrue: CFTypeRef;
}

#[link(name = "DiskArbitration", kind = "framework")]
extern "C" {
    static kDADiskDescriptionVolumeNameKey: CFStringRef;
    static kDADiskDescriptionVolumeUUIDKey: CFStringRef;
    static kDADiskDescriptionVolumeNetworkKey: CFStringRef;
    static kDADiskDescriptionVolumePathKey: CFStringRef;
}

/// One process-wide mutex serializing every DiskArbitration call sequence.
static DA_MUTEX: Mutex<()> = Mutex::new(());

#[derive(Debug, Default, Clone)]
pub struct DiskDescription {
    pub label: Option<String>,
    pub uuid: Option<String>,
    pub remote: bool,
    pub uri: Option<String>,
}

/// Strips a leading `/dev/` from a BSD device path (`/dev/disk1s1` ->
/// `disk1s1`), the form `DADiskCreateFromBSDName` expects.
fn bsd_name_from_device_path(device_path: &str) -> &str {
    device_path.strip_prefix("/dev/").unwrap_or(device_path)
}

/// Looks up volume name, UUID, network flag, and path URL for `device_path`
/// via a freshly created, freshly destroyed DiskArbitration session — all
/// under the process-wide mutex. Returns `None` on any failure; callers
/// treat that as "identity unavailable", not fatal (spec.md §7: "DA
/// description missing -> status=partial, capacity retained").
pub fn describe_volume(device_path: &str) -> Option<DiskDescription> {
    let _lock = DA_MUTEX.lock().unwrap_or_else(|p| p.into_inner());

    let bsd_name = bsd_name_from_device_path(device_path);
    let bsd_name_c = CString::new(bsd_name).ok()?;

    let session = DaSessionGuard::create()?;
    let disk = session.create_disk_from_bsd_name(&bsd_name_c)?;
    let description = DaSessionGuard::copy_disk_description(&disk)?;

    Some(extract_description(&description))
    // `session`, `disk`, and `description` all drop here, releasing their
    // DiskArbitration/CoreFoundation references while still holding `_lock`.
}

fn extract_description(description: &DaObjectGuard) -> DiskDescription {
    let dict = description.as_raw();
    let mut out = DiskDescription::default();

    // SAFETY: `dict` is a valid CFDictionaryRef for the duration of this
    // function; the static key refs are valid for the process lifetime.
    unsafe {
        let name_value = CFDictionaryGetValue(dict, kDADiskDescriptionVolumeNameKey.cast());
        if !name_value.is_null() {
            let s = CFString::wrap_under_get_rule(name_value.cast());
            out.label = Some(s.to_string());
        }

        let uuid_value = CFDictionaryGetValue(dict, kDADiskDescriptionVolumeUUIDKey.cast());
        if !uuid_value.is_null() {
            let uuid_string_ref = CFUUIDCreateString(std::ptr::null(), uuid_value);
            if !uuid_string_ref.is_null() {
                let s = CFString::wrap_under_create_rule(uuid_string_ref);
                out.uuid = Some(s.to_string());
            }
        }

        let network_value = CFDictionaryGetValue(dict, kDADiskDescriptionVolumeNetworkKey.cast());
        out.remote = !network_value.is_null() && network_value == kCFBooleanTrue;

        let path_value = CFDictionaryGetValue(dict, kDADiskDescriptionVolumePathKey.cast());
        if !path_value.is_null() {
            let url_string_ref = CFURLGetString(path_value);
            if !url_string_ref.is_null() {
                // CFURLGetString follows the "Get" rule (no retain); wrap
                // and immediately copy out so nothing outlives `dict`.
                let s = CFString::wrap_under_get_rule(url_string_ref);
                out.uri = Some(s.to_string());
            }
        }
    }

    out
}
