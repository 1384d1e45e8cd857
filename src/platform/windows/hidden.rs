//! Hidden-attribute layer (spec.md §4.6, Windows column): the `hidden` bit
//! of `FILE_ATTRIBUTE_HIDDEN`, read and written directly — no dot-prefix
//! fallback exists on this platform.

use windows::Win32::Storage::FileSystem::{
    GetFileAttributesW, SetFileAttributesW, FILE_ATTRIBUTE_HIDDEN, FILE_FLAGS_AND_ATTRIBUTES, INVALID_FILE_ATTRIBUTES,
};
use windows::core::PCWSTR;

use crate::error::{EngineError, EngineResult};

use super::volume_info::platform_error;
use super::wide::to_wide_null;

pub fn is_hidden(canonical: &str) -> EngineResult<bool> {
    let wide = to_wide_null(canonical);
    // SAFETY: `wide` is NUL-terminated and alive for the call.
    let attrs = unsafe { GetFileAttributesW(PCWSTR(wide.as_ptr())) }.0;
    if attrs == INVALID_FILE_ATTRIBUTES {
        return Ok(false);
    }
    Ok(attrs & FILE_ATTRIBUTE_HIDDEN.0 != 0)
}

pub fn set_hidden(canonical: &str, hidden: bool) -> EngineResult<()> {
    let wide = to_wide_null(canonical);
    // SAFETY: same buffer as the read above.
    let attrs = unsafe { GetFileAttributesW(PCWSTR(wide.as_ptr())) }.0;
    if attrs == INVALID_FILE_ATTRIBUTES {
        return Err(EngineError::NotFound {
            path: canonical.to_string(),
        });
    }

    let new_attrs = if hidden {
        attrs | FILE_ATTRIBUTE_HIDDEN.0
    } else {
        attrs & !FILE_ATTRIBUTE_HIDDEN.0
    };

    // SAFETY: same buffer as above; `new_attrs` is a valid attribute mask.
    unsafe { SetFileAttributesW(PCWSTR(wide.as_ptr()), FILE_FLAGS_AND_ATTRIBUTES(new_attrs)) }
        .map_err(|err| platform_error("SetFileAttributesW", &err))?;
    Ok(())
}
