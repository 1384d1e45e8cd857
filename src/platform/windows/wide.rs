//! Wide-string conversions shared by every Win32 call in this backend.

/// Encodes `s` as UTF-16 with a trailing NUL, the form every `*W` API wants.
pub fn to_wide_null(s: &str) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;
    std::ffi::OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

/// Trims a fixed-size wide buffer at its first NUL and lossily decodes it.
pub fn from_wide_buf(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

#[cfg(test)]
mod wide_test {
    use super::*;

    #[test]
    fn round_trips_through_wide_buffer() {
        let wide = to_wide_null("C:\\");
        assert_eq!(from_wide_buf(&wide), "C:\\");
    }

    #[test]
    fn trims_at_first_nul() {
        let buf = [b'C' as u16, b':' as u16, b'\\' as u16, 0, 0, 0];
        assert_eq!(from_wide_buf(&buf), "C:\\");
    }
}
