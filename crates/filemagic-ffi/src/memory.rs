//! String conversion utilities for the native boundary
//!
//! Strings returned by libmagic are owned by the session and only valid
//! until the next call on it, so they are copied out immediately.

use std::ffi::{CStr, CString, OsStr};
use std::os::raw::c_char;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::error::{Result, ShimError};

/// Separator libmagic uses between database files
pub const PATH_SEPARATOR: u8 = b':';

/// Convert an OS string to a C string for the native side
pub fn to_c_string(value: &OsStr) -> Result<CString> {
    CString::new(value.as_bytes()).map_err(|_| ShimError::InvalidArgument {
        message: format!("argument contains a NUL byte: {:?}", value),
    })
}

/// Join database paths into the colon-delimited list `magic_load` expects
pub fn join_paths<P: AsRef<Path>>(paths: &[P]) -> Result<CString> {
    let mut joined = Vec::new();
    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            joined.push(PATH_SEPARATOR);
        }
        joined.extend_from_slice(path.as_ref().as_os_str().as_bytes());
    }
    CString::new(joined).map_err(|_| ShimError::InvalidArgument {
        message: "database path contains a NUL byte".to_string(),
    })
}

/// Split a colon-delimited list back into individual paths
pub fn split_paths(joined: &CStr) -> Vec<PathBuf> {
    joined
        .to_bytes()
        .split(|b| *b == PATH_SEPARATOR)
        .filter(|part| !part.is_empty())
        .map(|part| PathBuf::from(OsStr::from_bytes(part)))
        .collect()
}

/// Copy a native string into an owned Rust string
///
/// Sessions run with `MAGIC_RAW`, so libmagic hands back unprintable bytes
/// as they are. Bytes that are not valid UTF-8 become U+FFFD.
///
/// # Safety
/// The pointer must be NULL or point to a valid null-terminated C string
/// that stays alive for the duration of this call.
pub unsafe fn copy_native_string(s: *const c_char) -> Option<String> {
    if s.is_null() {
        return None;
    }

    Some(CStr::from_ptr(s).to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_split_paths() {
        let joined = join_paths(&["/usr/share/misc/magic", "fixtures/png.magic"]).unwrap();
        assert_eq!(joined.to_bytes(), b"/usr/share/misc/magic:fixtures/png.magic");

        let split = split_paths(&joined);
        assert_eq!(
            split,
            vec![
                PathBuf::from("/usr/share/misc/magic"),
                PathBuf::from("fixtures/png.magic")
            ]
        );
    }

    #[test]
    fn test_split_skips_empty_segments() {
        let joined = CString::new("a::b:").unwrap();
        assert_eq!(split_paths(&joined), vec![PathBuf::from("a"), PathBuf::from("b")]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let raw = CString::new(b"caf\xe9 text".to_vec()).unwrap();
        let copied = unsafe { copy_native_string(raw.as_ptr()) };
        assert_eq!(copied.as_deref(), Some("caf\u{fffd} text"));
        assert_eq!(unsafe { copy_native_string(std::ptr::null()) }, None);
    }

    #[test]
    fn test_nul_byte_rejected() {
        let err = to_c_string(OsStr::from_bytes(b"bad\0path")).unwrap_err();
        assert!(matches!(err, ShimError::InvalidArgument { .. }));
    }

    #[test]
    fn test_copy_native_string() {
        let owned = CString::new("image/png; charset=binary").unwrap();
        unsafe {
            assert_eq!(
                copy_native_string(owned.as_ptr()).as_deref(),
                Some("image/png; charset=binary")
            );
            assert_eq!(copy_native_string(std::ptr::null()), None);
        }
    }
}
