//! FFI-safe type definitions
//!
//! Raw C types and entry-point signatures of the libmagic ABI. Nothing in
//! here is safe to call directly; the [`crate::shim`] module wraps every
//! entry point.

use std::os::raw::{c_char, c_int, c_void};

/// Opaque native session (`struct magic_set`)
#[repr(C)]
pub struct MagicSet {
    _private: [u8; 0],
}

/// `magic_t magic_open(int flags)`
pub type OpenFn = unsafe extern "C" fn(c_int) -> *mut MagicSet;
/// `void magic_close(magic_t)`
pub type CloseFn = unsafe extern "C" fn(*mut MagicSet);
/// `const char *magic_error(magic_t)`
pub type ErrorFn = unsafe extern "C" fn(*mut MagicSet) -> *const c_char;
/// `int magic_errno(magic_t)`
pub type ErrnoFn = unsafe extern "C" fn(*mut MagicSet) -> c_int;
/// `int magic_setflags(magic_t, int)`
pub type SetFlagsFn = unsafe extern "C" fn(*mut MagicSet, c_int) -> c_int;
/// `int magic_getflags(magic_t)`
pub type GetFlagsFn = unsafe extern "C" fn(*mut MagicSet) -> c_int;
/// `int magic_load(magic_t, const char *)`, also `magic_compile` and `magic_check`
pub type DatabaseFn = unsafe extern "C" fn(*mut MagicSet, *const c_char) -> c_int;
/// `const char *magic_file(magic_t, const char *)`
pub type FileFn = unsafe extern "C" fn(*mut MagicSet, *const c_char) -> *const c_char;
/// `const char *magic_buffer(magic_t, const void *, size_t)`
pub type BufferFn = unsafe extern "C" fn(*mut MagicSet, *const c_void, usize) -> *const c_char;
/// `const char *magic_descriptor(magic_t, int)`
pub type DescriptorFn = unsafe extern "C" fn(*mut MagicSet, c_int) -> *const c_char;
/// `const char *magic_getpath(const char *, int)`
pub type GetPathFn = unsafe extern "C" fn(*const c_char, c_int) -> *const c_char;
/// `int magic_version(void)`
pub type VersionFn = unsafe extern "C" fn() -> c_int;
/// `int magic_getparam(magic_t, int, void *)`
pub type GetParamFn = unsafe extern "C" fn(*mut MagicSet, c_int, *mut c_void) -> c_int;
/// `int magic_setparam(magic_t, int, const void *)`
pub type SetParamFn = unsafe extern "C" fn(*mut MagicSet, c_int, *const c_void) -> c_int;

/// Which database entry point a call goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseAction {
    /// `magic_load`
    Load,
    /// `magic_compile`
    Compile,
    /// `magic_check`
    Check,
}

impl DatabaseAction {
    /// Name of the native entry point, used in log fields
    pub fn entry_point(self) -> &'static str {
        match self {
            DatabaseAction::Load => "magic_load",
            DatabaseAction::Compile => "magic_compile",
            DatabaseAction::Check => "magic_check",
        }
    }
}
