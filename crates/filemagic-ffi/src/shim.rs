//! Safe wrappers around each libmagic entry point
//!
//! [`Cookie`] owns one native session. Its methods normalise the native
//! return conventions into [`ShimError`], run database calls with standard
//! error suppressed, run every call under the "C" locale, and query
//! descriptors through a private duplicate.
//!
//! A `Cookie` is not safe for concurrent use; callers serialise access.

use std::ffi::CStr;
use std::os::fd::{AsRawFd, RawFd};
use std::os::raw::{c_int, c_void};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use tracing::{debug, trace, warn};

use crate::error::{last_errno, Result, ShimError};
use crate::fd::{check_fd, safe_dup};
use crate::guards::{LocaleOverride, StderrSuppression};
use crate::library::{library, Capabilities, NativeLibrary};
use crate::memory::{copy_native_string, join_paths, split_paths, to_c_string};
use crate::types::{DatabaseAction, MagicSet};

fn neutral_locale() -> Option<LocaleOverride> {
    LocaleOverride::acquire()
        .map_err(|e| warn!(error = %e, "could not switch to the C locale"))
        .ok()
}

/// Owned native session handle
///
/// Dropping a `Cookie` closes the native session; [`Cookie::close`] does the
/// same explicitly.
#[derive(Debug)]
pub struct Cookie {
    set: NonNull<MagicSet>,
    lib: &'static NativeLibrary,
}

// SAFETY: a magic_set has no thread affinity; it only must not be used from
// two threads at once, which `&mut self` on every mutating call and the
// caller's lock guarantee.
unsafe impl Send for Cookie {}

impl Cookie {
    /// Allocate a native session (`magic_open`)
    pub fn open(flags: i32) -> Result<Self> {
        let lib = library()?;

        // SAFETY: magic_open has no preconditions.
        let set = unsafe { (lib.open)(flags as c_int) };
        match NonNull::new(set) {
            Some(set) => {
                debug!(flags, "opened native session");
                Ok(Self { set, lib })
            }
            None => {
                let errno = last_errno();
                Err(ShimError::Allocation {
                    errno: if errno == 0 { libc::ENOMEM } else { errno },
                })
            }
        }
    }

    /// Release the native session (`magic_close`)
    pub fn close(self) {
        drop(self);
    }

    /// Capabilities of the library backing this session
    pub fn capabilities(&self) -> Capabilities {
        self.lib.capabilities()
    }

    /// Replace the session's flags (`magic_setflags`)
    ///
    /// The range check happens here because older releases accept any value
    /// and silently misbehave.
    pub fn set_flags(&mut self, flags: i32, valid_mask: i32) -> Result<()> {
        if flags < 0 || flags & !valid_mask != 0 {
            return Err(ShimError::InvalidArgument {
                message: "unknown or invalid flag specified".to_string(),
            });
        }

        // SAFETY: set is a live session owned by self.
        let rv = unsafe { (self.lib.setflags)(self.set.as_ptr(), flags as c_int) };
        if rv < 0 {
            return match last_errno() {
                libc::EINVAL => Err(ShimError::InvalidArgument {
                    message: "unknown or invalid flag specified".to_string(),
                }),
                libc::ENOSYS => Err(ShimError::NotImplemented {
                    message: "flag is not implemented".to_string(),
                }),
                _ => Err(ShimError::Native {
                    entry_point: "magic_setflags",
                }),
            };
        }

        Ok(())
    }

    /// Read the session's flags back (`magic_getflags`)
    pub fn flags(&self) -> Result<i32> {
        let getflags = self
            .lib
            .getflags
            .ok_or_else(|| ShimError::not_implemented("magic_getflags"))?;

        // SAFETY: set is a live session owned by self.
        let rv = unsafe { getflags(self.set.as_ptr()) };
        if rv < 0 {
            return Err(ShimError::Native {
                entry_point: "magic_getflags",
            });
        }
        Ok(rv)
    }

    /// Load, compile or check databases with standard error suppressed
    ///
    /// An empty `files` list passes NULL, which selects the default database.
    pub fn database<P: AsRef<Path>>(&mut self, action: DatabaseAction, files: &[P]) -> Result<()> {
        let joined = if files.is_empty() {
            None
        } else {
            Some(join_paths(files)?)
        };
        let arg = joined.as_ref().map_or(std::ptr::null(), |s| s.as_ptr());

        let entry = match action {
            DatabaseAction::Load => self.lib.load,
            DatabaseAction::Compile => self.lib.compile,
            DatabaseAction::Check => self.lib.check,
        };

        let suppression =
            StderrSuppression::acquire().map_err(|source| ShimError::Redirect { source })?;
        let locale = neutral_locale();

        // SAFETY: set is live and arg is NULL or a valid C string.
        let rv = unsafe { entry(self.set.as_ptr(), arg) };

        drop(locale);
        suppression
            .restore()
            .map_err(|source| ShimError::Redirect { source })?;

        trace!(entry_point = action.entry_point(), rv, "database call returned");

        if rv < 0 {
            return Err(ShimError::Native {
                entry_point: action.entry_point(),
            });
        }
        Ok(())
    }

    /// Identify a file by path (`magic_file`)
    pub fn file(&mut self, path: &Path) -> Result<String> {
        let path = to_c_string(path.as_os_str())?;
        let _locale = neutral_locale();

        // SAFETY: set is live and path is a valid C string.
        let result = unsafe { (self.lib.file)(self.set.as_ptr(), path.as_ptr()) };
        // SAFETY: the result is owned by the session and valid until the next call.
        unsafe { copy_native_string(result) }.ok_or(ShimError::NullResult {
            entry_point: "magic_file",
        })
    }

    /// Identify an in-memory buffer (`magic_buffer`)
    pub fn buffer(&mut self, data: &[u8]) -> Result<String> {
        let _locale = neutral_locale();

        // SAFETY: set is live and data is valid for data.len() bytes.
        let result = unsafe {
            (self.lib.buffer)(self.set.as_ptr(), data.as_ptr() as *const c_void, data.len())
        };
        // SAFETY: the result is owned by the session and valid until the next call.
        unsafe { copy_native_string(result) }.ok_or(ShimError::NullResult {
            entry_point: "magic_buffer",
        })
    }

    /// Identify an open descriptor (`magic_descriptor`)
    ///
    /// The native call only ever sees a close-on-exec duplicate, which is
    /// closed here; `fd` itself stays open and owned by the caller.
    pub fn descriptor(&mut self, fd: RawFd) -> Result<String> {
        check_fd(fd)?;
        let dup = safe_dup(fd).map_err(|e| match e.raw_os_error() {
            Some(libc::EBADF) => ShimError::BadDescriptor,
            _ => ShimError::Redirect { source: e },
        })?;
        let _locale = neutral_locale();

        // SAFETY: set is live and dup is an open descriptor owned here.
        let result = unsafe { (self.lib.descriptor)(self.set.as_ptr(), dup.as_raw_fd()) };
        // SAFETY: the result is owned by the session and valid until the next call.
        let copied = unsafe { copy_native_string(result) };

        // Some builds close the descriptor themselves; only close it if it
        // still refers to the duplicate we handed over. If such a build
        // closed it and another thread reused the number in between, the
        // check passes and the other thread's descriptor is closed; nothing
        // here can tell the two apart.
        if check_fd(dup.as_raw_fd()).is_ok() {
            drop(dup);
        } else {
            std::mem::forget(dup);
        }

        copied.ok_or(ShimError::NullResult {
            entry_point: "magic_descriptor",
        })
    }

    /// Last error message recorded by the session (`magic_error`)
    pub fn error_message(&self) -> Option<String> {
        // SAFETY: set is live; the string is copied before any other call.
        unsafe { copy_native_string((self.lib.error)(self.set.as_ptr())) }
    }

    /// Last errno recorded by the session (`magic_errno`)
    pub fn errno(&self) -> i32 {
        // SAFETY: set is a live session owned by self.
        unsafe { (self.lib.errno)(self.set.as_ptr()) }
    }

    /// Read a tunable limit (`magic_getparam`)
    pub fn parameter(&self, param: i32) -> Result<usize> {
        let getparam = self
            .lib
            .getparam
            .ok_or_else(|| ShimError::not_implemented("magic_getparam"))?;

        let mut value: usize = 0;
        // SAFETY: every libmagic parameter is a size_t.
        let rv = unsafe {
            getparam(
                self.set.as_ptr(),
                param as c_int,
                &mut value as *mut usize as *mut c_void,
            )
        };
        if rv < 0 {
            return Err(ShimError::InvalidArgument {
                message: "unknown or invalid parameter specified".to_string(),
            });
        }
        Ok(value)
    }

    /// Change a tunable limit (`magic_setparam`)
    pub fn set_parameter(&mut self, param: i32, value: usize) -> Result<()> {
        let setparam = self
            .lib
            .setparam
            .ok_or_else(|| ShimError::not_implemented("magic_setparam"))?;

        // SAFETY: every libmagic parameter is a size_t.
        let rv = unsafe {
            setparam(
                self.set.as_ptr(),
                param as c_int,
                &value as *const usize as *const c_void,
            )
        };
        if rv < 0 {
            return Err(ShimError::InvalidArgument {
                message: "unknown or invalid parameter specified".to_string(),
            });
        }
        Ok(())
    }
}

impl Drop for Cookie {
    fn drop(&mut self) {
        // SAFETY: set is live and this is the only place it is released.
        unsafe { (self.lib.close)(self.set.as_ptr()) };
        debug!("closed native session");
    }
}

/// Default database search path (`magic_getpath`)
///
/// libmagic consults the `MAGIC` environment variable on every call.
pub fn default_paths() -> Result<Vec<PathBuf>> {
    let lib = library()?;

    // SAFETY: NULL asks for the default; action 0 means "load".
    let path = unsafe { (lib.getpath)(std::ptr::null(), 0) };
    if path.is_null() {
        return Ok(Vec::new());
    }

    // SAFETY: magic_getpath returns a static or environment-owned string.
    Ok(split_paths(unsafe { CStr::from_ptr(path) }))
}

/// Installed libmagic version as `major * 100 + minor` (`magic_version`)
pub fn version() -> Result<i32> {
    let lib = library()?;
    let version = lib
        .version
        .ok_or_else(|| ShimError::not_implemented("function"))?;

    // SAFETY: magic_version takes no arguments.
    Ok(unsafe { version() })
}
